//! Setup lifecycle integration tests
//!
//! Create → list → resolve against the in-memory store, with publisher and
//! store doubles for the failure windows.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use reaction_roles::reader::group_by_channel;
use reaction_roles::{
    encode, Binding, BindingFilter, BindingStore, ClickResolver, DisplayConfig,
    InMemoryBindingStore, MessagePublisher, PublishError, PublishedMessage, RenderedSetup,
    SetupCommand, SetupError, SetupReader, SetupService, SetupStatus, StoreError,
};

// ============================================================================
// Doubles
// ============================================================================

/// Hands out sequential message ids and records what it was asked to send
#[derive(Default)]
struct RecordingPublisher {
    next_id: AtomicUsize,
    sent: Mutex<Vec<(String, RenderedSetup)>>,
}

#[async_trait]
impl MessagePublisher for RecordingPublisher {
    async fn publish(
        &self,
        channel_id: &str,
        setup: &RenderedSetup,
    ) -> Result<PublishedMessage, PublishError> {
        let id = 9000 + self.next_id.fetch_add(1, Ordering::SeqCst);
        self.sent
            .lock()
            .unwrap()
            .push((channel_id.to_string(), setup.clone()));
        Ok(PublishedMessage {
            channel_id: channel_id.to_string(),
            message_id: id.to_string(),
        })
    }
}

/// Always refuses to send
struct MissingPermissionsPublisher;

#[async_trait]
impl MessagePublisher for MissingPermissionsPublisher {
    async fn publish(
        &self,
        channel_id: &str,
        _setup: &RenderedSetup,
    ) -> Result<PublishedMessage, PublishError> {
        Err(PublishError::Rejected {
            channel_id: channel_id.to_string(),
            reason: "Missing Permissions".to_string(),
        })
    }
}

/// Delegates to an in-memory store but fails scripted save calls
struct FlakyStore {
    inner: InMemoryBindingStore,
    script: Mutex<VecDeque<bool>>,
}

impl FlakyStore {
    /// `true` = succeed, `false` = fail; calls past the script succeed
    fn new(script: &[bool]) -> Self {
        Self {
            inner: InMemoryBindingStore::new(),
            script: Mutex::new(script.iter().copied().collect()),
        }
    }
}

#[async_trait]
impl BindingStore for FlakyStore {
    async fn save(&self, binding: &Binding) -> Result<(), StoreError> {
        let ok = self.script.lock().unwrap().pop_front().unwrap_or(true);
        if !ok {
            return Err(StoreError::Backend("connection reset".to_string()));
        }
        self.inner.save(binding).await
    }

    async fn find_all(&self, filter: &BindingFilter) -> Result<Vec<Binding>, StoreError> {
        self.inner.find_all(filter).await
    }
}

fn five_option_command(channel: &str) -> SetupCommand {
    SetupCommand::new("Pick your roles", "Click a button to get a role", channel)
        .with_slot(1, "1001", "VIP")
        .with_slot(2, "1002", "🎉")
        .with_slot(3, "1003", "<:custom:123456789012345678>")
        .with_slot(4, "1004", "👨\u{200D}👩\u{200D}👧")
        .with_slot(5, "1005", "Announcements")
}

fn visible(ids: &[&str]) -> HashSet<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_created_setup_round_trips_through_listing() {
    let store = Arc::new(InMemoryBindingStore::new());
    let publisher = Arc::new(RecordingPublisher::default());
    let display = DisplayConfig::default();
    let service = SetupService::new(store.clone(), publisher.clone(), &display);

    let request = five_option_command("555").into_request();
    let expected = encode("555", &request.options).unwrap();

    let report = service.create(&request).await.unwrap();
    assert!(report.is_complete());
    assert_eq!(report.persisted.len(), 5);

    // The published controls carry the same ids that were persisted
    let sent = publisher.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    let control_ids: Vec<_> = sent[0].1.controls.iter().map(|c| c.custom_id.clone()).collect();
    let persisted_ids: Vec<_> = report.persisted.iter().map(|b| b.option_id.clone()).collect();
    assert_eq!(control_ids, persisted_ids);

    let reader = SetupReader::new(store.clone(), &display);
    let units = reader
        .list_for_guild(&visible(&["555"]))
        .await
        .unwrap()
        .into_units();
    assert_eq!(units.len(), 1);

    let body = &units[0].body;
    for option in &expected {
        let tuple_line = format!(
            "**Role:** <@&{}> | **Label:** {} | **Emoji:** {}",
            option.grant_ref,
            option.label().unwrap_or("None"),
            option.glyph().unwrap_or("None"),
        );
        assert!(body.contains(&tuple_line), "missing {tuple_line}");
        assert!(body.contains(&format!("**Custom ID:** {}\n", option.option_id)));
    }
    assert_eq!(body.matches("**Custom ID:**").count(), expected.len());

    // ZWJ sequence stays a label; single pictograph and custom emoji are glyphs
    assert_eq!(expected[1].glyph(), Some("🎉"));
    assert_eq!(expected[2].glyph(), Some("<:custom:123456789012345678>"));
    assert!(expected[3].label().is_some());
}

#[tokio::test]
async fn test_publish_failure_writes_no_bindings() {
    let store = Arc::new(InMemoryBindingStore::new());
    let service = SetupService::new(
        store.clone(),
        Arc::new(MissingPermissionsPublisher),
        &DisplayConfig::default(),
    );

    let err = service
        .create(&five_option_command("777").into_request())
        .await
        .unwrap_err();

    assert!(matches!(err, SetupError::Publish(PublishError::Rejected { .. })));
    let stored = store
        .find_all(&BindingFilter::for_channels(["777"]))
        .await
        .unwrap();
    assert!(stored.is_empty());
}

#[tokio::test]
async fn test_persistence_failure_is_partial_and_keeps_prior_bindings() {
    let store = Arc::new(FlakyStore::new(&[true, true, false]));
    let service = SetupService::new(
        store.clone(),
        Arc::new(RecordingPublisher::default()),
        &DisplayConfig::default(),
    );

    let report = service
        .create(&five_option_command("888").into_request())
        .await
        .unwrap();

    match &report.status {
        SetupStatus::Partial {
            failed_option_id,
            unwritten,
            ..
        } => {
            assert_eq!(failed_option_id, "reaction_role_888_3");
            assert_eq!(
                unwritten,
                &vec![
                    "reaction_role_888_3".to_string(),
                    "reaction_role_888_4".to_string(),
                    "reaction_role_888_5".to_string(),
                ]
            );
        }
        SetupStatus::Complete => panic!("expected a partial setup"),
    }

    let stored = store.find_all(&BindingFilter::all()).await.unwrap();
    let ids: Vec<_> = stored.iter().map(|b| b.option_id.as_str()).collect();
    assert_eq!(ids, vec!["reaction_role_888_1", "reaction_role_888_2"]);

    // A partially written setup still lists without error
    let units = SetupReader::new(store, &DisplayConfig::default())
        .list_for_guild(&visible(&["888"]))
        .await
        .unwrap()
        .into_units();
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].body.matches("**Custom ID:**").count(), 2);
}

#[tokio::test]
async fn test_large_channel_listing_is_paginated() {
    let store = Arc::new(InMemoryBindingStore::new());
    let service = SetupService::new(
        store.clone(),
        Arc::new(RecordingPublisher::default()),
        &DisplayConfig::default(),
    );

    for _ in 0..9 {
        let report = service
            .create(&five_option_command("321").into_request())
            .await
            .unwrap();
        assert!(report.is_complete());
    }

    let all = store.find_all(&BindingFilter::all()).await.unwrap();
    let description = group_by_channel(all).remove(0).description();
    assert!(description.chars().count() > 5000);

    let units = SetupReader::new(store, &DisplayConfig::default())
        .list_for_guild(&visible(&["321"]))
        .await
        .unwrap()
        .into_units();

    assert!(units.len() >= 2);
    assert!(units.iter().all(|u| u.body_len() <= 2048));
    let rebuilt: String = units.iter().map(|u| u.body.as_str()).collect();
    assert_eq!(rebuilt, description);
}

#[tokio::test]
async fn test_listing_spans_channels_and_hides_foreign_ones() {
    let store = Arc::new(InMemoryBindingStore::new());
    let service = SetupService::new(
        store.clone(),
        Arc::new(RecordingPublisher::default()),
        &DisplayConfig::default(),
    );

    for channel in ["1", "2", "3"] {
        service
            .create(&five_option_command(channel).into_request())
            .await
            .unwrap();
    }

    let reader = SetupReader::new(store, &DisplayConfig::default());
    let units = reader
        .list_for_guild(&visible(&["1", "3", "gone"]))
        .await
        .unwrap()
        .into_units();

    assert_eq!(units.len(), 2);
    let headers: Vec<_> = units
        .iter()
        .map(|u| u.body.lines().next().unwrap_or_default().to_string())
        .collect();
    assert!(headers.contains(&"**Channel:** <#1>".to_string()));
    assert!(headers.contains(&"**Channel:** <#3>".to_string()));
    assert!(units.iter().all(|u| !u.body.contains("<#2>")));

    assert!(reader.list_for_guild(&HashSet::new()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_clicks_resolve_after_restart() {
    let store = Arc::new(InMemoryBindingStore::new());
    let report = SetupService::new(
        store.clone(),
        Arc::new(RecordingPublisher::default()),
        &DisplayConfig::default(),
    )
    .create(&five_option_command("444").into_request())
    .await
    .unwrap();
    let message_id = report.message.message_id.clone();

    // Fresh resolver over the same persisted records
    let resolver = ClickResolver::new(store);
    for ordinal in 1..=5u8 {
        let custom_id = reaction_roles::option_id("444", ordinal);
        let binding = resolver
            .resolve("444", &message_id, &custom_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(binding.grant_ref, format!("100{ordinal}"));
    }

    assert!(resolver
        .resolve("444", &message_id, "reaction_role_444_6")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_same_channel_setups_stay_disjoint() {
    let store = Arc::new(InMemoryBindingStore::new());
    let service = SetupService::new(
        store.clone(),
        Arc::new(RecordingPublisher::default()),
        &DisplayConfig::default(),
    );

    let first = service
        .create(&five_option_command("9").into_request())
        .await
        .unwrap();
    let other = SetupCommand::new("Other", "Other", "9")
        .with_slot(1, "2001", "Gamer")
        .into_request();
    let second = service.create(&other).await.unwrap();

    assert_ne!(first.message.message_id, second.message.message_id);

    let for_second = store
        .find_all(&BindingFilter::for_message("9", second.message.message_id.clone()))
        .await
        .unwrap();
    assert_eq!(for_second.len(), 1);
    assert_eq!(for_second[0].grant_ref, "2001");
    // Ids repeat across messages in one channel; the message id disambiguates
    assert_eq!(for_second[0].option_id, "reaction_role_9_1");

    let validation = service
        .create(&SetupCommand::new("T", "D", "9").into_request())
        .await
        .unwrap_err();
    assert!(matches!(validation, SetupError::Validation(_)));
}
