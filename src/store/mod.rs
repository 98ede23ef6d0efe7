//! Binding Store
//!
//! One record per published option, keyed by (channel, message, option id).
//! Records are written once after a successful publish and never mutated.
//! Backends: in-memory (tests, previews) and Postgres (`database` feature).

use std::collections::HashSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::encoder::{DisplayToken, EncodedOption};
use crate::error::StoreError;
use crate::renderer::{ButtonStyle, PublishedMessage};

pub mod memory;
#[cfg(feature = "database")]
pub mod postgres;

pub use memory::InMemoryBindingStore;
#[cfg(feature = "database")]
pub use postgres::PgBindingStore;

/// Persisted link between one clickable option and one grant
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Binding {
    pub channel_id: String,
    pub message_id: String,
    pub option_id: String,
    /// Not checked against the grant system; may dangle
    pub grant_ref: String,
    pub label: Option<String>,
    pub glyph: Option<String>,
    pub style: ButtonStyle,
}

impl Binding {
    pub fn from_option(
        message: &PublishedMessage,
        option: &EncodedOption,
        style: ButtonStyle,
    ) -> Self {
        Self {
            channel_id: message.channel_id.clone(),
            message_id: message.message_id.clone(),
            option_id: option.option_id.clone(),
            grant_ref: option.grant_ref.clone(),
            label: option.label().map(str::to_string),
            glyph: option.glyph().map(str::to_string),
            style,
        }
    }

    pub fn display(&self) -> Option<DisplayToken> {
        DisplayToken::from_parts(self.label.as_deref(), self.glyph.as_deref())
    }

    /// Same (channel, message, option) key
    pub fn same_key(&self, channel_id: &str, message_id: &str, option_id: &str) -> bool {
        self.channel_id == channel_id && self.message_id == message_id && self.option_id == option_id
    }
}

/// Selection criteria for `find_all`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingFilter {
    pub channel_ids: Option<HashSet<String>>,
    pub message_id: Option<String>,
}

impl BindingFilter {
    /// Everything in the store
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_channels<I, S>(channel_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            channel_ids: Some(channel_ids.into_iter().map(Into::into).collect()),
            message_id: None,
        }
    }

    pub fn for_message(channel_id: impl Into<String>, message_id: impl Into<String>) -> Self {
        Self {
            channel_ids: Some(HashSet::from([channel_id.into()])),
            message_id: Some(message_id.into()),
        }
    }

    pub fn matches(&self, binding: &Binding) -> bool {
        let channel_ok = self
            .channel_ids
            .as_ref()
            .map_or(true, |ids| ids.contains(&binding.channel_id));
        let message_ok = self
            .message_id
            .as_ref()
            .map_or(true, |id| *id == binding.message_id);
        channel_ok && message_ok
    }
}

/// Decode raw records one at a time, dropping (and logging) those that fail.
///
/// `key` names the record in the log line as (channel_id, option_id); it must
/// not itself fail, so backends pass whatever they could read.
pub fn decode_each<R, K, D>(rows: &[R], key: K, decode: D) -> Vec<Binding>
where
    K: Fn(&R) -> (String, String),
    D: Fn(&R) -> Result<Binding, StoreError>,
{
    rows.iter()
        .filter_map(|row| match decode(row) {
            Ok(binding) => Some(binding),
            Err(error) => {
                let (channel_id, option_id) = key(row);
                warn!(
                    %channel_id,
                    %option_id,
                    %error,
                    "Skipping undecodable binding row"
                );
                None
            }
        })
        .collect()
}

/// Persistence for bindings
#[async_trait]
pub trait BindingStore: Send + Sync {
    /// Insert one binding
    async fn save(&self, binding: &Binding) -> Result<(), StoreError>;

    /// Unordered retrieval. Callers do their own grouping and ordering.
    async fn find_all(&self, filter: &BindingFilter) -> Result<Vec<Binding>, StoreError>;

    /// Direct lookup used by click resolution
    async fn find_one(
        &self,
        channel_id: &str,
        message_id: &str,
        option_id: &str,
    ) -> Result<Option<Binding>, StoreError> {
        let candidates = self
            .find_all(&BindingFilter::for_message(channel_id, message_id))
            .await?;
        Ok(candidates
            .into_iter()
            .find(|b| b.same_key(channel_id, message_id, option_id)))
    }
}
