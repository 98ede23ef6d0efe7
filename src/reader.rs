//! Setup Reader
//!
//! Rebuilds the operator-facing listing of a guild's setups from stored
//! bindings. The store has no notion of guilds, so visibility is decided
//! here by intersecting each binding's channel with the caller's channels.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use crate::config::DisplayConfig;
use crate::error::StoreError;
use crate::paginate::LineAccumulator;
use crate::renderer::{channel_mention, grant_mention, DisplayUnit};
use crate::store::{Binding, BindingFilter, BindingStore};

/// Result of a listing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListOutcome {
    /// No visible binding exists
    NothingConfigured,
    Units(Vec<DisplayUnit>),
}

impl ListOutcome {
    pub fn units(&self) -> &[DisplayUnit] {
        match self {
            Self::NothingConfigured => &[],
            Self::Units(units) => units,
        }
    }

    pub fn into_units(self) -> Vec<DisplayUnit> {
        match self {
            Self::NothingConfigured => Vec::new(),
            Self::Units(units) => units,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::NothingConfigured)
    }
}

/// Bindings of one channel, in storage return order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelGroup {
    pub channel_id: String,
    pub bindings: Vec<Binding>,
}

impl ChannelGroup {
    /// One segment per binding block; the channel header rides on the first
    pub fn segments(&self) -> Vec<String> {
        let mut segments: Vec<String> = self.bindings.iter().map(describe_binding).collect();
        match segments.first_mut() {
            Some(first) => first.insert_str(0, &channel_header(&self.channel_id)),
            None => segments.push(channel_header(&self.channel_id)),
        }
        segments
    }

    pub fn description(&self) -> String {
        self.segments().concat()
    }
}

pub fn channel_header(channel_id: &str) -> String {
    format!("**Channel:** {}\n", channel_mention(channel_id))
}

/// Four-line block for one binding, ending with a blank line
pub fn describe_binding(binding: &Binding) -> String {
    format!(
        "**Message ID:** {}\n**Role:** {} | **Label:** {} | **Emoji:** {}\n**Custom ID:** {}\n\n",
        binding.message_id,
        grant_mention(&binding.grant_ref),
        binding.label.as_deref().unwrap_or("None"),
        binding.glyph.as_deref().unwrap_or("None"),
        binding.option_id,
    )
}

/// Group by channel, channels in first-seen order
pub fn group_by_channel(bindings: impl IntoIterator<Item = Binding>) -> Vec<ChannelGroup> {
    let mut groups: Vec<ChannelGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for binding in bindings {
        match index.get(&binding.channel_id) {
            Some(&i) => groups[i].bindings.push(binding),
            None => {
                index.insert(binding.channel_id.clone(), groups.len());
                groups.push(ChannelGroup {
                    channel_id: binding.channel_id.clone(),
                    bindings: vec![binding],
                });
            }
        }
    }

    groups
}

pub struct SetupReader {
    store: Arc<dyn BindingStore>,
    title: String,
    color: u32,
    page_budget: usize,
}

impl SetupReader {
    pub fn new(store: Arc<dyn BindingStore>, display: &DisplayConfig) -> Self {
        Self {
            store,
            title: display.listing_title.clone(),
            color: display.accent_color,
            page_budget: display.page_budget,
        }
    }

    /// List every setup whose channel is in `visible_channel_ids`
    pub async fn list_for_guild(
        &self,
        visible_channel_ids: &HashSet<String>,
    ) -> Result<ListOutcome, StoreError> {
        if visible_channel_ids.is_empty() {
            return Ok(ListOutcome::NothingConfigured);
        }

        let all = self.store.find_all(&BindingFilter::all()).await?;
        let fetched = all.len();

        let visible: Vec<Binding> = all
            .into_iter()
            .filter(|b| visible_channel_ids.contains(&b.channel_id))
            .collect();

        debug!(fetched, visible = visible.len(), "Loaded reaction role bindings");

        if visible.is_empty() {
            return Ok(ListOutcome::NothingConfigured);
        }

        let units: Vec<DisplayUnit> = group_by_channel(visible)
            .iter()
            .flat_map(|group| self.paginate_group(group))
            .collect();

        debug!(units = units.len(), "Built reaction role listing");
        Ok(ListOutcome::Units(units))
    }

    fn paginate_group(&self, group: &ChannelGroup) -> Vec<DisplayUnit> {
        let mut acc = LineAccumulator::new(self.page_budget);
        for segment in group.segments() {
            acc.push(&segment);
        }
        acc.finish()
            .into_iter()
            .map(|body| DisplayUnit::new(Some(self.title.clone()), body, self.color))
            .collect()
    }
}
