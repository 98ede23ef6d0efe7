//! Click resolution
//!
//! Used by the interaction listener to map a clicked control back to its
//! binding. The control's custom id must have been minted for the channel
//! the click came from; anything else is not ours and resolves to `None`.

use std::sync::Arc;

use tracing::debug;

use crate::encoder::parse_option_id;
use crate::error::StoreError;
use crate::store::{Binding, BindingStore};

pub struct ClickResolver {
    store: Arc<dyn BindingStore>,
}

impl ClickResolver {
    pub fn new(store: Arc<dyn BindingStore>) -> Self {
        Self { store }
    }

    /// Whether a custom id belongs to a reaction role control in `channel_id`
    pub fn is_reaction_role_control(channel_id: &str, custom_id: &str) -> bool {
        matches!(parse_option_id(custom_id), Some((channel, _)) if channel == channel_id)
    }

    pub async fn resolve(
        &self,
        channel_id: &str,
        message_id: &str,
        custom_id: &str,
    ) -> Result<Option<Binding>, StoreError> {
        if !Self::is_reaction_role_control(channel_id, custom_id) {
            debug!(channel_id, custom_id, "Not a reaction role control");
            return Ok(None);
        }

        let binding = self.store.find_one(channel_id, message_id, custom_id).await?;
        if binding.is_none() {
            debug!(channel_id, message_id, custom_id, "No binding for control");
        }
        Ok(binding)
    }
}
