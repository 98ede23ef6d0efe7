//! Command surface adapters
//!
//! Maps the slash-command option bag onto a `SetupRequest`, and checks the
//! caller against the guild's owner and bot-manager allow-list.

use serde::{Deserialize, Serialize};

use crate::encoder::{OptionSpec, MAX_OPTIONS};
use crate::error::SetupError;
use crate::setup::SetupRequest;

/// Raw `set` subcommand arguments: title, description, channel and five
/// optional `roleN` / `labelN` slots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupCommand {
    pub title: String,
    pub description: String,
    pub channel_id: String,
    pub roles: [Option<String>; MAX_OPTIONS],
    pub labels: [Option<String>; MAX_OPTIONS],
}

impl SetupCommand {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        channel_id: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            channel_id: channel_id.into(),
            ..Self::default()
        }
    }

    /// Fill slot `n` (1-based). Out-of-range slots are ignored.
    pub fn with_slot(mut self, n: usize, role: impl Into<String>, label: impl Into<String>) -> Self {
        if (1..=MAX_OPTIONS).contains(&n) {
            self.roles[n - 1] = Some(role.into());
            self.labels[n - 1] = Some(label.into());
        }
        self
    }

    /// Keep slots where both role and label are present; the slot number
    /// becomes the ordinal.
    pub fn into_request(self) -> SetupRequest {
        let options = self
            .roles
            .iter()
            .zip(self.labels.iter())
            .enumerate()
            .filter_map(|(i, pair)| match pair {
                (Some(role), Some(label)) => Some(OptionSpec::new(i as u8 + 1, role, label)),
                _ => None,
            })
            .filter(OptionSpec::is_complete)
            .collect();

        SetupRequest {
            title: self.title,
            description: self.description,
            channel_id: self.channel_id,
            options,
        }
    }
}

/// Who may run setup commands in a guild
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildAccess {
    pub owner_id: String,
    #[serde(default)]
    pub bot_managers: Vec<String>,
}

impl GuildAccess {
    pub fn authorize(&self, user_id: &str) -> Result<(), SetupError> {
        if user_id == self.owner_id || self.bot_managers.iter().any(|m| m == user_id) {
            Ok(())
        } else {
            Err(SetupError::Unauthorized {
                user_id: user_id.to_string(),
            })
        }
    }
}
