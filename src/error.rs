//! Error taxonomy for reaction role setups
//!
//! Validation and publish failures abort a setup before anything is written.
//! Persistence failures are reported through `SetupReport` instead, because
//! earlier bindings of the same setup stay committed.

use thiserror::Error;

/// Top-level error for setup creation and listing
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("User {user_id} is not the server owner or a bot manager")]
    Unauthorized { user_id: String },
}

/// Rejected setup requests. Nothing is published or persisted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no options: at least one role and label pair is required")]
    NoOptions,

    #[error("too many options: {count} given, at most 5 allowed")]
    TooManyOptions { count: usize },

    #[error("option ordinal {ordinal} is outside 1..=5")]
    OrdinalOutOfRange { ordinal: u8 },

    #[error("option ordinal {ordinal} appears more than once")]
    DuplicateOrdinal { ordinal: u8 },

    #[error("required field '{field}' is empty")]
    EmptyField { field: &'static str },
}

/// The setup message could not be delivered to its channel
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    #[error("channel {channel_id} is unreachable")]
    ChannelUnreachable { channel_id: String },

    #[error("send to channel {channel_id} rejected: {reason}")]
    Rejected { channel_id: String, reason: String },
}

/// Binding store failures
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Backend(String),

    #[cfg(feature = "database")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt binding row: {field} = {value}")]
    Corrupt { field: &'static str, value: String },
}
