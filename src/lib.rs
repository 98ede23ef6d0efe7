//! Reaction Roles
//!
//! Publishes messages offering up to five buttons, each bound to a role, and
//! keeps a durable mapping from (channel, message, button) to that role so a
//! separate interaction listener can resolve clicks at any later time.
//!
//! ## Flow
//! Creation: Encoder -> Renderer -> publish -> Binding Store
//! Inspection: Binding Store -> Reader -> paginated display units
//!
//! ```rust,no_run
//! use std::collections::HashSet;
//! use std::sync::Arc;
//! use reaction_roles::{DisplayConfig, InMemoryBindingStore, SetupReader};
//!
//! # async fn demo() -> Result<(), reaction_roles::StoreError> {
//! let store = Arc::new(InMemoryBindingStore::new());
//! let reader = SetupReader::new(store, &DisplayConfig::default());
//! let outcome = reader.list_for_guild(&HashSet::from(["123".to_string()])).await?;
//! assert!(outcome.is_empty());
//! # Ok(())
//! # }
//! ```

// Core error handling
pub mod error;

pub mod config;

// Option encoding and rendering
pub mod encoder;
pub mod renderer;

// Persistence
pub mod store;

// Listing
pub mod paginate;
pub mod reader;

// Creation and command surface
pub mod command;
pub mod resolve;
pub mod setup;

pub use command::{GuildAccess, SetupCommand};
pub use config::{DatabaseConfig, DisplayConfig, ReactionRolesConfig};
pub use encoder::{
    encode, is_glyph, option_id, parse_option_id, DisplayToken, EncodedOption, OptionSpec,
};
pub use error::{PublishError, SetupError, StoreError, ValidationError};
pub use paginate::{paginate_lines, LineAccumulator, PushOutcome};
pub use reader::{ListOutcome, SetupReader};
pub use renderer::{
    ButtonStyle, Control, DisplayUnit, MessagePublisher, PublishedMessage, RenderedSetup,
    SetupRenderer,
};
pub use resolve::ClickResolver;
pub use setup::{SetupReport, SetupRequest, SetupService, SetupStatus};
pub use store::{Binding, BindingFilter, BindingStore, InMemoryBindingStore};

#[cfg(feature = "database")]
pub use store::PgBindingStore;
