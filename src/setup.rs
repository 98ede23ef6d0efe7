//! Setup creation
//!
//! Creation runs in two phases with an observable state in between:
//!
//! 1. `prepare` validates and encodes the request and renders the message.
//! 2. `publish` sends it; the result is a `PublishedSetup`, which is
//!    published but not yet persisted.
//! 3. `persist` writes one binding per option in ordinal order.
//!
//! A publish failure ends the request with nothing written. A store failure
//! during `persist` stops the loop; bindings already written stay, and the
//! report carries the gap as `SetupStatus::Partial`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::DisplayConfig;
use crate::encoder::{encode, EncodedOption, OptionSpec};
use crate::error::{PublishError, SetupError, StoreError, ValidationError};
use crate::renderer::{
    ButtonStyle, MessagePublisher, PublishedMessage, RenderedSetup, SetupRenderer,
};
use crate::store::{Binding, BindingStore};

/// Request to publish a reaction role message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupRequest {
    pub title: String,
    pub description: String,
    pub channel_id: String,
    pub options: Vec<OptionSpec>,
}

/// Encoded and rendered, not yet sent
#[derive(Debug, Clone)]
pub struct PreparedSetup {
    pub channel_id: String,
    pub options: Vec<EncodedOption>,
    pub rendered: RenderedSetup,
    pub style: ButtonStyle,
}

/// Sent to the channel; no binding written yet
#[derive(Debug, Clone)]
pub struct PublishedSetup {
    pub message: PublishedMessage,
    pub options: Vec<EncodedOption>,
    pub style: ButtonStyle,
}

#[derive(Debug)]
pub enum SetupStatus {
    /// Every option has a binding
    Complete,
    /// Persistence stopped at `failed_option_id`
    Partial {
        failed_option_id: String,
        error: StoreError,
        /// Option ids with no binding, the failed one included
        unwritten: Vec<String>,
    },
}

#[derive(Debug)]
pub struct SetupReport {
    pub message: PublishedMessage,
    pub persisted: Vec<Binding>,
    pub status: SetupStatus,
}

impl SetupReport {
    pub fn is_complete(&self) -> bool {
        matches!(self.status, SetupStatus::Complete)
    }
}

pub struct SetupService {
    store: Arc<dyn BindingStore>,
    publisher: Arc<dyn MessagePublisher>,
    renderer: SetupRenderer,
}

impl SetupService {
    pub fn new(
        store: Arc<dyn BindingStore>,
        publisher: Arc<dyn MessagePublisher>,
        display: &DisplayConfig,
    ) -> Self {
        Self {
            store,
            publisher,
            renderer: SetupRenderer::new(display),
        }
    }

    /// Validate, encode and render. No side effects.
    pub fn prepare(&self, request: &SetupRequest) -> Result<PreparedSetup, ValidationError> {
        if request.title.trim().is_empty() {
            return Err(ValidationError::EmptyField { field: "title" });
        }
        if request.description.trim().is_empty() {
            return Err(ValidationError::EmptyField {
                field: "description",
            });
        }
        if request.channel_id.trim().is_empty() {
            return Err(ValidationError::EmptyField { field: "channel" });
        }

        let options = encode(&request.channel_id, &request.options)?;
        let rendered = self
            .renderer
            .render(&request.title, &request.description, &options);

        Ok(PreparedSetup {
            channel_id: request.channel_id.clone(),
            options,
            rendered,
            style: self.renderer.button_style(),
        })
    }

    /// Send the prepared message. A single attempt.
    pub async fn publish(&self, prepared: PreparedSetup) -> Result<PublishedSetup, PublishError> {
        let sent = self
            .publisher
            .publish(&prepared.channel_id, &prepared.rendered)
            .await
            .map_err(|e| {
                warn!(channel_id = %prepared.channel_id, error = %e, "Reaction role publish failed");
                e
            })?;

        if sent.channel_id != prepared.channel_id {
            warn!(
                expected = %prepared.channel_id,
                actual = %sent.channel_id,
                "Publisher reported a different channel; bindings use the requested one"
            );
        }

        info!(
            channel_id = %prepared.channel_id,
            message_id = %sent.message_id,
            options = prepared.options.len(),
            "Reaction role message published"
        );

        Ok(PublishedSetup {
            message: PublishedMessage {
                channel_id: prepared.channel_id,
                message_id: sent.message_id,
            },
            options: prepared.options,
            style: prepared.style,
        })
    }

    /// Write bindings in ordinal order, stopping at the first failure
    pub async fn persist(&self, published: PublishedSetup) -> SetupReport {
        let mut persisted = Vec::with_capacity(published.options.len());

        for (i, option) in published.options.iter().enumerate() {
            let binding = Binding::from_option(&published.message, option, published.style);

            if let Err(error) = self.store.save(&binding).await {
                let unwritten: Vec<String> = published.options[i..]
                    .iter()
                    .map(|o| o.option_id.clone())
                    .collect();
                warn!(
                    channel_id = %published.message.channel_id,
                    message_id = %published.message.message_id,
                    option_id = %option.option_id,
                    ordinal = option.ordinal,
                    persisted = persisted.len(),
                    unwritten = unwritten.len(),
                    error = %error,
                    "Reaction role setup only partially persisted"
                );
                return SetupReport {
                    message: published.message,
                    persisted,
                    status: SetupStatus::Partial {
                        failed_option_id: option.option_id.clone(),
                        error,
                        unwritten,
                    },
                };
            }

            debug!(
                option_id = %binding.option_id,
                ordinal = option.ordinal,
                "Binding persisted"
            );
            persisted.push(binding);
        }

        SetupReport {
            message: published.message,
            persisted,
            status: SetupStatus::Complete,
        }
    }

    /// prepare → publish → persist
    pub async fn create(&self, request: &SetupRequest) -> Result<SetupReport, SetupError> {
        let prepared = self.prepare(request)?;
        let published = self.publish(prepared).await?;
        Ok(self.persist(published).await)
    }
}
