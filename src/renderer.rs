//! Setup Renderer
//!
//! Builds the embed and button row for a setup from encoded options, and
//! defines the publishing seam. Rendering depends on nothing but the
//! encoder's output; delivery is left to a `MessagePublisher`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{DisplayConfig, DEFAULT_ACCENT_COLOR};
use crate::encoder::EncodedOption;
use crate::error::PublishError;

/// Button style, stored by numeric code
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonStyle {
    #[default]
    Primary,
    Secondary,
    Success,
    Danger,
}

impl ButtonStyle {
    pub fn code(&self) -> i16 {
        match self {
            Self::Primary => 1,
            Self::Secondary => 2,
            Self::Success => 3,
            Self::Danger => 4,
        }
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(Self::Primary),
            2 => Some(Self::Secondary),
            3 => Some(Self::Success),
            4 => Some(Self::Danger),
            _ => None,
        }
    }
}

/// One interactive element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Control {
    /// Equal to the option id persisted in the binding
    pub custom_id: String,
    pub label: Option<String>,
    pub glyph: Option<String>,
    pub style: ButtonStyle,
}

/// One renderable message payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayUnit {
    pub title: Option<String>,
    pub body: String,
    pub color: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub controls: Vec<Control>,
}

impl DisplayUnit {
    pub fn new(title: Option<String>, body: impl Into<String>, color: u32) -> Self {
        Self {
            title,
            body: body.into(),
            color,
            controls: Vec::new(),
        }
    }

    /// Body length in characters
    pub fn body_len(&self) -> usize {
        self.body.chars().count()
    }
}

/// Summary embed plus one control per option
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedSetup {
    pub summary: DisplayUnit,
    pub controls: Vec<Control>,
}

/// Identifiers of a message that reached its channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedMessage {
    pub channel_id: String,
    pub message_id: String,
}

/// Sends a rendered setup to a channel. A single attempt; no retries.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    async fn publish(
        &self,
        channel_id: &str,
        setup: &RenderedSetup,
    ) -> Result<PublishedMessage, PublishError>;
}

/// Role mention markup
pub fn grant_mention(grant_ref: &str) -> String {
    format!("<@&{grant_ref}>")
}

/// Channel mention markup
pub fn channel_mention(channel_id: &str) -> String {
    format!("<#{channel_id}>")
}

#[derive(Debug, Clone)]
pub struct SetupRenderer {
    accent_color: u32,
    button_style: ButtonStyle,
}

impl Default for SetupRenderer {
    fn default() -> Self {
        Self {
            accent_color: DEFAULT_ACCENT_COLOR,
            button_style: ButtonStyle::Primary,
        }
    }
}

impl SetupRenderer {
    pub fn new(display: &DisplayConfig) -> Self {
        Self {
            accent_color: display.accent_color,
            button_style: display.button_style,
        }
    }

    pub fn button_style(&self) -> ButtonStyle {
        self.button_style
    }

    pub fn render(&self, title: &str, body: &str, options: &[EncodedOption]) -> RenderedSetup {
        let summary_lines = options
            .iter()
            .map(|option| {
                format!(
                    "{} - {}",
                    option.display.as_str(),
                    grant_mention(&option.grant_ref)
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let controls: Vec<Control> = options
            .iter()
            .map(|option| Control {
                custom_id: option.option_id.clone(),
                label: option.label().map(str::to_string),
                glyph: option.glyph().map(str::to_string),
                style: self.button_style,
            })
            .collect();

        RenderedSetup {
            summary: DisplayUnit::new(
                Some(title.to_string()),
                format!("{body}\n\n{summary_lines}"),
                self.accent_color,
            ),
            controls,
        }
    }
}
