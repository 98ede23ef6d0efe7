//! Option Encoder
//!
//! Turns up to five (grant, display token) pairs into encoded options with
//! deterministic identifiers. Pure: no I/O, no counters, no randomness.
//!
//! The identifier is re-derived by the click listener from the control it
//! receives, so it must only ever depend on the channel and the ordinal.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Maximum options per setup (one row of buttons)
pub const MAX_OPTIONS: usize = 5;

/// Prefix shared by every option identifier
pub const OPTION_ID_PREFIX: &str = "reaction_role_";

/// Custom emoji reference (`<:name:id>` / `<a:name:id>`) or one pictographic codepoint.
///
/// Multi-codepoint emoji (variation selectors, skin tones, ZWJ sequences) do
/// not match and are classified as labels.
static GLYPH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:<a?:[A-Za-z0-9_]+:[0-9]+>|[\x{1F300}-\x{1FAFF}\x{2600}-\x{26FF}\x{2700}-\x{27BF}])$",
    )
    .unwrap()
});

/// One requested option, as supplied by the command surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSpec {
    pub grant_ref: String,
    pub display_token: String,
    /// Slot number, 1..=5
    pub ordinal: u8,
}

impl OptionSpec {
    pub fn new(ordinal: u8, grant_ref: impl Into<String>, display_token: impl Into<String>) -> Self {
        Self {
            grant_ref: grant_ref.into(),
            display_token: display_token.into(),
            ordinal,
        }
    }

    /// Both halves of the pair were supplied
    pub fn is_complete(&self) -> bool {
        !self.grant_ref.trim().is_empty() && !self.display_token.trim().is_empty()
    }
}

/// How a display token is shown on its control
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum DisplayToken {
    Label(String),
    Glyph(String),
}

impl DisplayToken {
    /// Classify a raw token
    pub fn classify(token: &str) -> Self {
        if is_glyph(token) {
            Self::Glyph(token.to_string())
        } else {
            Self::Label(token.to_string())
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Label(label) => Some(label),
            Self::Glyph(_) => None,
        }
    }

    pub fn glyph(&self) -> Option<&str> {
        match self {
            Self::Label(_) => None,
            Self::Glyph(glyph) => Some(glyph),
        }
    }

    /// Rebuild from the stored nullable pair. Label wins if both are set.
    pub fn from_parts(label: Option<&str>, glyph: Option<&str>) -> Option<Self> {
        match (label, glyph) {
            (Some(label), _) => Some(Self::Label(label.to_string())),
            (None, Some(glyph)) => Some(Self::Glyph(glyph.to_string())),
            (None, None) => None,
        }
    }

    /// The text shown in summaries, whichever kind it is
    pub fn as_str(&self) -> &str {
        match self {
            Self::Label(s) | Self::Glyph(s) => s,
        }
    }
}

/// Syntactic glyph check. Not grapheme-aware.
pub fn is_glyph(token: &str) -> bool {
    GLYPH_RE.is_match(token)
}

/// Encoder output for a single option
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedOption {
    pub grant_ref: String,
    pub option_id: String,
    pub ordinal: u8,
    pub display: DisplayToken,
}

impl EncodedOption {
    pub fn label(&self) -> Option<&str> {
        self.display.label()
    }

    pub fn glyph(&self) -> Option<&str> {
        self.display.glyph()
    }
}

/// `reaction_role_<channel>_<ordinal>`
pub fn option_id(channel_id: &str, ordinal: u8) -> String {
    format!("{OPTION_ID_PREFIX}{channel_id}_{ordinal}")
}

/// Split an option identifier back into channel and ordinal.
///
/// Only the exact form `option_id` produces is accepted (no `+1`, no `01`).
pub fn parse_option_id(option_id: &str) -> Option<(&str, u8)> {
    let rest = option_id.strip_prefix(OPTION_ID_PREFIX)?;
    let (channel_id, ordinal) = rest.rsplit_once('_')?;
    let ordinal: u8 = ordinal.parse().ok()?;
    if channel_id.is_empty() || !(1..=MAX_OPTIONS as u8).contains(&ordinal) {
        return None;
    }
    if self::option_id(channel_id, ordinal) != option_id {
        return None;
    }
    Some((channel_id, ordinal))
}

/// Encode the complete specs of one setup request, in ordinal order.
///
/// Incomplete specs (missing grant or token) are dropped before counting.
pub fn encode(
    channel_id: &str,
    specs: &[OptionSpec],
) -> Result<Vec<EncodedOption>, ValidationError> {
    let mut complete: Vec<&OptionSpec> = specs.iter().filter(|s| s.is_complete()).collect();

    if complete.is_empty() {
        return Err(ValidationError::NoOptions);
    }
    if complete.len() > MAX_OPTIONS {
        return Err(ValidationError::TooManyOptions {
            count: complete.len(),
        });
    }

    let mut seen = HashSet::new();
    for spec in &complete {
        if !(1..=MAX_OPTIONS as u8).contains(&spec.ordinal) {
            return Err(ValidationError::OrdinalOutOfRange {
                ordinal: spec.ordinal,
            });
        }
        if !seen.insert(spec.ordinal) {
            return Err(ValidationError::DuplicateOrdinal {
                ordinal: spec.ordinal,
            });
        }
    }

    complete.sort_by_key(|s| s.ordinal);

    Ok(complete
        .into_iter()
        .map(|spec| EncodedOption {
            grant_ref: spec.grant_ref.clone(),
            option_id: option_id(channel_id, spec.ordinal),
            ordinal: spec.ordinal,
            display: DisplayToken::classify(&spec.display_token),
        })
        .collect())
}
