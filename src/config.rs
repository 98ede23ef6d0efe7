//! Configuration for reaction role setups
//!
//! Loaded from YAML with every field defaulted, so an empty document (or a
//! missing file) yields a working configuration.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::{info, warn};

use crate::renderer::ButtonStyle;

/// Accent colour used for setup and listing embeds
pub const DEFAULT_ACCENT_COLOR: u32 = 0xFF00FF;

/// Maximum characters in one listing unit body
pub const DEFAULT_PAGE_BUDGET: usize = 2048;

/// Title of every listing unit
pub const DEFAULT_LISTING_TITLE: &str = "Reaction Role Setup";

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReactionRolesConfig {
    pub display: DisplayConfig,
    pub database: DatabaseSettings,
}

/// How setups and listings are rendered
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub accent_color: u32,
    pub listing_title: String,
    pub page_budget: usize,
    pub button_style: ButtonStyle,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            accent_color: DEFAULT_ACCENT_COLOR,
            listing_title: DEFAULT_LISTING_TITLE.to_string(),
            page_budget: DEFAULT_PAGE_BUDGET,
            button_style: ButtonStyle::Primary,
        }
    }
}

/// Database section of the YAML file
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Name of the environment variable holding the connection string
    pub url_env: String,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url_env: "DATABASE_URL".to_string(),
            max_connections: 5,
            connect_timeout_secs: 30,
        }
    }
}

impl DatabaseSettings {
    /// Resolve the connection settings against the environment
    pub fn resolve(&self) -> DatabaseConfig {
        let mut config = DatabaseConfig::from_env_var(&self.url_env);
        config.max_connections = self.max_connections;
        config.connection_timeout = Duration::from_secs(self.connect_timeout_secs);
        config
    }
}

/// Resolved database connection settings
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub connection_timeout: Duration,
}

impl DatabaseConfig {
    fn from_env_var(var: &str) -> Self {
        Self {
            database_url: std::env::var(var)
                .unwrap_or_else(|_| "postgresql://localhost:5432/reaction_roles".to_string()),
            max_connections: 5,
            connection_timeout: Duration::from_secs(30),
        }
    }
}

/// Mask the password in a database URL for logging
pub fn mask_database_url(url: &str) -> String {
    if let Ok(parsed) = url::Url::parse(url) {
        let mut masked = parsed.clone();
        if parsed.password().is_some() {
            let _ = masked.set_password(Some("***"));
        }
        masked.to_string()
    } else {
        let chars: Vec<char> = url.chars().collect();
        if chars.len() > 20 {
            let head: String = chars[..10].iter().collect();
            let tail: String = chars[chars.len() - 10..].iter().collect();
            format!("{head}***{tail}")
        } else {
            "***".to_string()
        }
    }
}

impl ReactionRolesConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self, Box<dyn std::error::Error>> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: ReactionRolesConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Load from `path` when it exists, otherwise fall back to defaults
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "No configuration file, using defaults");
            return Self::default();
        }
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Invalid configuration, using defaults");
                Self::default()
            }
        }
    }
}
