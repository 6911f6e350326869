//! Configuration file parser for ~/.config/jauzzi/config.toml.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are silently ignored by serde (with `deny_unknown_fields` off),
//! though we log a warning when the file contains potential typos.
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::date::DateFormat;
use crate::feed::fetcher::{FeedSettings, DEFAULT_PROXY_ENDPOINT};
use crate::feed::xml::{Alignment, XmlOptions, WORDPRESS_QUIRK_TITLE};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Missing keys fall back to `Default::default()`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// JSON feed proxy; the feed URL is appended as the `q` parameter.
    pub proxy_endpoint: String,

    /// Per-request timeout in seconds (headers and body each).
    pub timeout_secs: u64,

    /// Largest response body accepted, in bytes.
    pub max_feed_bytes: usize,

    pub user_agent: String,

    /// `"rfc2822"` or a chrono pattern with an offset specifier.
    pub json_date_format: DateFormat,

    pub xml_date_format: DateFormat,

    /// `"positional"` or `"per_item"`.
    pub xml_alignment: Alignment,

    /// Title of the row that marks the shifted media layout.
    pub quirk_title: String,
}

impl Default for Config {
    fn default() -> Self {
        let settings = FeedSettings::default();
        Self {
            proxy_endpoint: DEFAULT_PROXY_ENDPOINT.to_string(),
            timeout_secs: settings.timeout.as_secs(),
            max_feed_bytes: settings.max_feed_size,
            user_agent: settings.user_agent,
            json_date_format: DateFormat::rfc822_numeric(),
            xml_date_format: DateFormat::Rfc2822,
            xml_alignment: Alignment::Positional,
            quirk_title: WORDPRESS_QUIRK_TITLE.to_string(),
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 8] = [
        "proxy_endpoint",
        "timeout_secs",
        "max_feed_bytes",
        "user_agent",
        "json_date_format",
        "xml_date_format",
        "xml_alignment",
        "quirk_title",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → silently accepted (serde default behavior), logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // File deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            tracing::debug!("Config file is empty, using defaults");
            return Ok(Self::default());
        }

        // Parse as a raw table first to detect unknown keys
        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(content)?;
        tracing::info!(
            proxy = %config.proxy_endpoint,
            alignment = ?config.xml_alignment,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Settings for a [`FeedClient`](crate::FeedClient) built from this configuration.
    pub fn feed_settings(&self) -> FeedSettings {
        FeedSettings {
            proxy_endpoint: self.proxy_endpoint.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            max_feed_size: self.max_feed_bytes,
            user_agent: self.user_agent.clone(),
            json_date_format: self.json_date_format.clone(),
            xml: XmlOptions {
                date_format: self.xml_date_format.clone(),
                alignment: self.xml_alignment,
                quirk_title: self.quirk_title.clone(),
            },
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
