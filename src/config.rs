//! Dispatcher configuration, loaded from TOML.
//!
//! ```toml
//! operator_numbers = ["13800000000"]
//! operator_template = "SMS_461930199"
//! resend_template = "SMS_461930198"
//! sign_name = "冷链监控"
//! value_cap = 35
//! pacing_ms = 1000
//! ```
//!
//! Every key is optional.

use crate::assemble::VALUE_CAP;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Who hears about alarms that could not be templated.
    #[serde(default)]
    pub operator_numbers: Vec<String>,

    /// Provider template for operator notices (`EventId`, `Reason`, `Message`).
    #[serde(default = "default_operator_template")]
    pub operator_template: String,

    /// Provider template for resending a failed SMS verbatim (`Message`).
    #[serde(default = "default_resend_template")]
    pub resend_template: String,

    /// Per-parameter character limit.
    #[serde(default = "default_value_cap")]
    pub value_cap: usize,

    /// Delay between consecutive sends, in milliseconds.
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,

    #[serde(default = "default_sign_name")]
    pub sign_name: String,
}

fn default_operator_template() -> String {
    "SMS_461930199".to_string()
}

fn default_resend_template() -> String {
    "SMS_461930198".to_string()
}

fn default_value_cap() -> usize {
    VALUE_CAP
}

fn default_pacing_ms() -> u64 {
    1000
}

fn default_sign_name() -> String {
    "冷链监控".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            operator_numbers: Vec::new(),
            operator_template: default_operator_template(),
            resend_template: default_resend_template(),
            value_cap: default_value_cap(),
            pacing_ms: default_pacing_ms(),
            sign_name: default_sign_name(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "loading config");

        let content =
            std::fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    pub fn has_operator(&self) -> bool {
        self.operator_numbers.iter().any(|n| !n.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.value_cap, 35);
        assert_eq!(config.pacing(), Duration::from_secs(1));
        assert!(!config.has_operator());
    }

    #[test]
    fn explicit_keys_override_defaults() {
        let config = Config::from_toml_str(
            r#"
            operator_numbers = ["13800000000", ""]
            value_cap = 20
            pacing_ms = 0
            "#,
        )
        .unwrap();
        assert!(config.has_operator());
        assert_eq!(config.value_cap, 20);
        assert_eq!(config.pacing(), Duration::ZERO);
        assert_eq!(config.resend_template, default_resend_template());
    }

    #[test]
    fn bad_documents_are_parse_errors() {
        assert!(matches!(Config::from_toml_str("value_cap = \"many\""), Err(ConfigError::Parse(_))));
        assert!(matches!(Config::load("/nonexistent/alarmsms.toml"), Err(ConfigError::Io { .. })));
    }
}
