/// Configuration schema and defaults for yieldcast.
///
/// Defines the TOML-serializable structure with the `[service]`,
/// `[pacing]` and `[logging]` sections. Every field has a built-in default;
/// users only set what they want to change.
use serde::{Deserialize, Serialize};

use crate::client::endpoint::DEFAULT_ENDPOINT;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level yieldcast configuration.
///
/// Maps to `~/.yieldcast/config.toml` and `.yieldcast.toml`. Missing
/// sections and fields fall back to built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct YieldcastConfig {
    pub service: ServiceConfig,
    pub pacing: PacingConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [service]
// ---------------------------------------------------------------------------

/// Where and how to reach the prediction service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Prediction endpoint. Hosted `onrender.com` URLs get `/predict`
    /// appended when it is missing.
    pub url: String,
    /// Transport timeout in milliseconds. `0` disables the timeout.
    pub timeout_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_ENDPOINT.to_string(),
            timeout_ms: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// [pacing]
// ---------------------------------------------------------------------------

/// Minimum time a submission stays visibly pending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Delay before the network call is issued (milliseconds).
    pub min_pending_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            min_pending_ms: 800,
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Diagnostics journal settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Append one JSONL entry per completed cycle to
    /// `~/.yieldcast/prediction-log.jsonl`.
    pub enabled: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

// ---------------------------------------------------------------------------
// Annotated default file
// ---------------------------------------------------------------------------

impl YieldcastConfig {
    /// Annotated default config written by `yieldcast config init`.
    pub fn default_toml() -> String {
        format!(
            r#"# yieldcast configuration
#
# Precedence (lowest to highest): built-in defaults, this file,
# ./.yieldcast.toml, YIELDCAST_* environment variables.

[service]
# Prediction endpoint. Bare *.onrender.com hosts get /predict appended.
url = "{DEFAULT_ENDPOINT}"
# Transport timeout in milliseconds (0 = wait indefinitely).
timeout_ms = 0

[pacing]
# Minimum time a submission shows as pending before the request is sent.
min_pending_ms = 800

[logging]
# Record every prediction cycle in ~/.yieldcast/prediction-log.jsonl.
enabled = true
"#
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = YieldcastConfig::default();
        assert_eq!(config.service.url, "http://127.0.0.1:5000/predict");
        assert_eq!(config.service.timeout_ms, 0);
        assert_eq!(config.pacing.min_pending_ms, 800);
        assert!(config.logging.enabled);
    }

    #[test]
    fn default_toml_parses_to_defaults() {
        let parsed: YieldcastConfig = toml::from_str(&YieldcastConfig::default_toml()).unwrap();
        assert_eq!(parsed, YieldcastConfig::default());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let toml_str = r#"
[service]
timeout_ms = 1500
"#;
        let parsed: YieldcastConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(parsed.service.timeout_ms, 1500);
        assert_eq!(parsed.service.url, DEFAULT_ENDPOINT);
        assert_eq!(parsed.pacing.min_pending_ms, 800);
    }

    #[test]
    fn empty_toml_is_all_defaults() {
        let parsed: YieldcastConfig = toml::from_str("").unwrap();
        assert_eq!(parsed, YieldcastConfig::default());
    }
}
