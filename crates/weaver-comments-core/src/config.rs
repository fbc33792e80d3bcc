//! TOML configuration for the comment pipeline.
//!
//! ```toml
//! [document]
//! text_container = "content"
//!
//! [pipeline]
//! recompute_on_sync = true
//! coalesce = true
//!
//! [telemetry]
//! level = "$COMMENTS_LOG_LEVEL"
//! ```
//!
//! `$NAME` references are replaced with environment variables before parsing.

use std::{env, fs};

use miette::{IntoDiagnostic, WrapErr};
use serde::{Deserialize, Serialize};

use crate::error::AnchorError;

/// Where the document text lives in the replicated document.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct DocumentConfig {
    /// Name of the root text container.
    pub text_container: String,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            text_container: "content".into(),
        }
    }
}

/// Recompute policy of the mutation pipeline.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Recompute when the connection becomes synced, so anchors that failed
    /// while loading are re-evaluated without waiting for the next edit.
    pub recompute_on_sync: bool,
    /// Collapse all queued mutations into a single recompute.
    pub coalesce: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            recompute_on_sync: true,
            coalesce: true,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Log filter used when `RUST_LOG` is not set.
    pub level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        let level = if cfg!(debug_assertions) { "debug" } else { "info" };
        Self {
            level: level.into(),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct CommentsConfig {
    pub document: DocumentConfig,
    pub pipeline: PipelineConfig,
    pub telemetry: TelemetryConfig,
}

impl CommentsConfig {
    /// Load from a TOML file, substituting environment variables.
    pub fn load(config_file: &str) -> miette::Result<CommentsConfig> {
        let config_string = fs::read_to_string(config_file)
            .into_diagnostic()
            .wrap_err_with(|| format!("error reading config file {config_file}"))?;
        Ok(Self::from_toml_str(&substitute_env(config_string))?)
    }

    /// Parse a TOML string as-is.
    pub fn from_toml_str(config: &str) -> Result<CommentsConfig, AnchorError> {
        toml::from_str(config).map_err(|e| AnchorError::Config(e.to_string()))
    }
}

fn substitute_env(mut config: String) -> String {
    for (k, v) in env::vars() {
        config = config.replace(&format!("${k}"), &v);
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = CommentsConfig::from_toml_str("").unwrap();
        assert_eq!(config, CommentsConfig::default());
        assert_eq!(config.document.text_container, "content");
        assert!(config.pipeline.recompute_on_sync);
        assert!(config.pipeline.coalesce);
    }

    #[test]
    fn test_partial_sections() {
        let config = CommentsConfig::from_toml_str(
            r#"
            [document]
            text_container = "body"

            [pipeline]
            coalesce = false
            "#,
        )
        .unwrap();
        assert_eq!(config.document.text_container, "body");
        assert!(!config.pipeline.coalesce);
        assert!(config.pipeline.recompute_on_sync);
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let err = CommentsConfig::from_toml_str("[pipeline]\ncoalesce = \"yes\"").unwrap_err();
        assert!(matches!(err, AnchorError::Config(_)));
    }

    #[test]
    fn test_env_substitution() {
        let out = substitute_env("level = \"$PATH\"".to_string());
        assert!(!out.contains("$PATH"));
    }
}
