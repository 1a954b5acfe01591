//! User configuration model, stored as `config.toml`.

use crate::error::Result;
use crate::export::ExportFormat;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_estimate() -> u32 {
    5
}

fn default_export_format() -> String {
    "markdown".to_string()
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RootConfig {
    /// Overrides the platform data directory for stored sessions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_dir: Option<PathBuf>,
    /// Total-thoughts estimate used when a command gives none
    #[serde(default = "default_estimate")]
    pub default_estimate: u32,
    #[serde(default = "default_export_format")]
    pub export_format: String,
    /// `tracing` filter directive, e.g. `seqthink=debug`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
}

impl Default for RootConfig {
    fn default() -> Self {
        Self {
            session_dir: None,
            default_estimate: default_estimate(),
            export_format: default_export_format(),
            log_filter: None,
        }
    }
}

impl RootConfig {
    pub fn export_format(&self) -> Result<ExportFormat> {
        self.export_format.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: RootConfig = toml::from_str("").unwrap();
        assert_eq!(config, RootConfig::default());
        assert_eq!(config.export_format().unwrap(), ExportFormat::Markdown);
    }

    #[test]
    fn test_partial_file() {
        let config: RootConfig = toml::from_str(
            r#"
default_estimate = 8
export_format = "compact"
log_filter = "seqthink=debug"
"#,
        )
        .unwrap();
        assert_eq!(config.default_estimate, 8);
        assert_eq!(config.export_format().unwrap(), ExportFormat::Compact);
        assert_eq!(config.log_filter.as_deref(), Some("seqthink=debug"));
        assert!(config.session_dir.is_none());
    }

    #[test]
    fn test_bad_export_format() {
        let config = RootConfig {
            export_format: "yaml".to_string(),
            ..Default::default()
        };
        assert!(config.export_format().unwrap_err().is_unsupported_format());
    }
}
