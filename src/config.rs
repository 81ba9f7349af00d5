//! Configuration loading and management

use anyhow::{bail, Result};

/// Tracing filter used when neither `RUST_LOG` nor `KEYSCOPE_LOG` is set
const DEFAULT_LOG_FILTER: &str = "info";

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Default tracing filter directive
    pub log_filter: String,

    /// Echo technical-log lines to stdout as they arrive
    pub echo_log: bool,

    /// Print the reconstructed text when the session ends
    pub show_text: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            echo_log: true,
            show_text: true,
        }
    }
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            log_filter: lookup("KEYSCOPE_LOG").unwrap_or(defaults.log_filter),
            echo_log: flag(&lookup, "KEYSCOPE_ECHO", defaults.echo_log)?,
            show_text: flag(&lookup, "KEYSCOPE_SHOW_TEXT", defaults.show_text)?,
        })
    }
}

fn flag(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> Result<bool> {
    let Some(value) = lookup(key) else {
        return Ok(default);
    };

    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("{key} must be a boolean, got {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load_from(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_config_defaults() {
        let config = load_from(&[]).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn test_config_overrides() {
        let config = load_from(&[
            ("KEYSCOPE_LOG", "keyscope=trace"),
            ("KEYSCOPE_ECHO", "off"),
            ("KEYSCOPE_SHOW_TEXT", " YES "),
        ])
        .unwrap();
        assert_eq!(config.log_filter, "keyscope=trace");
        assert!(!config.echo_log);
        assert!(config.show_text);
    }

    #[test]
    fn test_config_rejects_bad_flag() {
        let err = load_from(&[("KEYSCOPE_ECHO", "maybe")]).unwrap_err();
        assert!(err.to_string().contains("KEYSCOPE_ECHO"));
    }
}
