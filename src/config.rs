//! Configuration file handling.
//!
//! Settings come from `.finance-dashboard.toml`; command-line flags are
//! merged on top through [`Overrides`].

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = ".finance-dashboard.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ai: AiConfig,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

/// Generative AI service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Model used for extraction and advice.
    #[serde(default = "default_model")]
    pub model: String,

    /// API base URL (no trailing path).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_api_key_env() -> String {
    "API_KEY".to_string()
}

fn default_timeout() -> u64 {
    120
}

/// How totals and transactions are shown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Fixed currency symbol, independent of locale.
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,

    /// Number of transactions in the "recent" list.
    #[serde(default = "default_recent_count")]
    pub recent_count: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            currency_symbol: default_currency_symbol(),
            recent_count: default_recent_count(),
        }
    }
}

fn default_currency_symbol() -> String {
    "£".to_string()
}

fn default_recent_count() -> usize {
    5
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}

/// Values given explicitly on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub model: Option<String>,
    pub currency_symbol: Option<String>,
    pub timeout_seconds: Option<u64>,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Command-line values win over the file; absent ones leave it alone.
    pub fn merge(&mut self, overrides: &Overrides) {
        if let Some(ref model) = overrides.model {
            self.ai.model = model.clone();
        }
        if let Some(ref symbol) = overrides.currency_symbol {
            self.display.currency_symbol = symbol.clone();
        }
        if let Some(timeout) = overrides.timeout_seconds {
            self.ai.timeout_seconds = timeout;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.ai.model, "gemini-2.5-flash");
        assert_eq!(config.ai.api_key_env, "API_KEY");
        assert_eq!(config.display.currency_symbol, "£");
        assert_eq!(config.display.recent_count, 5);
        assert_eq!(config.server.bind, "0.0.0.0:3000");
    }

    #[test]
    fn test_parse_partial_config() {
        let toml_content = r#"
[ai]
model = "gemini-2.0-pro"
timeout_seconds = 30

[display]
currency_symbol = "R$"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.ai.model, "gemini-2.0-pro");
        assert_eq!(config.ai.timeout_seconds, 30);
        assert_eq!(config.ai.api_key_env, "API_KEY");
        assert_eq!(config.display.currency_symbol, "R$");
        assert_eq!(config.display.recent_count, 5);
        assert_eq!(config.server.bind, "0.0.0.0:3000");
    }

    #[test]
    fn test_merge_only_overrides_given_values() {
        let mut config = Config::default();
        config.merge(&Overrides {
            currency_symbol: Some("$".to_string()),
            ..Overrides::default()
        });

        assert_eq!(config.display.currency_symbol, "$");
        assert_eq!(config.ai.model, "gemini-2.5-flash");
        assert_eq!(config.ai.timeout_seconds, 120);

        config.merge(&Overrides {
            timeout_seconds: Some(15),
            ..Overrides::default()
        });
        assert_eq!(config.ai.timeout_seconds, 15);
        assert_eq!(config.display.currency_symbol, "$");
    }

    #[test]
    fn test_default_toml_round_trips() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[ai]"));
        assert!(toml_str.contains("[display]"));
        assert!(toml_str.contains("[server]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.display.currency_symbol, "£");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "[server]\nbind = \"127.0.0.1:8080\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:8080");

        std::fs::write(&path, "[server\n").unwrap();
        assert!(Config::load(&path).is_err());
    }
}
