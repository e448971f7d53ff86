use std::env;

use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_MAX_TOKENS: u32 = 300;
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{key} must be {expected}, got '{value}'")]
    Invalid {
        key: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RewriteConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub port: u16,
    pub rewrite: RewriteConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match non_empty("GOALPLAN_PORT") {
            Some(raw) => parse(&raw, "GOALPLAN_PORT", "a port number")?,
            None => DEFAULT_PORT,
        };

        let mut rewrite = RewriteConfig {
            api_key: non_empty("OPENAI_API_KEY"),
            ..RewriteConfig::default()
        };
        if let Some(v) = non_empty("OPENAI_BASE_URL") {
            rewrite.base_url = v;
        }
        if let Some(v) = non_empty("OPENAI_MODEL") {
            rewrite.model = v;
        }
        if let Some(raw) = non_empty("OPENAI_MAX_TOKENS") {
            rewrite.max_tokens = parse(&raw, "OPENAI_MAX_TOKENS", "a positive integer")?;
        }
        if let Some(raw) = non_empty("OPENAI_TEMPERATURE") {
            rewrite.temperature = parse(&raw, "OPENAI_TEMPERATURE", "a number")?;
        }

        Ok(Self { port, rewrite })
    }
}

fn parse<T: std::str::FromStr>(
    raw: &str,
    key: &'static str,
    expected: &'static str,
) -> Result<T, ConfigError> {
    raw.trim().parse::<T>().map_err(|_| ConfigError::Invalid {
        key,
        expected,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = config_from(&[]).expect("defaults");
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.rewrite, RewriteConfig::default());
        assert!(config.rewrite.api_key.is_none());
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("GOALPLAN_PORT", "9090"),
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_BASE_URL", "http://127.0.0.1:1234/v1"),
            ("OPENAI_MODEL", "gpt-4o"),
            ("OPENAI_MAX_TOKENS", "128"),
            ("OPENAI_TEMPERATURE", "0.5"),
        ])
        .expect("valid overrides");
        assert_eq!(config.port, 9090);
        assert_eq!(config.rewrite.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.rewrite.base_url, "http://127.0.0.1:1234/v1");
        assert_eq!(config.rewrite.model, "gpt-4o");
        assert_eq!(config.rewrite.max_tokens, 128);
        assert_eq!(config.rewrite.temperature, 0.5);
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let config = config_from(&[("OPENAI_API_KEY", "   ")]).expect("valid");
        assert!(config.rewrite.api_key.is_none());
    }

    #[test]
    fn rejects_unparsable_port() {
        let err = config_from(&[("GOALPLAN_PORT", "eighty")]).expect_err("bad port");
        assert_eq!(err.to_string(), "GOALPLAN_PORT must be a port number, got 'eighty'");
    }
}
