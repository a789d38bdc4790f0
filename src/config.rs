use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_POLL_TIMEOUT: u64 = 60;

/// Bot configuration, loaded once at startup and shared read-only by the
/// poller and the dispatcher. Field names match the settings file; see
/// `settings.toml.sample`.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Name of the bot, used to strip @mentions from commands.
    #[serde(rename = "BotName", default)]
    pub bot_name: String,

    /// Bot API token (ask @BotFather).
    #[serde(rename = "ApiKey", default)]
    pub api_key: String,

    /// Long-poll timeout in seconds, kept string-encoded as in the settings
    /// file. Use [`Config::poll_timeout`] for the parsed value.
    #[serde(rename = "Timeout", default)]
    pub timeout: String,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Effective long-poll timeout: the configured value, or 60 when the
    /// field is absent, empty, `"0"`, or not a valid integer.
    pub fn poll_timeout(&self) -> u64 {
        match self.timeout.parse::<u64>() {
            Ok(0) | Err(_) => DEFAULT_POLL_TIMEOUT,
            Ok(secs) => secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_timeout(timeout: &str) -> Config {
        Config {
            bot_name: "TestBot".to_string(),
            api_key: "123:abc".to_string(),
            timeout: timeout.to_string(),
        }
    }

    #[test]
    fn test_parse_full_settings() {
        let config: Config = toml::from_str(
            r#"
            BotName = "TestBot"
            ApiKey = "123456:ABC-DEF"
            Timeout = "45"
            "#,
        )
        .unwrap();

        assert_eq!(config.bot_name, "TestBot");
        assert_eq!(config.api_key, "123456:ABC-DEF");
        assert_eq!(config.poll_timeout(), 45);
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let config: Config = toml::from_str("").unwrap();

        assert!(config.bot_name.is_empty());
        assert!(config.api_key.is_empty());
        assert_eq!(config.poll_timeout(), 60);
    }

    #[test]
    fn test_timeout_fallback() {
        assert_eq!(config_with_timeout("").poll_timeout(), 60);
        assert_eq!(config_with_timeout("0").poll_timeout(), 60);
        assert_eq!(config_with_timeout("soon").poll_timeout(), 60);
        assert_eq!(config_with_timeout("90").poll_timeout(), 90);
    }
}
