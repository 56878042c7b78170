use anyhow::{Context, Result};
use std::time::Duration;

use crate::recovery::RecoveryPolicy;

pub const DEFAULT_OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Debug, Clone)]
pub struct Config {
    // OpenAI-compatible model endpoint (absent key => AI unavailable)
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_api_url: String,
    pub openai_temperature: f32,
    pub request_timeout_secs: u64,

    // Storage
    pub database_url: String,

    // Localization
    pub locale: String,
    pub preferred_language: Option<String>,

    // Recovery
    pub max_manual_retries: u32,
    pub skip_grace_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            // OpenAI
            openai_api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            openai_model: std::env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            openai_api_url: std::env::var("OPENAI_API_URL")
                .unwrap_or_else(|_| DEFAULT_OPENAI_API_URL.to_string()),
            openai_temperature: parse_env("OPENAI_TEMPERATURE", 0.7)?,
            request_timeout_secs: parse_env("REQUEST_TIMEOUT_SECS", 60)?,

            // Storage
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://hairstyle-advisor.db".to_string()),

            // Localization - APP_LOCALE wins over the POSIX locale
            locale: std::env::var("APP_LOCALE")
                .or_else(|_| std::env::var("LANG"))
                .map(|raw| normalize_locale(&raw))
                .unwrap_or_else(|_| "en".to_string()),
            preferred_language: std::env::var("PREFERRED_LANGUAGE").ok(),

            // Recovery
            max_manual_retries: parse_env("MAX_MANUAL_RETRIES", 3)?,
            skip_grace_secs: parse_env("SKIP_GRACE_SECS", 3)?,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn recovery_policy(&self) -> RecoveryPolicy {
        RecoveryPolicy::new(self.max_manual_retries)
            .with_skip_grace(Duration::from_secs(self.skip_grace_secs))
    }
}

/// Read an optional numeric variable; a present but malformed value is an error.
fn parse_env<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} is not a valid value: '{}'", name, raw)),
        Err(_) => Ok(default),
    }
}

/// Turn a POSIX locale like `fr_FR.UTF-8` into a BCP 47-ish tag (`fr-FR`).
pub fn normalize_locale(raw: &str) -> String {
    let tag = raw.split(['.', '@']).next().unwrap_or("").trim();
    if tag.is_empty() || tag == "C" || tag == "POSIX" {
        return "en".to_string();
    }
    tag.replace('_', "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_posix_locale() {
        assert_eq!(normalize_locale("fr_FR.UTF-8"), "fr-FR");
        assert_eq!(normalize_locale("de_DE@euro"), "de-DE");
        assert_eq!(normalize_locale("ja"), "ja");
    }

    #[test]
    fn test_normalize_c_locale_is_english() {
        assert_eq!(normalize_locale("C"), "en");
        assert_eq!(normalize_locale("POSIX"), "en");
        assert_eq!(normalize_locale(""), "en");
    }

    #[test]
    fn test_recovery_policy_from_config() {
        let config = Config {
            openai_api_key: None,
            openai_model: "gpt-4o-mini".to_string(),
            openai_api_url: DEFAULT_OPENAI_API_URL.to_string(),
            openai_temperature: 0.7,
            request_timeout_secs: 60,
            database_url: "sqlite::memory:".to_string(),
            locale: "en".to_string(),
            preferred_language: None,
            max_manual_retries: 5,
            skip_grace_secs: 10,
        };

        let policy = config.recovery_policy();
        assert_eq!(policy.max_manual_retries, 5);
        assert_eq!(policy.skip_grace, Duration::from_secs(10));
        assert_eq!(config.request_timeout(), Duration::from_secs(60));
    }
}
