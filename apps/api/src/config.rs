use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub reddit_client_id: String,
    pub reddit_client_secret: String,
    pub reddit_username: String,
    pub reddit_password: String,
    pub reddit_user_agent: String,
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    pub search: SearchSettings,
}

/// Tunables for the search pipeline. Defaults match the documented behaviour.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSettings {
    pub result_limit: usize,
    pub source_timeout: Duration,
    pub max_retries: u32,
    pub source_concurrency: usize,
    pub confidence_threshold: f64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            result_limit: 20,
            source_timeout: Duration::from_secs(10),
            max_retries: 3,
            source_concurrency: crate::models::post::ALL_SOURCES.len(),
            confidence_threshold: 0.5,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = SearchSettings::default();

        Ok(Config {
            reddit_client_id: require_env("REDDIT_CLIENT_ID")?,
            reddit_client_secret: require_env("REDDIT_CLIENT_SECRET")?,
            reddit_username: require_env("REDDIT_USERNAME")?,
            reddit_password: require_env("REDDIT_PASSWORD")?,
            reddit_user_agent: std::env::var("REDDIT_USER_AGENT")
                .unwrap_or_else(|_| "ConcertSearchBot/1.0".to_string()),
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            search: SearchSettings {
                result_limit: parse_env("RESULT_LIMIT", defaults.result_limit)?,
                source_timeout: Duration::from_secs(parse_env(
                    "SOURCE_TIMEOUT_SECS",
                    defaults.source_timeout.as_secs(),
                )?),
                max_retries: parse_env("SOURCE_MAX_RETRIES", defaults.max_retries)?,
                source_concurrency: parse_env("SOURCE_CONCURRENCY", defaults.source_concurrency)?
                    .max(1),
                confidence_threshold: parse_env(
                    "INTERPRETATION_CONFIDENCE_THRESHOLD",
                    defaults.confidence_threshold,
                )?,
            },
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = SearchSettings::default();
        assert_eq!(settings.result_limit, 20);
        assert_eq!(settings.source_timeout, Duration::from_secs(10));
        assert_eq!(settings.max_retries, 3);
        assert_eq!(settings.source_concurrency, 9);
        assert!((settings.confidence_threshold - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_env_falls_back_to_default() {
        let value: usize = parse_env("CONCERT_API_TEST_UNSET_VARIABLE", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_parse_env_rejects_garbage() {
        std::env::set_var("CONCERT_API_TEST_BAD_NUMBER", "twenty");
        let result: Result<usize> = parse_env("CONCERT_API_TEST_BAD_NUMBER", 20);
        assert!(result.is_err());
        std::env::remove_var("CONCERT_API_TEST_BAD_NUMBER");
    }
}
