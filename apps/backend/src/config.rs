//! Server configuration read from the environment.

use std::time::Duration;

use study_core::session::DEFAULT_TIME_PER_QUESTION;
use thiserror::Error;

use crate::services::chat::{ChatConfig, DEFAULT_CHAT_API_URL, DEFAULT_CHAT_MODEL};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub chat: ChatConfig,
    pub quiz_time_per_question: Duration,
    /// Delay before a timed-out question moves on by itself; `None` waits for the client.
    pub quiz_auto_advance: Option<Duration>,
    /// Sessions unused for this long are evicted.
    pub session_idle_ttl: Duration,
}

/// Default idle time before a live session is evicted.
pub const DEFAULT_SESSION_IDLE: Duration = Duration::from_secs(30 * 60);

/// Default delay before a timed-out question auto-advances.
pub const DEFAULT_AUTO_ADVANCE: Duration = Duration::from_secs(1);

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any name-to-value lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };
        let or_default = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let port = match lookup("PORT") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value,
            })?,
            None => 3000,
        };

        let seconds = |name: &'static str| -> Result<Option<u64>, ConfigError> {
            lookup(name)
                .map(|value| {
                    value
                        .trim()
                        .parse::<u64>()
                        .map_err(|_| ConfigError::Invalid { name, value })
                })
                .transpose()
        };
        let positive = |name: &'static str, default: Duration| -> Result<Duration, ConfigError> {
            match seconds(name)? {
                None => Ok(default),
                Some(0) => Err(ConfigError::Invalid {
                    name,
                    value: "0".to_string(),
                }),
                Some(secs) => Ok(Duration::from_secs(secs)),
            }
        };

        let quiz_time_per_question = positive("QUIZ_SECONDS_PER_QUESTION", DEFAULT_TIME_PER_QUESTION)?;
        let session_idle_ttl = positive("SESSION_IDLE_SECS", DEFAULT_SESSION_IDLE)?;
        let quiz_auto_advance = match seconds("QUIZ_AUTO_ADVANCE_SECS")? {
            None => Some(DEFAULT_AUTO_ADVANCE),
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            host: or_default("HOST", "0.0.0.0"),
            port,
            chat: ChatConfig {
                api_url: or_default("CHAT_API_URL", DEFAULT_CHAT_API_URL),
                api_key: required("CHAT_API_KEY")?,
                model: or_default("CHAT_MODEL", DEFAULT_CHAT_MODEL),
            },
            quiz_time_per_question,
            quiz_auto_advance,
            session_idle_ttl,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_fill_optional_values() {
        let config = config(&[("DATABASE_URL", "postgres://db"), ("CHAT_API_KEY", "k")]).unwrap();

        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
        assert_eq!(config.chat.api_url, DEFAULT_CHAT_API_URL);
        assert_eq!(config.chat.model, DEFAULT_CHAT_MODEL);
        assert_eq!(config.quiz_time_per_question, Duration::from_secs(15));
        assert_eq!(config.quiz_auto_advance, Some(Duration::from_secs(1)));
        assert_eq!(config.session_idle_ttl, Duration::from_secs(1800));
    }

    #[test]
    fn overrides_are_applied() {
        let config = config(&[
            ("DATABASE_URL", "postgres://db"),
            ("CHAT_API_KEY", "k"),
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("CHAT_MODEL", "other-model"),
            ("QUIZ_SECONDS_PER_QUESTION", "30"),
            ("QUIZ_AUTO_ADVANCE_SECS", "3"),
            ("SESSION_IDLE_SECS", "120"),
        ])
        .unwrap();

        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert_eq!(config.chat.model, "other-model");
        assert_eq!(config.quiz_time_per_question, Duration::from_secs(30));
        assert_eq!(config.quiz_auto_advance, Some(Duration::from_secs(3)));
        assert_eq!(config.session_idle_ttl, Duration::from_secs(120));
    }

    #[test]
    fn zero_auto_advance_waits_for_client() {
        let config = config(&[
            ("DATABASE_URL", "postgres://db"),
            ("CHAT_API_KEY", "k"),
            ("QUIZ_AUTO_ADVANCE_SECS", "0"),
        ])
        .unwrap();
        assert_eq!(config.quiz_auto_advance, None);
    }

    #[test]
    fn missing_required_values() {
        let err = config(&[("CHAT_API_KEY", "k")]).unwrap_err();
        assert_eq!(err, ConfigError::Missing("DATABASE_URL"));

        let err = config(&[("DATABASE_URL", "postgres://db"), ("CHAT_API_KEY", "  ")]).unwrap_err();
        assert_eq!(err, ConfigError::Missing("CHAT_API_KEY"));
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let err = config(&[
            ("DATABASE_URL", "postgres://db"),
            ("CHAT_API_KEY", "k"),
            ("PORT", "http"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));

        let err = config(&[
            ("DATABASE_URL", "postgres://db"),
            ("CHAT_API_KEY", "k"),
            ("QUIZ_SECONDS_PER_QUESTION", "0"),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                name: "QUIZ_SECONDS_PER_QUESTION",
                ..
            }
        ));

        let err = config(&[
            ("DATABASE_URL", "postgres://db"),
            ("CHAT_API_KEY", "k"),
            ("SESSION_IDLE_SECS", "0"),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                name: "SESSION_IDLE_SECS",
                value: "0".to_string()
            }
        );

        let err = config(&[
            ("DATABASE_URL", "postgres://db"),
            ("CHAT_API_KEY", "k"),
            ("SESSION_IDLE_SECS", "soon"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "SESSION_IDLE_SECS", .. }));
    }
}
