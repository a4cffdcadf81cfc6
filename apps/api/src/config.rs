use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

use crate::screening::limits::ScreeningLimits;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Required environment variable '{0}' is not set")]
    Missing(&'static str),

    #[error("Invalid value for '{key}': {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Application configuration loaded from environment variables.
/// Fails at startup if a required variable is missing or a limit is inconsistent.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: SecretString,
    /// When set, email and phone are hashed before records are persisted.
    pub hash_salt: Option<SecretString>,
    pub data_dir: PathBuf,
    pub limits: ScreeningLimits,
    /// Per-attempt HTTP timeout for the generation backend.
    pub generation_timeout: Duration,
    /// Bound on one whole generation call, retry included.
    pub generation_deadline: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);
        let defaults = ScreeningLimits::default();

        let limits = ScreeningLimits {
            max_tech_stack_size: env.parse_or("MAX_TECH_STACK_SIZE", defaults.max_tech_stack_size)?,
            max_questions_total: env.parse_or("MAX_QUESTIONS_TOTAL", defaults.max_questions_total)?,
            questions_per_tech: env.parse_or("QUESTIONS_PER_TECH_MIN", *defaults.questions_per_tech.start())?
                ..=env.parse_or("QUESTIONS_PER_TECH_MAX", *defaults.questions_per_tech.end())?,
            phone_digits: env.parse_or("PHONE_DIGITS_MIN", *defaults.phone_digits.start())?
                ..=env.parse_or("PHONE_DIGITS_MAX", *defaults.phone_digits.end())?,
            max_role_suggestions: env.parse_or("MAX_ROLE_SUGGESTIONS", defaults.max_role_suggestions)?,
            exit_keywords: match env.get("EXIT_KEYWORDS") {
                Some(raw) => raw
                    .split(',')
                    .map(|k| k.trim().to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect(),
                None => defaults.exit_keywords,
            },
        };
        check_limits(&limits)?;

        let generation_timeout = Duration::from_secs(env.parse_or("GENERATION_TIMEOUT_SECS", 30)?);
        let generation_deadline = Duration::from_secs(env.parse_or("GENERATION_DEADLINE_SECS", 90)?);
        if generation_timeout.is_zero() {
            return Err(invalid("GENERATION_TIMEOUT_SECS", "must be at least 1"));
        }
        if generation_deadline < generation_timeout {
            return Err(invalid(
                "GENERATION_DEADLINE_SECS",
                "must not be shorter than GENERATION_TIMEOUT_SECS",
            ));
        }

        Ok(Config {
            anthropic_api_key: SecretString::new(env.require("ANTHROPIC_API_KEY")?),
            hash_salt: env.get("HASH_SALT").map(SecretString::new),
            data_dir: env.get("DATA_DIR").unwrap_or_else(|| "data".to_string()).into(),
            limits,
            generation_timeout,
            generation_deadline,
            port: env.parse_or("PORT", 8080)?,
            rust_log: env.get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn check_limits(limits: &ScreeningLimits) -> Result<(), ConfigError> {
    let (min, max) = (*limits.questions_per_tech.start(), *limits.questions_per_tech.end());
    if min == 0 || min > max {
        return Err(invalid(
            "QUESTIONS_PER_TECH_MIN",
            format!("need 1 <= min <= max, got {min}..={max}"),
        ));
    }
    if limits.max_questions_total < min {
        return Err(invalid(
            "MAX_QUESTIONS_TOTAL",
            format!("must be at least QUESTIONS_PER_TECH_MIN ({min})"),
        ));
    }
    if limits.phone_digits.is_empty() {
        return Err(invalid("PHONE_DIGITS_MIN", "must not exceed PHONE_DIGITS_MAX"));
    }
    if limits.max_tech_stack_size == 0 {
        return Err(invalid("MAX_TECH_STACK_SIZE", "must be at least 1"));
    }
    if limits.max_role_suggestions == 0 {
        return Err(invalid("MAX_ROLE_SUGGESTIONS", "must be at least 1"));
    }
    if limits.exit_keywords.is_empty() {
        return Err(invalid("EXIT_KEYWORDS", "at least one keyword is required"));
    }
    Ok(())
}

fn invalid(key: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key,
        reason: reason.into(),
    }
}

/// Lookup wrapper; blank values count as unset.
struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn require(&self, key: &'static str) -> Result<String, ConfigError> {
        self.get(key).ok_or(ConfigError::Missing(key))
    }

    fn parse_or<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|e: T::Err| invalid(key, format!("'{raw}': {e}"))),
            None => Ok(default),
        }
    }
}
