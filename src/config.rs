// src/config.rs

use std::{env, fmt, str::FromStr};

use dotenvy::dotenv;

/// Questions drawn per session when `QUIZ_QUESTION_COUNT` is not set.
pub const DEFAULT_QUESTION_COUNT: i64 = 5;

/// Token lifetime in seconds when `JWT_EXPIRATION` is not set.
pub const DEFAULT_JWT_EXPIRATION: u64 = 3600;

/// Seconds an open session may go without activity when `QUIZ_SESSION_TTL_SECS`
/// is not set.
pub const DEFAULT_SESSION_IDLE_TTL: u64 = 7200;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Participant token lifetime, seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub port: u16,
    pub question_count: i64,
    /// Seconds a session may stay open. `None` means no limit.
    pub session_time_limit: Option<u64>,
    /// Seconds without activity after which an open session is dropped.
    pub session_idle_ttl: u64,
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid { key, value } => write!(f, "{} has an invalid value: {:?}", key, value),
        }
    }
}

impl std::error::Error for ConfigError {}

fn required(key: &'static str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::Missing(key))
}

fn parsed<T: FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value }),
        Err(_) => Ok(None),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET")?;

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let question_count = parsed::<i64>("QUIZ_QUESTION_COUNT")?.unwrap_or(DEFAULT_QUESTION_COUNT);
        if question_count < 1 {
            return Err(ConfigError::Invalid {
                key: "QUIZ_QUESTION_COUNT",
                value: question_count.to_string(),
            });
        }

        let session_idle_ttl =
            parsed::<u64>("QUIZ_SESSION_TTL_SECS")?.unwrap_or(DEFAULT_SESSION_IDLE_TTL);
        if session_idle_ttl == 0 {
            return Err(ConfigError::Invalid {
                key: "QUIZ_SESSION_TTL_SECS",
                value: session_idle_ttl.to_string(),
            });
        }

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_expiration: parsed("JWT_EXPIRATION")?.unwrap_or(DEFAULT_JWT_EXPIRATION),
            rust_log,
            port: parsed("PORT")?.unwrap_or(3000),
            question_count,
            session_time_limit: parsed("QUIZ_TIME_LIMIT_SECS")?,
            session_idle_ttl,
        })
    }
}
