use std::{env, path::PathBuf, str::FromStr};

use thiserror::Error;
use todo_observe::{LoggerConfig, LoggerFormat};

/// Signing secret used when `JWT_SECRET` is unset. Only fit for development.
pub const DEV_JWT_SECRET: &str = "todo-dev-secret-change-me";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load .env file: {0}")]
    EnvFile(String),

    #[error("invalid {key}={value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(key: &'static str, value: &str, reason: impl ToString) -> Self {
        ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Load `.env` from the working directory (or a parent) into the process environment.
///
/// Variables already set in the environment are not overridden. A missing file is not an error;
/// returns the path of the loaded file.
pub fn load_dotenv() -> Result<Option<PathBuf>, ConfigError> {
    match dotenvy::dotenv() {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(ConfigError::EnvFile(e.to_string())),
    }
}

/// Storage engine selected by `DB_BACKEND`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbBackend {
    Sqlite,
    Memory,
}

impl FromStr for DbBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(DbBackend::Sqlite),
            "memory" | "mem" => Ok(DbBackend::Memory),
            other => Err(format!("unknown backend '{other}' (expected: sqlite|memory)")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_backend: DbBackend,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub require_auth: bool,
    pub logger: LoggerConfig,
}

impl ServerConfig {
    /// Read the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match var("PORT") {
            Some(v) => v
                .trim()
                .parse::<u16>()
                .map_err(|e| ConfigError::invalid("PORT", &v, e))?,
            None => 3000,
        };
        let db_backend = match var("DB_BACKEND") {
            Some(v) => v
                .parse::<DbBackend>()
                .map_err(|e| ConfigError::invalid("DB_BACKEND", &v, e))?,
            None => DbBackend::Sqlite,
        };
        let require_auth = match var("REQUIRE_AUTH") {
            Some(v) => parse_bool(&v).ok_or_else(|| {
                ConfigError::invalid("REQUIRE_AUTH", &v, "expected true|false")
            })?,
            None => false,
        };

        let mut logger = LoggerConfig::default();
        if let Some(v) = var("LOG_FORMAT") {
            logger.format = v
                .parse::<LoggerFormat>()
                .map_err(|e| ConfigError::invalid("LOG_FORMAT", &v, e))?;
        }
        if let Some(v) = var("LOG_LEVEL") {
            logger.level = v;
        }

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            db_backend,
            db_path: var("DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./data/todo.db")),
            jwt_secret: var("JWT_SECRET").unwrap_or_else(|| DEV_JWT_SECRET.to_string()),
            require_auth,
            logger,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
