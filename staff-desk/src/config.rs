//! staff-desk configuration
//!
//! Resolution order: built-in defaults, then a JSON config file, then
//! environment variables (a `.env` file is loaded first via dotenvy).

use serde::{Deserialize, Serialize};
use shared::error::ErrorCode;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "STAFF_DESK_CONFIG";
/// Config file picked up from the working directory when present
pub const DEFAULT_CONFIG_FILE: &str = "staff-desk.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

impl ConfigError {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::ConfigError
    }
}

/// How passwords are written to the `users` table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PasswordPolicy {
    /// Argon2 PHC string with a random salt
    #[default]
    Argon2,
    /// Verbatim, for databases shared with older deployments
    Plaintext,
}

impl FromStr for PasswordPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "argon2" => Ok(Self::Argon2),
            "plaintext" | "plain" => Ok(Self::Plaintext),
            other => Err(format!("unknown password policy '{other}'")),
        }
    }
}

/// Database connection settings
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Location of the database server; for the embedded engine this is the
    /// directory holding the database files (`sqlite://<dir>` or a plain path)
    pub server_url: String,
    /// Database name; the file is `<server dir>/<database_name>.db`
    pub database_name: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub max_connections: u32,
    /// Upper bound for waiting on a pooled connection
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            server_url: "sqlite://data".to_string(),
            database_name: "CSC311_BD_TEMP".to_string(),
            username: None,
            password: None,
            max_connections: 5,
            acquire_timeout_secs: 5,
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("server_url", &self.server_url)
            .field("database_name", &self.database_name)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .finish()
    }
}

impl DatabaseConfig {
    /// Directory that plays the role of the database server
    pub fn data_dir(&self) -> PathBuf {
        let raw = self.server_url.trim();
        let path = raw
            .strip_prefix("sqlite://")
            .or_else(|| raw.strip_prefix("sqlite:"))
            .unwrap_or(raw);
        PathBuf::from(path)
    }

    /// Full path of the database file
    pub fn database_path(&self) -> PathBuf {
        self.data_dir().join(format!("{}.db", self.database_name))
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub password_policy: PasswordPolicy,
    /// Where remembered credentials are persisted
    pub prefs_dir: PathBuf,
    /// Directory for `application.log`; `None` disables file logging
    pub log_dir: Option<PathBuf>,
    /// Default filter directive when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            password_policy: PasswordPolicy::default(),
            prefs_dir: PathBuf::from("data/prefs"),
            log_dir: Some(PathBuf::from("logs")),
            log_level: "warn,staff_desk=info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration: explicit path, else `STAFF_DESK_CONFIG`, else
    /// `staff-desk.json` when it exists; environment variables win last.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var(CONFIG_ENV).ok().map(PathBuf::from));

        let mut config = match explicit {
            Some(path) => Self::from_file(&path)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::from_file(default)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Read a JSON config file; missing keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply overrides from an environment-like lookup
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(v) = get("DB_SERVER_URL") {
            self.database.server_url = v;
        }
        if let Some(v) = get("DB_NAME") {
            self.database.database_name = v;
        }
        if let Some(v) = get("DB_USERNAME") {
            self.database.username = Some(v);
        }
        if let Some(v) = get("DB_PASSWORD") {
            self.database.password = Some(v);
        }
        if let Some(v) = get("DB_MAX_CONNECTIONS") {
            self.database.max_connections = parse_number("DB_MAX_CONNECTIONS", &v)?;
        }
        if let Some(v) = get("DB_ACQUIRE_TIMEOUT_SECS") {
            self.database.acquire_timeout_secs = parse_number("DB_ACQUIRE_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("PASSWORD_POLICY") {
            self.password_policy = v.parse().map_err(|_| ConfigError::InvalidValue {
                key: "PASSWORD_POLICY",
                value: v.clone(),
            })?;
        }
        if let Some(v) = get("PREFS_DIR") {
            self.prefs_dir = PathBuf::from(v);
        }
        if let Some(v) = get("LOG_DIR") {
            self.log_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = get("LOG_LEVEL") {
            self.log_level = v;
        }
        Ok(())
    }
}

fn parse_number<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}
