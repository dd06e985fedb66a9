use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Longest accepted store timeout, in seconds
const MAX_STORE_TIMEOUT_SECS: u64 = 300;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Which record store backs the resolver
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Empty in-memory store, populated programmatically
    Memory,
    /// In-memory store loaded from RFC 1035 master files
    #[default]
    ZoneFiles,
    /// SQLite `domains` / `records` tables
    Sqlite,
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(BackendKind::Memory),
            "zone_files" | "zonefiles" | "files" => Ok(BackendKind::ZoneFiles),
            "sqlite" => Ok(BackendKind::Sqlite),
            _ => Err(ConfigError::InvalidBackend(s.to_string())),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendKind::Memory => "memory",
            BackendKind::ZoneFiles => "zone_files",
            BackendKind::Sqlite => "sqlite",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Record store to open
    pub backend: BackendKind,

    /// Master files loaded by the `zone_files` backend
    pub zone_files: Vec<String>,

    /// Connection URL for the `sqlite` backend
    pub database_url: Option<String>,

    /// Size of the SQLite connection pool
    pub max_connections: u32,

    /// Bound on each store call, in seconds
    pub store_timeout: u64,

    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            zone_files: Vec::new(),
            database_url: None,
            max_connections: 5,
            store_timeout: 5,
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load a TOML file; missing keys keep their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Create a ServerConfig from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Overlay `APEXDNS_*` environment variables on this config
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    fn apply_vars<F>(&mut self, var: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(backend) = var("APEXDNS_BACKEND") {
            self.backend = backend.parse()?;
        }

        if let Some(files) = var("APEXDNS_ZONE_FILES") {
            self.zone_files = files
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }

        if let Some(url) = var("APEXDNS_DATABASE_URL") {
            self.database_url = Some(url);
        }

        if let Some(max_connections) = var("APEXDNS_MAX_CONNECTIONS") {
            self.max_connections = max_connections
                .parse::<u32>()
                .map_err(|_| ConfigError::InvalidConnections(max_connections.clone()))?;
        }

        if let Some(timeout_str) = var("APEXDNS_STORE_TIMEOUT") {
            self.store_timeout = timeout_str
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidTimeout(timeout_str.clone()))?;
        }

        if let Some(level) = var("APEXDNS_LOG_LEVEL") {
            self.log_level = level.to_lowercase();
        }

        self.validate()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store_timeout == 0 {
            return Err(ConfigError::InvalidTimeout(
                "Timeout must be greater than 0".to_string(),
            ));
        }
        if self.store_timeout > MAX_STORE_TIMEOUT_SECS {
            return Err(ConfigError::InvalidTimeout(
                "Timeout too large (max 300 seconds)".to_string(),
            ));
        }

        if self.max_connections == 0 {
            return Err(ConfigError::InvalidConnections(
                "Connection count must be greater than 0".to_string(),
            ));
        }

        if self.backend == BackendKind::Sqlite && self.database_url.is_none() {
            return Err(ConfigError::MissingDatabaseUrl);
        }

        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.log_level.clone()));
        }

        Ok(())
    }
}
