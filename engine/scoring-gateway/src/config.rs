//! Gateway configuration management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use valuation_engine::ValuationConfig;

/// Main configuration for the ScoringGateway
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Seed data locations
    pub data: DataConfig,

    /// Valuation model and scoring thresholds
    pub valuation: ValuationConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty)
    pub format: String,
}

/// Where the players snapshot and leagues are loaded from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub players_file: PathBuf,
    pub leagues_file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 8082 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "pretty".to_string() }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            players_file: PathBuf::from("data/players/snapshot.json"),
            leagues_file: Some(PathBuf::from("data/leagues/leagues.json")),
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid bind address: {}:{}", self.host, self.port))
    }
}

impl GatewayConfig {
    /// Load configuration from a TOML file; missing keys keep their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!("Loading configuration from file: {:?}", path);

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Override with environment variables
    pub fn apply_env(&mut self) {
        if let Ok(host) = std::env::var("SCORING_HOST") {
            self.server.host = host;
        }

        if let Ok(port) = std::env::var("SCORING_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid SCORING_PORT: {}", port),
            }
        }

        if let Ok(level) = std::env::var("SCORING_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(format) = std::env::var("SCORING_LOG_FORMAT") {
            self.logging.format = format;
        }

        if let Ok(players_file) = std::env::var("SCORING_PLAYERS_FILE") {
            self.data.players_file = PathBuf::from(players_file);
        }

        if let Ok(leagues_file) = std::env::var("SCORING_LEAGUES_FILE") {
            self.data.leagues_file = Some(PathBuf::from(leagues_file));
        }

        self.valuation.apply_env();
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => return Err(anyhow::anyhow!("Invalid log level: {}", self.logging.level)),
        }

        match self.logging.format.as_str() {
            "json" | "pretty" => {}
            _ => return Err(anyhow::anyhow!("Invalid log format: {}", self.logging.format)),
        }

        if self.server.port == 0 {
            return Err(anyhow::anyhow!("Invalid server port: {}", self.server.port));
        }
        self.server.socket_addr()?;

        self.valuation.validate()
    }
}

/// Load configuration from an optional file and environment variables
pub fn load_config(config_file: Option<&Path>) -> Result<GatewayConfig> {
    let mut config = match config_file {
        Some(path) => GatewayConfig::from_file(path)?,
        None => GatewayConfig::default(),
    };

    config.apply_env();
    config.validate()?;

    Ok(config)
}
