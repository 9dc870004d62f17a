//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `relayhub.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::time::Duration;

use relayhub_adapter_virtual::VirtualTransportConfig;
use relayhub_app::services::EngineSettings;
use relayhub_app::supervisor::SupervisorConfig;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Schedule monitor settings.
    pub automation: AutomationConfig,
    /// Connection supervision and delivery settings.
    pub transport: TransportConfig,
    /// Periodic resync and queue flushing.
    pub maintenance: MaintenanceConfig,
    /// Simulated transport settings.
    pub virtual_transport: VirtualTransportConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
    /// Relay channels registered at startup (initially off).
    pub relay_channels: Vec<u16>,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AutomationConfig {
    pub tick_interval_secs: u64,
    pub startup_delay_secs: u64,
    /// Who receives power-down notifications. Unset disables them.
    pub notify_recipient: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Delay before the first session is opened.
    pub init_delay_secs: u64,
    /// Reconnect attempt `n` waits `base_delay_secs * n`.
    pub base_delay_secs: u64,
    pub max_attempts: u32,
    pub restart_delay_secs: u64,
    pub send_timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MaintenanceConfig {
    pub interval_secs: u64,
    pub inter_message_delay_ms: u64,
    pub ready_settle_secs: u64,
}

impl Config {
    /// Load configuration from `relayhub.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if
    /// the resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("relayhub.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("RELAYHUB_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("RELAYHUB_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("RELAYHUB_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Ok(val) = std::env::var("RELAYHUB_DATABASE_URL") {
            self.database.url = val;
        }
        if let Ok(val) = std::env::var("RELAYHUB_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RELAYHUB_NOTIFY_RECIPIENT") {
            self.automation.notify_recipient = Some(val);
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.automation.tick_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "automation.tick_interval_secs must be non-zero".to_string(),
            ));
        }
        if self.maintenance.interval_secs == 0 {
            return Err(ConfigError::Validation(
                "maintenance.interval_secs must be non-zero".to_string(),
            ));
        }
        if self.transport.max_attempts == 0 {
            return Err(ConfigError::Validation(
                "transport.max_attempts must be non-zero".to_string(),
            ));
        }
        if self.transport.send_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "transport.send_timeout_secs must be non-zero".to_string(),
            ));
        }
        if self.database.relay_channels.contains(&0) {
            return Err(ConfigError::Validation(
                "database.relay_channels must not contain 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    /// Notification recipient, with a blank value treated as unset.
    #[must_use]
    pub fn notify_recipient(&self) -> Option<&str> {
        self.automation
            .notify_recipient
            .as_deref()
            .map(str::trim)
            .filter(|recipient| !recipient.is_empty())
    }

    /// Engine timings and recipient.
    #[must_use]
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            tick_interval: Duration::from_secs(self.automation.tick_interval_secs),
            startup_delay: Duration::from_secs(self.automation.startup_delay_secs),
            notify_recipient: self.notify_recipient().map(str::to_string),
            supervisor: SupervisorConfig {
                base_delay: Duration::from_secs(self.transport.base_delay_secs),
                max_attempts: self.transport.max_attempts,
                restart_delay: Duration::from_secs(self.transport.restart_delay_secs),
            },
            send_timeout: Duration::from_secs(self.transport.send_timeout_secs),
            maintenance_interval: Duration::from_secs(self.maintenance.interval_secs),
            inter_message_delay: Duration::from_millis(self.maintenance.inter_message_delay_ms),
            ready_settle: Duration::from_secs(self.maintenance.ready_settle_secs),
            transport_start_delay: Duration::from_secs(self.transport.init_delay_secs),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:relayhub.db?mode=rwc".to_string(),
            relay_channels: vec![1, 2, 3, 4],
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "relayhubd=info,relayhub=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 60,
            startup_delay_secs: 5,
            notify_recipient: None,
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            init_delay_secs: 2,
            base_delay_secs: 5,
            max_attempts: 5,
            restart_delay_secs: 3,
            send_timeout_secs: 45,
        }
    }
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            interval_secs: 15,
            inter_message_delay_ms: 2000,
            ready_settle_secs: 2,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
