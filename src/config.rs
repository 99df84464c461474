//! Configuration management for the crashlab service.
//!
//! TOML file plus environment variable overrides (`CRASHLAB_*`), with
//! validation of the final values before anything starts ticking.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Tunables for the simulation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Exponential growth rate `k` in `e^(k*t)`.
    pub growth_rate: f64,
    /// Lowest crash point a round can draw.
    pub min_crash_point: f64,
    /// Pause between a crash and the next biddable round.
    pub cooldown_ms: u64,
    /// How long the celebration flag stays armed unless retriggered.
    pub celebration_ms: u64,
    /// Crash points kept for display.
    pub history_capacity: usize,
    /// Balance every new session starts with.
    pub starting_balance: f64,
    /// Driver tick interval. 16ms matches a 60Hz display frame.
    pub tick_interval_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            growth_rate: 0.12,
            min_crash_point: 1.10,
            cooldown_ms: 3_000,
            celebration_ms: 800,
            history_capacity: 8,
            starting_balance: 1_000.0,
            tick_interval_ms: 16,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origins: vec!["*".to_string()],
            request_timeout_secs: 30,
        }
    }
}

/// Configuration loader with environment variable support.
pub struct ConfigLoader {
    config_path: Option<String>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_string_lossy().to_string());
        self
    }

    /// Load configuration from file and environment variables.
    pub fn load(&self) -> Result<Config, ConfigError> {
        let mut config = if let Some(ref path) = self.config_path {
            self.load_from_file(path)?
        } else {
            Config::default()
        };

        self.apply_env_overrides(&mut config)?;
        self.validate(&config)?;

        Ok(config)
    }

    fn load_from_file(&self, path: &str) -> Result<Config, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadFailed(format!("failed to read {}: {}", path, e)))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::LoadFailed(format!("failed to parse TOML: {}", e)))
    }

    fn apply_env_overrides(&self, config: &mut Config) -> Result<(), ConfigError> {
        if let Ok(host) = env::var("CRASHLAB_HOST") {
            config.server.host = host;
        }
        if let Ok(port) = env::var("CRASHLAB_PORT") {
            config.server.port = port.parse().map_err(|_| ConfigError::InvalidValue {
                field: "CRASHLAB_PORT".to_string(),
                value: port,
                reason: "invalid port number".to_string(),
            })?;
        }
        if let Ok(rate) = env::var("CRASHLAB_GROWTH_RATE") {
            config.engine.growth_rate = rate.parse().map_err(|_| ConfigError::InvalidValue {
                field: "CRASHLAB_GROWTH_RATE".to_string(),
                value: rate,
                reason: "invalid growth rate".to_string(),
            })?;
        }
        if let Ok(balance) = env::var("CRASHLAB_STARTING_BALANCE") {
            config.engine.starting_balance =
                balance.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "CRASHLAB_STARTING_BALANCE".to_string(),
                    value: balance,
                    reason: "invalid balance".to_string(),
                })?;
        }
        if let Ok(tick) = env::var("CRASHLAB_TICK_INTERVAL_MS") {
            config.engine.tick_interval_ms =
                tick.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "CRASHLAB_TICK_INTERVAL_MS".to_string(),
                    value: tick,
                    reason: "invalid interval".to_string(),
                })?;
        }
        Ok(())
    }

    fn validate(&self, config: &Config) -> Result<(), ConfigError> {
        let engine = &config.engine;

        if engine.growth_rate <= 0.0 || !engine.growth_rate.is_finite() {
            return Err(ConfigError::InvalidValue {
                field: "engine.growth_rate".to_string(),
                value: engine.growth_rate.to_string(),
                reason: "must be a positive finite number".to_string(),
            });
        }
        if engine.min_crash_point <= 1.0 {
            // A floor at or below 1.00 allows zero-duration rounds.
            return Err(ConfigError::InvalidValue {
                field: "engine.min_crash_point".to_string(),
                value: engine.min_crash_point.to_string(),
                reason: "must be greater than 1.0".to_string(),
            });
        }
        if engine.history_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "engine.history_capacity".to_string(),
                value: "0".to_string(),
                reason: "history capacity cannot be zero".to_string(),
            });
        }
        if engine.starting_balance < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "engine.starting_balance".to_string(),
                value: engine.starting_balance.to_string(),
                reason: "balance cannot be negative".to_string(),
            });
        }
        if engine.tick_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "engine.tick_interval_ms".to_string(),
                value: "0".to_string(),
                reason: "tick interval cannot be zero".to_string(),
            });
        }
        if config.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                value: "0".to_string(),
                reason: "port cannot be zero".to_string(),
            });
        }
        Ok(())
    }

    /// Save configuration to file.
    pub fn save(&self, config: &Config, path: &str) -> Result<(), ConfigError> {
        let toml_string = toml::to_string_pretty(config)
            .map_err(|e| ConfigError::SaveFailed(format!("failed to serialize config: {}", e)))?;

        std::fs::write(path, toml_string)
            .map_err(|e| ConfigError::SaveFailed(format!("failed to write to {}: {}", path, e)))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
