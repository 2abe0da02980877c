//! Layered configuration loading.
//!
//! Precedence, later overrides earlier: compile-time defaults (the `#[serde(default)]`
//! values in [`types`]) → a config file (JSON or TOML, `config/config.json` unless
//! overridden on the CLI) → environment variables prefixed `ENGINE__`, with `__`
//! as the nesting separator (e.g. `ENGINE__SCRIPTING__PUBLISH_ENDPOINT`).

pub mod types;

pub use types::{Config, EngineSettings, RiskManagement, ScriptingConfig};

use crate::core::EngineError;
use ::config::{Config as ConfigLoader, Environment, File};
use std::path::Path;

const DEFAULT_CONFIG_PATH: &str = "config/config.json";

impl Config {
    /// Load and validate configuration. `path` overrides the default location;
    /// when explicitly given and the file doesn't exist, this is `ConfigMissing`
    /// rather than silently falling through to defaults.
    pub fn load(path: Option<&str>) -> Result<Self, EngineError> {
        let config_path = path.unwrap_or(DEFAULT_CONFIG_PATH);

        if path.is_some() && !Path::new(config_path).exists() {
            return Err(EngineError::ConfigMissing {
                path: config_path.to_string(),
            });
        }

        let raw = ConfigLoader::builder()
            .add_source(File::with_name(config_path).required(false))
            .add_source(Environment::with_prefix("ENGINE").separator("__"))
            .build()
            .map_err(|e| EngineError::ConfigMalformed { reason: e.to_string() })?;

        let config: Config = raw
            .try_deserialize()
            .map_err(|e| EngineError::ConfigMalformed { reason: e.to_string() })?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.engine_settings.mode != "mock" && self.engine_settings.mode != "live" {
            return Err(EngineError::ConfigMalformed {
                reason: format!(
                    "engine_settings.mode must be \"mock\" or \"live\", got {:?}",
                    self.engine_settings.mode
                ),
            });
        }

        if self.scripting.publish_endpoint.trim().is_empty() {
            return Err(EngineError::ConfigMalformed {
                reason: "scripting.publish_endpoint must not be empty".to_string(),
            });
        }
        if self.scripting.subscribe_endpoint.trim().is_empty() {
            return Err(EngineError::ConfigMalformed {
                reason: "scripting.subscribe_endpoint must not be empty".to_string(),
            });
        }

        if self.risk_management.max_order_size <= 0 {
            return Err(EngineError::ConfigMalformed {
                reason: "risk_management.max_order_size must be positive".to_string(),
            });
        }
        if self.risk_management.max_position_value_usd <= 0.0 {
            return Err(EngineError::ConfigMalformed {
                reason: "risk_management.max_position_value_usd must be positive".to_string(),
            });
        }

        Ok(())
    }
}
