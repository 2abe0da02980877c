//! Configuration value types. Mirrors the key table in the external
//! interfaces contract one-to-one.

use serde::{Deserialize, Serialize};

fn default_mode() -> String {
    "mock".to_string()
}

fn default_log_file_path() -> String {
    "logs/engine.log".to_string()
}

fn default_max_order_size() -> i64 {
    100
}

fn default_max_position_value_usd() -> f64 {
    10_000.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default = "default_log_file_path")]
    pub log_file_path: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            log_file_path: default_log_file_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskManagement {
    #[serde(default = "default_max_order_size")]
    pub max_order_size: i64,
    #[serde(default = "default_max_position_value_usd")]
    pub max_position_value_usd: f64,
}

impl Default for RiskManagement {
    fn default() -> Self {
        Self {
            max_order_size: default_max_order_size(),
            max_position_value_usd: default_max_position_value_usd(),
        }
    }
}

/// Both fields are required — no default binds a socket somewhere the
/// operator didn't choose.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptingConfig {
    pub publish_endpoint: String,
    pub subscribe_endpoint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine_settings: EngineSettings,
    #[serde(default)]
    pub risk_management: RiskManagement,
    #[serde(default)]
    pub market_data_subscriptions: Vec<String>,
    pub scripting: ScriptingConfig,
    /// Path to the mock CSV feed; only meaningful in `engine_settings.mode = "mock"`.
    #[serde(default = "default_mock_csv_path")]
    pub mock_csv_path: String,
}

fn default_mock_csv_path() -> String {
    "data/mock_ticks.csv".to_string()
}
