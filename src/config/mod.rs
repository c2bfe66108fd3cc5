//! Configuration management

use crate::domain::session::CorrelationConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SessionConfig {
    pub use_x_correlation_header: bool,
    pub call: CallConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CallConfig {
    pub max_legs: usize,
    /// Milliseconds
    pub aggregation_timeout: i64,
    /// Milliseconds
    pub termination_timeout: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            use_x_correlation_header: true,
            call: CallConfig::default(),
        }
    }
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            max_legs: 10,
            aggregation_timeout: 60_000,
            termination_timeout: 10_000,
        }
    }
}

impl Config {
    /// Read `sipscope.toml` (optional) with `SIPSCOPE__*` environment
    /// overrides on top
    pub fn load() -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("sipscope").required(false))
            .add_source(config::Environment::with_prefix("SIPSCOPE").separator("__"))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}

impl SessionConfig {
    pub fn correlation(&self) -> CorrelationConfig {
        CorrelationConfig {
            aggregation_timeout: self.call.aggregation_timeout,
            termination_timeout: self.call.termination_timeout,
            max_legs: self.call.max_legs,
            use_x_correlation_header: self.use_x_correlation_header,
        }
    }
}
