//! 存储层配置
//!
//! 支持配置文件与环境变量分层覆盖（前缀 CLINIC，分隔符 __）。

use crate::transport::SimulatedTransport;
use clinic_core::{ClinicError, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 传输延迟配置（毫秒）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportSettings {
    pub fetch_ms: u64,
    pub lookup_ms: u64,
    pub login_ms: u64,
    pub mutate_ms: u64,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            fetch_ms: 800,
            lookup_ms: 500,
            login_ms: 1000,
            mutate_ms: 0,
        }
    }
}

impl TransportSettings {
    /// 按配置构建模拟传输
    pub fn build_transport(&self) -> SimulatedTransport {
        SimulatedTransport::new(
            Duration::from_millis(self.fetch_ms),
            Duration::from_millis(self.lookup_ms),
            Duration::from_millis(self.login_ms),
            Duration::from_millis(self.mutate_ms),
        )
    }
}

/// 存储层完整配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    /// 传输延迟配置
    pub transport: TransportSettings,
    /// 会话文件路径
    pub session_file: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            transport: TransportSettings::default(),
            session_file: "data/session.json".to_string(),
        }
    }
}

impl StoreSettings {
    /// 加载配置
    ///
    /// 默认值 < 配置文件 < 环境变量，层层覆盖。
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let defaults = Self::default();

        let mut builder = Config::builder()
            .set_default("transport.fetch_ms", defaults.transport.fetch_ms)
            .map_err(config_error)?
            .set_default("transport.lookup_ms", defaults.transport.lookup_ms)
            .map_err(config_error)?
            .set_default("transport.login_ms", defaults.transport.login_ms)
            .map_err(config_error)?
            .set_default("transport.mutate_ms", defaults.transport.mutate_ms)
            .map_err(config_error)?
            .set_default("session_file", defaults.session_file)
            .map_err(config_error)?;

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path));
        }

        builder = builder.add_source(Environment::with_prefix("CLINIC").separator("__"));

        let config = builder.build().map_err(config_error)?;
        config.try_deserialize().map_err(config_error)
    }
}

fn config_error(e: config::ConfigError) -> ClinicError {
    ClinicError::Config(e.to_string())
}
