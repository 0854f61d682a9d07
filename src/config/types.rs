use serde::{Serialize, Deserialize};
use std::time::Duration;
use crate::config::validation::{ValidationError, ValidationUtils, Validator};

/// 應用程序配置結構
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    pub server: ServerConfig,
    pub log: LogConfig,
}

impl Validator for ApplicationConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.log.validate()?;

        Ok(())
    }
}

/// 伺服器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 預設綁定位址
    pub host: String,
    /// 預設綁定端口
    pub port: u16,
    /// 監聽執行緒內 tokio 執行器的工作執行緒數
    pub worker_threads: u32,
    /// 等待綁定結果的上限（毫秒）
    pub bind_timeout_ms: u64,
    /// 等待監聽執行緒結束的上限（毫秒）
    pub shutdown_timeout_ms: u64,
    /// 關閉時等待進行中連線的時間，之後強制關閉（毫秒）
    pub connection_grace_ms: u64,
    /// 尚未提供內容時回應的文字
    pub placeholder_html: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            worker_threads: 2,
            bind_timeout_ms: 5_000,
            shutdown_timeout_ms: 10_000,
            connection_grace_ms: 3_000,
            placeholder_html: "This is a chart server instance!".to_string(),
        }
    }
}

impl Validator for ServerConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        ValidationUtils::not_empty(&self.host, "server.host")?;
        ValidationUtils::in_range(self.port, 1, 65535, "server.port")?;
        ValidationUtils::in_range(self.worker_threads, 1, 64, "server.worker_threads")?;
        ValidationUtils::in_range(self.bind_timeout_ms, 10, 60_000, "server.bind_timeout_ms")?;
        ValidationUtils::in_range(
            self.shutdown_timeout_ms,
            10,
            300_000,
            "server.shutdown_timeout_ms",
        )?;
        // 寬限期必須短於關閉等待，否則 stop 總是逾時
        ValidationUtils::in_range(
            self.connection_grace_ms,
            0,
            self.shutdown_timeout_ms,
            "server.connection_grace_ms",
        )?;

        Ok(())
    }
}

impl ServerConfig {
    /// 綁定等待時間
    pub fn bind_timeout(&self) -> Duration {
        Duration::from_millis(self.bind_timeout_ms)
    }

    /// 關閉等待時間
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    /// 連線寬限期
    pub fn connection_grace(&self) -> Duration {
        Duration::from_millis(self.connection_grace_ms)
    }
}

/// 日誌配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Validator for LogConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        // 驗證日誌級別
        ValidationUtils::one_of(
            &self.level.to_lowercase(),
            &["trace", "debug", "info", "warn", "error"].iter().map(|s| s.to_string()).collect::<Vec<String>>(),
            "log.level"
        )?;

        // 驗證日誌格式
        ValidationUtils::one_of(
            &self.format.to_lowercase(),
            &["pretty", "json"].iter().map(|s| s.to_string()).collect::<Vec<String>>(),
            "log.format"
        )?;

        Ok(())
    }
}
