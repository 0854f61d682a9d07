use tracing::{debug, info};

use crate::config::types::ServerConfig;
use crate::config::validation::validate_config;
use crate::server::listener::BindTarget;
use crate::server::web_server::{WebServer, WebServerOptions};
use crate::server::{ServerError, ServerResult};

impl TryFrom<&ServerConfig> for WebServerOptions {
    type Error = ServerError;

    fn try_from(config: &ServerConfig) -> ServerResult<Self> {
        validate_config(config).map_err(|e| ServerError::Config(e.to_string()))?;

        Ok(Self {
            default_target: BindTarget::new(config.host.clone(), config.port)?,
            placeholder_html: config.placeholder_html.clone(),
            worker_threads: config.worker_threads as usize,
            bind_timeout: config.bind_timeout(),
            shutdown_timeout: config.shutdown_timeout(),
            connection_grace: config.connection_grace(),
        })
    }
}

/// 伺服器構建器
pub struct WebServerBuilder {
    server_config: Option<ServerConfig>,
    placeholder_html: Option<String>,
}

impl WebServerBuilder {
    /// 創建新的伺服器構建器
    pub fn new() -> Self {
        Self {
            server_config: None,
            placeholder_html: None,
        }
    }

    /// 設置伺服器配置
    pub fn with_server_config(mut self, config: ServerConfig) -> Self {
        self.server_config = Some(config);
        self
    }

    /// 覆寫配置中的佔位內容
    pub fn with_placeholder_html(mut self, html: impl Into<String>) -> Self {
        self.placeholder_html = Some(html.into());
        self
    }

    /// 構建選項，未提供配置時使用預設配置
    pub fn build_options(self) -> ServerResult<WebServerOptions> {
        let server_config = self.server_config.unwrap_or_else(|| {
            debug!("未提供伺服器配置，使用預設值");
            ServerConfig::default()
        });

        let mut options = WebServerOptions::try_from(&server_config)?;
        if let Some(html) = self.placeholder_html {
            options.placeholder_html = html;
        }

        Ok(options)
    }

    /// 構建並返回伺服器實例（尚未綁定）
    pub fn build(self) -> ServerResult<WebServer> {
        let options = self.build_options()?;
        info!("構建伺服器實例，預設綁定目標 {}", options.default_target);
        Ok(WebServer::with_options(options))
    }
}

impl Default for WebServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::ServerState;
    use assert_matches::assert_matches;
    use std::time::Duration;

    #[test]
    fn test_build_from_config() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 9100,
            worker_threads: 1,
            bind_timeout_ms: 250,
            shutdown_timeout_ms: 500,
            connection_grace_ms: 200,
            placeholder_html: "waiting".to_string(),
        };

        let server = WebServerBuilder::new()
            .with_server_config(config)
            .build()
            .unwrap();

        let options = server.options();
        assert_eq!(options.default_target.to_string(), "127.0.0.1:9100");
        assert_eq!(options.worker_threads, 1);
        assert_eq!(options.bind_timeout, Duration::from_millis(250));
        assert_eq!(options.shutdown_timeout, Duration::from_millis(500));
        assert_eq!(options.connection_grace, Duration::from_millis(200));
        assert_eq!(&*server.content(), "waiting");
        assert_eq!(server.state(), ServerState::Stopped);
    }

    #[test]
    fn test_placeholder_override() {
        let options = WebServerBuilder::default()
            .with_placeholder_html("")
            .build_options()
            .unwrap();

        assert_eq!(options.placeholder_html, "");
        assert_eq!(options.default_target, BindTarget::default());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = ServerConfig {
            worker_threads: 0,
            ..ServerConfig::default()
        };

        let result = WebServerBuilder::new().with_server_config(config).build();
        assert_matches!(result, Err(ServerError::Config(_)));
    }

    #[test]
    fn test_grace_longer_than_shutdown_timeout_is_rejected() {
        let config = ServerConfig {
            shutdown_timeout_ms: 1_000,
            connection_grace_ms: 5_000,
            ..ServerConfig::default()
        };

        let result = WebServerOptions::try_from(&config);
        assert_matches!(result, Err(ServerError::Config(msg)) if msg.contains("connection_grace_ms"));
    }
}
