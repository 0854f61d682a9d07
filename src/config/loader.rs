use config::{Config, ConfigError, Environment as ConfigEnvironment, File};
use std::env;
use std::path::{Path, PathBuf};

use crate::config::types::ApplicationConfig;

/// 選擇配置環境的環境變數
pub const ENV_VAR: &str = "CHART_SERVER_ENV";
/// 覆寫配置目錄的環境變數
pub const CONFIG_DIR_VAR: &str = "CHART_SERVER_CONFIG_DIR";
/// 環境變數覆寫的前綴，例如 `CHART_SERVER__SERVER__PORT`
pub const ENV_PREFIX: &str = "CHART_SERVER";

/// 環境類型枚舉
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// 從環境變數取得當前環境設定
    pub fn from_env() -> Self {
        match env::var(ENV_VAR)
            .unwrap_or_else(|_| "development".into())
            .to_lowercase()
            .as_str()
        {
            "production" => Environment::Production,
            _ => Environment::Development,
        }
    }

    /// 轉換為配置文件名
    pub fn as_filename(&self) -> &'static str {
        match self {
            Environment::Development => "development.toml",
            Environment::Production => "production.toml",
        }
    }
}

/// 配置加載器，依序疊加預設值、環境配置文件與環境變數
pub struct ConfigLoader;

impl ConfigLoader {
    /// 載入指定環境的配置
    pub fn load(env: Environment) -> Result<Config, ConfigError> {
        Self::load_from_dir(&Self::config_dir(), env)
    }

    /// 從指定目錄載入配置；文件不存在時只使用預設值與環境變數
    pub fn load_from_dir(config_dir: &Path, env: Environment) -> Result<Config, ConfigError> {
        let config_path = config_dir.join(env.as_filename());

        Config::builder()
            // 內建預設值
            .add_source(Config::try_from(&ApplicationConfig::default())?)
            // 環境特定配置（可選）
            .add_source(File::from(config_path).required(false))
            // 從環境變數加載配置（優先級高於文件配置）
            .add_source(
                ConfigEnvironment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
    }

    /// 載入當前環境的配置
    pub fn load_current() -> Result<Config, ConfigError> {
        Self::load(Environment::from_env())
    }

    fn config_dir() -> PathBuf {
        PathBuf::from(env::var(CONFIG_DIR_VAR).unwrap_or_else(|_| "config".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::ServerConfig;
    use serial_test::serial;
    use std::fs;

    #[test]
    #[serial]
    fn test_environment_from_env() {
        env::remove_var(ENV_VAR);
        assert_eq!(Environment::from_env(), Environment::Development);

        env::set_var(ENV_VAR, "Production");
        assert_eq!(Environment::from_env(), Environment::Production);

        env::set_var(ENV_VAR, "staging");
        assert_eq!(Environment::from_env(), Environment::Development);

        // 清理環境變數
        env::remove_var(ENV_VAR);
    }

    #[test]
    fn test_environment_as_filename() {
        assert_eq!(Environment::Development.as_filename(), "development.toml");
        assert_eq!(Environment::Production.as_filename(), "production.toml");
    }

    #[test]
    #[serial]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigLoader::load_from_dir(dir.path(), Environment::Production).unwrap();

        let server: ServerConfig = config.get("server").unwrap();
        assert_eq!(server.port, 8080);
        assert_eq!(server.host, "0.0.0.0");
    }

    #[test]
    #[serial]
    fn test_file_and_env_layers() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("development.toml"),
            "[server]\nhost = \"127.0.0.1\"\nport = 9001\n\n[log]\nlevel = \"debug\"\n",
        )
        .unwrap();

        env::set_var("CHART_SERVER__SERVER__WORKER_THREADS", "4");
        let config = ConfigLoader::load_from_dir(dir.path(), Environment::Development).unwrap();
        env::remove_var("CHART_SERVER__SERVER__WORKER_THREADS");

        let app: ApplicationConfig = config.try_deserialize().unwrap();
        assert_eq!(app.server.host, "127.0.0.1");
        assert_eq!(app.server.port, 9001);
        assert_eq!(app.server.worker_threads, 4);
        // 文件未覆寫的欄位保留預設值
        assert_eq!(app.server.shutdown_timeout_ms, 10_000);
        assert_eq!(app.log.level, "debug");
        assert_eq!(app.log.format, "pretty");
    }
}
