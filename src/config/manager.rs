use once_cell::sync::OnceCell;
use config::ConfigError;
use tracing::{warn, debug};
use crate::config::types::ApplicationConfig;
use crate::config::loader::{ConfigLoader, Environment};
use crate::config::validation::validate_config;

// 全局配置實例
static CONFIG: OnceCell<ApplicationConfig> = OnceCell::new();

/// 獲取應用程序配置實例；加載失敗時退回預設配置
pub fn get_config() -> &'static ApplicationConfig {
    CONFIG.get_or_init(|| {
        ApplicationConfig::load_from_env().unwrap_or_else(|err| {
            warn!("無法加載應用程序配置，使用預設值: {}", err);
            ApplicationConfig::default()
        })
    })
}

/// 初始化配置（在應用程序啟動時調用）
pub fn init_config() -> Result<&'static ApplicationConfig, ConfigError> {
    if let Some(existing) = CONFIG.get() {
        warn!("配置已經被初始化，跳過重複初始化");
        return Ok(existing);
    }

    let app_config = ApplicationConfig::load_from_env()?;
    if CONFIG.set(app_config).is_err() {
        warn!("配置已經被初始化，跳過重複初始化");
    } else {
        debug!("配置初始化成功，環境：{:?}", Environment::from_env());
    }

    Ok(get_config())
}

/// ApplicationConfig 加載方法實現
impl ApplicationConfig {
    /// 從環境變數指定的環境加載配置
    pub fn load_from_env() -> Result<Self, ConfigError> {
        let env = Environment::from_env();
        debug!("從環境加載配置: {:?}", env);
        Self::load(env)
    }

    /// 從指定環境加載配置，驗證失敗視為錯誤
    pub fn load(env: Environment) -> Result<Self, ConfigError> {
        let config_source = ConfigLoader::load(env)?;
        let app_config: ApplicationConfig = config_source.try_deserialize()?;

        validate_config(&app_config).map_err(|err| ConfigError::Message(err.to_string()))?;
        debug!("配置驗證通過");

        Ok(app_config)
    }
}
