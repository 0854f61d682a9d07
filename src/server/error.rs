use std::time::Duration;
use thiserror::Error;

use crate::config::ValidationError;
use crate::render::RenderError;

/// 伺服器錯誤類型
#[derive(Error, Debug)]
pub enum ServerError {
    /// 參數驗證失敗，狀態未改變
    #[error("無效參數: {0}")]
    InvalidArgument(String),

    /// 監聽執行緒無法綁定指定位址
    #[error("無法綁定 {address}: {source}")]
    BindFailed {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// 監聽執行緒未在期限內結束
    #[error("監聽執行緒未在 {0:?} 內結束")]
    ShutdownTimeout(Duration),

    /// 執行器建立等運行時錯誤
    #[error("運行時錯誤: {0}")]
    Runtime(String),

    /// IO 錯誤
    #[error("IO 錯誤: {0}")]
    Io(#[from] std::io::Error),

    /// 內容渲染錯誤
    #[error("內容渲染錯誤: {0}")]
    Render(#[from] RenderError),

    /// 配置錯誤
    #[error("配置錯誤: {0}")]
    Config(String),
}

impl From<ValidationError> for ServerError {
    fn from(err: ValidationError) -> Self {
        ServerError::InvalidArgument(err.to_string())
    }
}

/// 伺服器結果類型別名
pub type ServerResult<T> = Result<T, ServerError>;
