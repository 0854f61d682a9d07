// server.rs - 伺服器核心組件，宣告子模組
//
// 伺服器模組管理唯一的 HTTP 監聽執行緒，實現：
// - 監聽執行緒的啟動、停止與重新啟動
// - 不重新綁定端口的內容替換
// - 全域單例與可注入的伺服器句柄

/// 伺服器構建器實現
pub mod builder;
/// 共享回應內容
pub mod content;
/// 伺服器級別錯誤處理
pub mod error;
/// 進程級單例
pub mod global;
/// 監聽執行緒與路由
pub mod listener;
/// 伺服器句柄
pub mod web_server;

use serde::Serialize;

// 重新導出核心組件，簡化外部使用
pub use crate::config::types::ServerConfig;
pub use builder::WebServerBuilder;
pub use content::SharedContent;
pub use error::{ServerError, ServerResult};
pub use listener::BindTarget;
pub use web_server::{ServerStatus, WebServer, WebServerOptions, DEFAULT_PLACEHOLDER_HTML};

/// 伺服器狀態枚舉
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerState {
    /// 伺服器正在運行
    Running,
    /// 已發出關閉訊號，監聽執行緒尚未結束；不再接受連線
    Stopping,
    /// 伺服器已停止
    Stopped,
}
