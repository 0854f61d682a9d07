// 模組定義
pub mod config;
pub mod render;
pub mod server;

pub use render::{ChartPage, ContentProducer, RenderError};
pub use server::{ServerError, ServerResult, ServerState, ServerStatus, WebServer};
