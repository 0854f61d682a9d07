use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::render::ContentProducer;
use crate::server::content::SharedContent;
use crate::server::listener::{build_router, BindTarget, ListenerHandle};
use crate::server::{ServerResult, ServerState};

/// 預設佔位內容，在呼叫端提供任何內容之前回應
pub const DEFAULT_PLACEHOLDER_HTML: &str = "This is a chart server instance!";

/// 伺服器選項
#[derive(Debug, Clone)]
pub struct WebServerOptions {
    /// `ensure_started_default` 使用的綁定目標
    pub default_target: BindTarget,
    /// 初始內容
    pub placeholder_html: String,
    /// 監聽執行緒內的工作執行緒數
    pub worker_threads: usize,
    /// 等待綁定結果的上限
    pub bind_timeout: Duration,
    /// 等待監聽執行緒結束的上限
    pub shutdown_timeout: Duration,
    /// 關閉時等待進行中連線的時間，逾時後強制關閉，應短於 `shutdown_timeout`
    pub connection_grace: Duration,
}

impl Default for WebServerOptions {
    fn default() -> Self {
        Self {
            default_target: BindTarget::default(),
            placeholder_html: DEFAULT_PLACEHOLDER_HTML.to_string(),
            worker_threads: 2,
            bind_timeout: Duration::from_secs(5),
            shutdown_timeout: Duration::from_secs(10),
            connection_grace: Duration::from_secs(3),
        }
    }
}

/// 伺服器狀態快照
#[derive(Debug, Clone, Serialize)]
pub struct ServerStatus {
    pub state: ServerState,
    /// 啟動時採用的綁定目標
    pub target: Option<BindTarget>,
    /// 實際綁定的位址
    pub local_addr: Option<SocketAddr>,
    pub route_registered: bool,
    pub content_length: usize,
}

#[derive(Debug, Default)]
struct Inner {
    router: Option<Router>,
    listener: Option<ListenerHandle>,
}

/// 管理單一 HTTP 監聽執行緒的伺服器
///
/// 同一時間最多只有一個監聽執行緒。啟動、停止由內部互斥鎖串行化，
/// 內容更新不經過該鎖，只替換共享內容。
///
/// ```no_run
/// use chart_server::server::WebServer;
///
/// let server = WebServer::new();
/// server.ensure_started("<p>A</p>", "127.0.0.1", 8081)?;
/// server.update_content("<p>B</p>");
/// server.stop()?;
/// # Ok::<(), chart_server::server::ServerError>(())
/// ```
#[derive(Debug)]
pub struct WebServer {
    options: WebServerOptions,
    content: SharedContent,
    inner: Mutex<Inner>,
}

impl WebServer {
    /// 以預設選項建立伺服器（不會立即綁定）
    pub fn new() -> Self {
        Self::with_options(WebServerOptions::default())
    }

    pub fn with_options(options: WebServerOptions) -> Self {
        let content = SharedContent::new(options.placeholder_html.as_str());
        Self {
            options,
            content,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// 確保伺服器在運行並設定內容
    ///
    /// 已在運行時只替換內容，`address`/`port` 被忽略；參數無效時返回
    /// `InvalidArgument` 且不改變任何狀態；綁定失敗返回 `BindFailed`，
    /// 伺服器保持停止、內容恢復原值。處於 `Stopping` 時先在 `shutdown_timeout`
    /// 內等待舊執行緒結束，仍未結束則返回 `ShutdownTimeout`，內容不變。
    pub fn ensure_started(
        &self,
        html: impl Into<Arc<str>>,
        address: &str,
        port: u16,
    ) -> ServerResult<ServerStatus> {
        let target = BindTarget::new(address, port)?;
        self.start_with_target(html.into(), target)
    }

    /// 以預設綁定目標呼叫 `ensure_started`
    pub fn ensure_started_default(&self, html: impl Into<Arc<str>>) -> ServerResult<ServerStatus> {
        self.start_with_target(html.into(), self.options.default_target.clone())
    }

    fn start_with_target(&self, html: Arc<str>, target: BindTarget) -> ServerResult<ServerStatus> {
        let mut inner = self.inner.lock();

        // 上次 stop 逾時留下的句柄：監聽 socket 已關閉，先完成 join 再重新綁定
        if let Some(listener) = inner.listener.as_mut().filter(|l| l.is_stopping()) {
            listener.shutdown(self.options.shutdown_timeout)?;
            info!("先前的監聽執行緒已結束: {}", listener.target());
            inner.listener = None;
            inner.router = None;
        }

        if let Some(listener) = inner.listener.as_ref() {
            if listener.target() != &target {
                warn!(
                    "伺服器已在 {} 運行，忽略綁定目標 {}",
                    listener.target(),
                    target
                );
            }
            self.content.replace(html);
            debug!("伺服器運行中，只更新內容 ({} bytes)", self.content.len());
            return Ok(self.status_locked(&inner));
        }

        let router = inner
            .router
            .get_or_insert_with(|| build_router(self.content.clone()))
            .clone();
        let previous = self.content.replace(Arc::clone(&html));

        match ListenerHandle::spawn(target.clone(), router, &self.options) {
            Ok(listener) => {
                info!("圖表伺服器已啟動: {} -> {}", target, listener.local_addr());
                inner.listener = Some(listener);
                Ok(self.status_locked(&inner))
            }
            Err(err) => {
                error!("圖表伺服器啟動失敗: {}", err);
                inner.router = None;
                self.content.replace_if_current(&html, previous);
                Err(err)
            }
        }
    }

    /// 整份替換回應內容
    pub fn update_content(&self, html: impl Into<Arc<str>>) {
        self.content.replace(html);
        debug!("內容已更新 ({} bytes)", self.content.len());
    }

    /// 渲染內容產生器並更新內容
    pub fn publish<P>(&self, producer: &P) -> ServerResult<()>
    where
        P: ContentProducer + ?Sized,
    {
        let html = producer.render_html()?;
        self.update_content(html);
        Ok(())
    }

    /// 停止監聽並 join 執行緒；未運行時為空操作
    ///
    /// 等待超過 `shutdown_timeout` 時返回 `ShutdownTimeout`，狀態變為 `Stopping`，
    /// 之後的 `stop` 或 `ensure_started` 會繼續等待。
    pub fn stop(&self) -> ServerResult<()> {
        let mut inner = self.inner.lock();

        let Some(listener) = inner.listener.as_mut() else {
            debug!("伺服器未運行，忽略停止請求");
            return Ok(());
        };

        let target = listener.target().clone();
        if let Err(err) = listener.shutdown(self.options.shutdown_timeout) {
            warn!("圖表伺服器未在期限內停止: {}: {}", target, err);
            return Err(err);
        }

        inner.listener = None;
        inner.router = None;
        info!("圖表伺服器已停止: {}", target);

        Ok(())
    }

    pub fn state(&self) -> ServerState {
        state_of(&self.inner.lock())
    }

    pub fn is_running(&self) -> bool {
        self.state() == ServerState::Running
    }

    pub fn status(&self) -> ServerStatus {
        let inner = self.inner.lock();
        self.status_locked(&inner)
    }

    /// 當前回應內容
    pub fn content(&self) -> Arc<str> {
        self.content.snapshot()
    }

    pub fn options(&self) -> &WebServerOptions {
        &self.options
    }

    fn status_locked(&self, inner: &Inner) -> ServerStatus {
        let listener = inner.listener.as_ref();
        ServerStatus {
            state: state_of(inner),
            target: listener.map(|l| l.target().clone()),
            local_addr: listener.map(ListenerHandle::local_addr),
            route_registered: inner.router.is_some(),
            content_length: self.content.len(),
        }
    }
}

fn state_of(inner: &Inner) -> ServerState {
    match inner.listener.as_ref() {
        Some(listener) if listener.is_stopping() => ServerState::Stopping,
        Some(_) => ServerState::Running,
        None => ServerState::Stopped,
    }
}

impl Default for WebServer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for WebServer {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            warn!("釋放伺服器時停止失敗: {}", err);
        }
    }
}
