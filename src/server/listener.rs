use std::fmt;
use std::future::IntoFuture;
use std::io;
use std::net::SocketAddr;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use serde::Serialize;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::config::ValidationUtils;
use crate::server::content::SharedContent;
use crate::server::web_server::WebServerOptions;
use crate::server::{ServerError, ServerResult};

const LISTENER_THREAD_NAME: &str = "chart-server-listener";
const WORKER_THREAD_NAME: &str = "chart-server-worker";
// serve 結束後剩餘任務的收尾時間
const RUNTIME_SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// 監聽位址與端口
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BindTarget {
    address: String,
    port: u16,
}

impl BindTarget {
    /// 驗證並建立綁定目標，端口必須在 1..=65535
    pub fn new(address: impl Into<String>, port: u16) -> ServerResult<Self> {
        let address = address.into();
        ValidationUtils::not_empty(&address, "address")?;
        ValidationUtils::no_whitespace(&address, "address")?;
        ValidationUtils::in_range(port, 1, 65535, "port")?;

        Ok(Self { address, port })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Default for BindTarget {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl fmt::Display for BindTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.address.contains(':') {
            write!(f, "[{}]:{}", self.address, self.port)
        } else {
            write!(f, "{}:{}", self.address, self.port)
        }
    }
}

/// 建立只有 `GET /` 的路由，每次請求讀取共享內容
pub(crate) fn build_router(content: SharedContent) -> Router {
    Router::new()
        .route("/", get(serve_content))
        .with_state(content)
        .layer(TraceLayer::new_for_http())
}

async fn serve_content(State(content): State<SharedContent>) -> Html<String> {
    Html(content.snapshot().to_string())
}

/// 正在運行的監聽執行緒
///
/// 持有可 join 的執行緒句柄與關閉訊號；`shutdown` 之後即可在同一端口重新綁定。
/// 關閉訊號一旦發出，監聽 socket 即被丟棄，句柄只剩等待執行緒結束的用途。
#[derive(Debug)]
pub(crate) struct ListenerHandle {
    target: BindTarget,
    local_addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    exit_rx: mpsc::Receiver<()>,
    thread: Option<JoinHandle<()>>,
    stop_requested: bool,
}

impl ListenerHandle {
    /// 啟動監聽執行緒並等待綁定結果
    pub(crate) fn spawn(
        target: BindTarget,
        router: Router,
        options: &WebServerOptions,
    ) -> ServerResult<Self> {
        let (ready_tx, ready_rx) = mpsc::channel::<ServerResult<SocketAddr>>();
        let (exit_tx, exit_rx) = mpsc::channel::<()>();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let thread_target = target.clone();
        let worker_threads = options.worker_threads;
        let connection_grace = options.connection_grace;
        let thread = thread::Builder::new()
            .name(LISTENER_THREAD_NAME.to_string())
            .spawn(move || {
                run_listener(
                    thread_target,
                    router,
                    worker_threads,
                    connection_grace,
                    ready_tx,
                    shutdown_rx,
                );
                let _ = exit_tx.send(());
            })?;

        match ready_rx.recv_timeout(options.bind_timeout) {
            Ok(Ok(local_addr)) => Ok(Self {
                target,
                local_addr,
                shutdown_tx,
                exit_rx,
                thread: Some(thread),
                stop_requested: false,
            }),
            Ok(Err(err)) => {
                join_listener(thread);
                Err(err)
            }
            Err(RecvTimeoutError::Timeout) => {
                // 關閉接收端後，監聽執行緒綁定完成時會發現無人等待而自行退出
                drop(ready_rx);
                let _ = shutdown_tx.send(true);
                match exit_rx.recv_timeout(options.bind_timeout) {
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => join_listener(thread),
                    Err(RecvTimeoutError::Timeout) => {
                        warn!("監聽執行緒仍在綁定 {}，不再等待，由其自行結束", target);
                        drop(thread);
                    }
                }
                Err(ServerError::BindFailed {
                    address: target.to_string(),
                    source: io::Error::new(
                        io::ErrorKind::TimedOut,
                        format!("未在 {:?} 內完成綁定", options.bind_timeout),
                    ),
                })
            }
            Err(RecvTimeoutError::Disconnected) => {
                join_listener(thread);
                Err(ServerError::Runtime("監聽執行緒在回報綁定結果前結束".to_string()))
            }
        }
    }

    pub(crate) fn target(&self) -> &BindTarget {
        &self.target
    }

    pub(crate) fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// 是否已發出關閉訊號但執行緒尚未 join
    pub(crate) fn is_stopping(&self) -> bool {
        self.stop_requested && self.thread.is_some()
    }

    /// 發出關閉訊號，在期限內等待執行緒結束並 join
    ///
    /// 逾時返回 `ShutdownTimeout`，句柄保持可用，可再次呼叫繼續等待。
    /// 執行緒在 `connection_grace` 之後會強制關閉剩餘連線，所以重試終究會成功。
    pub(crate) fn shutdown(&mut self, timeout: Duration) -> ServerResult<()> {
        let Some(thread) = self.thread.take() else {
            return Ok(());
        };

        // 接收端已經不存在代表執行緒已結束，忽略發送失敗
        let _ = self.shutdown_tx.send(true);
        self.stop_requested = true;

        match self.exit_rx.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                join_listener(thread);
                Ok(())
            }
            Err(RecvTimeoutError::Timeout) => {
                self.thread = Some(thread);
                Err(ServerError::ShutdownTimeout(timeout))
            }
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        if self.thread.is_some() {
            let _ = self.shutdown_tx.send(true);
        }
    }
}

fn join_listener(thread: JoinHandle<()>) {
    if thread.join().is_err() {
        warn!("監聽執行緒異常結束，視為已停止");
    }
}

fn run_listener(
    target: BindTarget,
    router: Router,
    worker_threads: usize,
    connection_grace: Duration,
    ready_tx: mpsc::Sender<ServerResult<SocketAddr>>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .thread_name(WORKER_THREAD_NAME)
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            let _ = ready_tx.send(Err(ServerError::Runtime(format!("無法建立執行器: {}", err))));
            return;
        }
    };

    runtime.block_on(async move {
        let listener = match tokio::net::TcpListener::bind((target.address(), target.port())).await {
            Ok(listener) => listener,
            Err(err) => {
                let _ = ready_tx.send(Err(ServerError::BindFailed {
                    address: target.to_string(),
                    source: err,
                }));
                return;
            }
        };

        let local_addr = match listener.local_addr() {
            Ok(addr) => addr,
            Err(err) => {
                let _ = ready_tx.send(Err(ServerError::Io(err)));
                return;
            }
        };

        if ready_tx.send(Ok(local_addr)).is_err() {
            debug!("啟動端已放棄等待，不開始服務: {}", local_addr);
            return;
        }

        info!("圖表伺服器開始監聽: http://{}", local_addr);

        let mut graceful_rx = shutdown_rx.clone();
        let serve = axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                // 發送端被丟棄同樣視為關閉
                let _ = graceful_rx.wait_for(|stop| *stop).await;
                debug!("收到關閉訊號");
            })
            .into_future();
        let force_close = async move {
            let _ = shutdown_rx.wait_for(|stop| *stop).await;
            tokio::time::sleep(connection_grace).await;
        };

        tokio::select! {
            result = serve => match result {
                Ok(()) => info!("圖表伺服器已停止監聽: {}", local_addr),
                Err(err) => error!("圖表伺服器運行錯誤: {}", err),
            },
            () = force_close => {
                // 監聽 socket 隨 serve 一起丟棄，連線任務在執行器關閉時被取消
                warn!(
                    "仍有連線未在 {:?} 內結束，強制關閉: {}",
                    connection_grace, local_addr
                );
            }
        }
    });

    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_GRACE);
}
