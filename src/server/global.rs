// 進程級伺服器單例
//
// 第一次使用時以預設選項建立，或由 `init_global` 以指定選項建立，之後存活到進程結束。

use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{debug, warn};

use crate::render::ContentProducer;
use crate::server::web_server::{ServerStatus, WebServer, WebServerOptions};
use crate::server::ServerResult;

static GLOBAL_SERVER: OnceCell<WebServer> = OnceCell::new();

/// 取得全域伺服器，必要時以預設選項建立
pub fn global() -> &'static WebServer {
    GLOBAL_SERVER.get_or_init(WebServer::new)
}

/// 以指定選項初始化全域伺服器；已初始化時忽略選項並返回現有實例
pub fn init_global(options: WebServerOptions) -> &'static WebServer {
    let mut options = Some(options);
    let server = GLOBAL_SERVER.get_or_init(|| {
        debug!("初始化全域伺服器");
        WebServer::with_options(options.take().unwrap_or_default())
    });

    if options.is_some() {
        warn!("全域伺服器已經初始化，忽略新的選項");
    }

    server
}

pub fn ensure_started(
    html: impl Into<Arc<str>>,
    address: &str,
    port: u16,
) -> ServerResult<ServerStatus> {
    global().ensure_started(html, address, port)
}

pub fn ensure_started_default(html: impl Into<Arc<str>>) -> ServerResult<ServerStatus> {
    global().ensure_started_default(html)
}

pub fn update_content(html: impl Into<Arc<str>>) {
    global().update_content(html)
}

pub fn publish<P>(producer: &P) -> ServerResult<()>
where
    P: ContentProducer + ?Sized,
{
    global().publish(producer)
}

pub fn stop() -> ServerResult<()> {
    global().stop()
}

pub fn status() -> ServerStatus {
    global().status()
}
