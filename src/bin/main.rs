use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::{anyhow, Context, Result};
use chart_server::config::{self, LogConfig};
use chart_server::server::{global, WebServer, WebServerOptions};
use chart_server::{ChartPage, ContentProducer};
use clap::{Args, Parser, Subcommand};
use tokio::io::AsyncReadExt;
use tokio::signal;
use tracing::level_filters::LevelFilter;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "chart_server", version, about = "在本機 HTTP 伺服器上提供圖表頁面")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 提供一個 HTML 文件
    Serve {
        /// HTML 文件路徑，`-` 表示標準輸入
        file: PathBuf,
        #[command(flatten)]
        listen: ListenArgs,
    },
    /// 把 Chart.js JSON 配置包成頁面後提供
    Chart {
        /// JSON 配置文件路徑，`-` 表示標準輸入
        config: PathBuf,
        /// 頁面標題
        #[arg(long)]
        title: Option<String>,
        #[command(flatten)]
        listen: ListenArgs,
    },
}

#[derive(Args)]
struct ListenArgs {
    /// 綁定位址，預設取自配置
    #[arg(long)]
    address: Option<String>,
    /// 綁定端口，預設取自配置
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    port: Option<u16>,
    /// 檢查輸入文件變更的間隔（毫秒），0 表示不檢查
    #[arg(long, default_value_t = 0)]
    watch_ms: u64,
}

/// 頁面來源
enum Source {
    Html(PathBuf),
    Chart { path: PathBuf, title: Option<String> },
}

impl Source {
    fn path(&self) -> &Path {
        match self {
            Source::Html(path) => path.as_path(),
            Source::Chart { path, .. } => path.as_path(),
        }
    }

    fn is_stdin(&self) -> bool {
        self.path() == Path::new("-")
    }

    async fn render(&self) -> Result<String> {
        match self {
            Source::Html(path) => read_input(path).await,
            Source::Chart { path, title } => {
                let text = read_input(path).await?;
                let value: serde_json::Value = serde_json::from_str(&text)
                    .with_context(|| format!("無法解析圖表配置 {}", path.display()))?;

                let mut page = ChartPage::from_value(value);
                if let Some(title) = title {
                    page = page.title(title.clone());
                }
                Ok(page.render_html()?)
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 初始化配置
    let app_config = config::init_config()?;

    // 初始化日誌系統
    init_logging(&app_config.log)?;

    let (source, listen) = match cli.command {
        Command::Serve { file, listen } => (Source::Html(file), listen),
        Command::Chart { config, title, listen } => (Source::Chart { path: config, title }, listen),
    };

    let server = global::init_global(WebServerOptions::try_from(&app_config.server)?);

    let html = source.render().await?;
    let address = listen.address.unwrap_or_else(|| app_config.server.host.clone());
    let port = listen.port.unwrap_or(app_config.server.port);

    let status = tokio::task::spawn_blocking(move || server.ensure_started(html, &address, port))
        .await??;
    if let Some(addr) = status.local_addr {
        info!("頁面已可在 http://{} 瀏覽", addr);
    }

    let watcher = if listen.watch_ms > 0 && !source.is_stdin() {
        let interval = Duration::from_millis(listen.watch_ms);
        Some(tokio::spawn(watch_source(source, interval, server)))
    } else {
        if listen.watch_ms > 0 {
            warn!("標準輸入無法監看變更，忽略 --watch-ms");
        }
        None
    };

    // 等待關閉信號
    let shutdown = signal::ctrl_c().await;
    if let Some(watcher) = watcher {
        watcher.abort();
    }

    match &shutdown {
        Ok(()) => info!("接收到關閉信號，正在退出..."),
        Err(err) => error!("無法監聽關閉信號: {}", err),
    }

    tokio::task::spawn_blocking(global::stop).await??;

    shutdown.map_err(|err| anyhow!("無法監聽關閉信號: {}", err))
}

// 輸入文件變更後重新渲染並替換內容
async fn watch_source(source: Source, interval: Duration, server: &'static WebServer) {
    let mut last_modified = modified_time(source.path()).await;
    let mut ticker = tokio::time::interval(interval);

    loop {
        ticker.tick().await;

        let modified = modified_time(source.path()).await;
        if modified == last_modified {
            continue;
        }
        last_modified = modified;

        match source.render().await {
            Ok(html) => {
                server.update_content(html);
                info!("已重新載入 {}", source.path().display());
            }
            Err(err) => warn!("重新載入 {} 失敗: {:#}", source.path().display(), err),
        }
    }
}

async fn modified_time(path: &Path) -> Option<SystemTime> {
    tokio::fs::metadata(path)
        .await
        .and_then(|meta| meta.modified())
        .ok()
}

async fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .context("無法讀取標準輸入")?;
        return Ok(text);
    }

    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("無法讀取 {}", path.display()))
}

// 初始化日誌系統
fn init_logging(log_config: &LogConfig) -> Result<()> {
    let level = match log_config.level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO, // 默認為INFO
    };

    // RUST_LOG 優先於配置
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(LevelFilter::from_level(level).into()));

    let builder = FmtSubscriber::builder().with_env_filter(filter);
    let result = if log_config.format.eq_ignore_ascii_case("json") {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    result.map_err(|e| anyhow!("設置日誌系統失敗: {}", e))?;

    info!("日誌系統初始化完成");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_chart_source_renders_page_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.json");
        tokio::fs::write(&path, r#"{"type":"pie","data":{"datasets":[]}}"#)
            .await
            .unwrap();

        let source = Source::Chart {
            path: path.clone(),
            title: Some("Pie".to_string()),
        };
        let html = source.render().await.unwrap();
        assert!(html.contains("<title>Pie</title>"));
        assert!(html.contains("\"type\":\"pie\""));

        assert!(modified_time(&path).await.is_some());
        assert!(modified_time(&dir.path().join("missing.json")).await.is_none());
    }

    #[tokio::test]
    async fn test_missing_html_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = Source::Html(dir.path().join("missing.html"));
        assert!(source.render().await.is_err());
    }
}
