use std::fmt::Write as _;

use serde::Serialize;
use serde_json::Value;

use crate::render::{ContentProducer, RenderError, RenderResult};

/// Chart.js 腳本位址
pub const DEFAULT_CHART_SCRIPT_SRC: &str = "https://cdn.jsdelivr.net/npm/chart.js";

/// 把 Chart.js 配置包進單一頁面
///
/// 配置本身不做任何檢查，原樣序列化後交給 `new Chart(canvas, config)`。
#[derive(Debug, Clone, PartialEq)]
pub struct ChartPage {
    config: Value,
    title: String,
    canvas_id: String,
    width: u32,
    height: u32,
    script_src: String,
}

impl ChartPage {
    /// 從任何可序列化的配置建立頁面
    pub fn from_config<T>(config: &T) -> RenderResult<Self>
    where
        T: Serialize + ?Sized,
    {
        Ok(Self::from_value(serde_json::to_value(config)?))
    }

    pub fn from_value(config: Value) -> Self {
        Self {
            config,
            title: "Chart".to_string(),
            canvas_id: "chart".to_string(),
            width: 800,
            height: 600,
            script_src: DEFAULT_CHART_SCRIPT_SRC.to_string(),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn canvas_id(mut self, canvas_id: impl Into<String>) -> Self {
        self.canvas_id = canvas_id.into();
        self
    }

    /// 容器尺寸（像素）
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn script_src(mut self, src: impl Into<String>) -> Self {
        self.script_src = src.into();
        self
    }

    pub fn config(&self) -> &Value {
        &self.config
    }

    fn check_options(&self) -> RenderResult<()> {
        let id_ok = !self.canvas_id.is_empty()
            && self
                .canvas_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !id_ok {
            return Err(RenderError::InvalidOption(format!(
                "canvas id {:?} 只能包含英數字、'-' 與 '_'",
                self.canvas_id
            )));
        }

        if self.width == 0 || self.height == 0 {
            return Err(RenderError::InvalidOption(format!(
                "頁面尺寸必須大於 0: {}x{}",
                self.width, self.height
            )));
        }

        if self.script_src.trim().is_empty() {
            return Err(RenderError::InvalidOption("腳本位址不可為空".to_string()));
        }

        Ok(())
    }
}

impl ContentProducer for ChartPage {
    fn render_html(&self) -> RenderResult<String> {
        self.check_options()?;

        let config_json = script_safe_json(&serde_json::to_string(&self.config)?);
        let title = escape_html(&self.title);
        let script_src = escape_html(&self.script_src);

        let mut html = String::with_capacity(config_json.len() + 512);
        // 寫入 String 不會失敗
        let _ = write!(
            html,
            "<!DOCTYPE html>\n\
             <html>\n\
             <head>\n\
             <meta charset=\"utf-8\">\n\
             <title>{title}</title>\n\
             <script src=\"{script_src}\"></script>\n\
             </head>\n\
             <body>\n\
             <div style=\"width: {width}px; height: {height}px;\">\n\
             <canvas id=\"{id}\"></canvas>\n\
             </div>\n\
             <script>\n\
             new Chart(document.getElementById(\"{id}\"), {config_json});\n\
             </script>\n\
             </body>\n\
             </html>\n",
            width = self.width,
            height = self.height,
            id = self.canvas_id,
        );

        Ok(html)
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

// JSON 中的 `</` 只會出現在字串內，改寫為 `<\/` 不改變其值
fn script_safe_json(json: &str) -> String {
    json.replace("</", "<\\/").replace("<!--", "<\\!--")
}
