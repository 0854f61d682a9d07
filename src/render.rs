// render.rs - 內容產生器
//
// 伺服器只接受完整的 HTML 字串；本模組定義產生字串的接口，
// 並提供把圖表配置 JSON 包進最小 HTML 頁面的實現。

pub mod page;

pub use page::{ChartPage, DEFAULT_CHART_SCRIPT_SRC};

use thiserror::Error;

/// 渲染錯誤類型
#[derive(Error, Debug)]
pub enum RenderError {
    /// 配置序列化失敗
    #[error("配置序列化失敗: {0}")]
    Serialize(#[from] serde_json::Error),

    /// 頁面選項無效
    #[error("無效的頁面選項: {0}")]
    InvalidOption(String),
}

/// 渲染結果類型別名
pub type RenderResult<T> = Result<T, RenderError>;

/// 產生完整 HTML 文件的接口
pub trait ContentProducer {
    fn render_html(&self) -> RenderResult<String>;
}

impl ContentProducer for str {
    fn render_html(&self) -> RenderResult<String> {
        Ok(self.to_string())
    }
}

impl ContentProducer for String {
    fn render_html(&self) -> RenderResult<String> {
        Ok(self.clone())
    }
}

impl<P: ContentProducer + ?Sized> ContentProducer for Box<P> {
    fn render_html(&self) -> RenderResult<String> {
        (**self).render_html()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strings_render_verbatim() {
        assert_eq!("<p>x</p>".render_html().unwrap(), "<p>x</p>");
        assert_eq!(String::new().render_html().unwrap(), "");

        let boxed: Box<dyn ContentProducer> = Box::new("boxed".to_string());
        assert_eq!(boxed.render_html().unwrap(), "boxed");
    }
}
