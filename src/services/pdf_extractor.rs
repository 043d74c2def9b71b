//! PDF 文本抽取服务 - 业务能力层
//!
//! 逐页抽取文本并拼接成一个字符串，页与页之间用空行分隔。

use std::path::Path;

use lopdf::Document;
use tracing::{debug, warn};

use crate::error::{AppResult, ExtractionError};

/// PDF 文本抽取
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }

    /// 从内存中的 PDF 抽取文本
    ///
    /// 解析是 CPU 密集操作，放到阻塞线程池中执行。
    pub async fn extract(&self, name: &str, bytes: Vec<u8>) -> AppResult<String> {
        let owned_name = name.to_string();
        tokio::task::spawn_blocking(move || extract_text_blocking(&owned_name, &bytes))
            .await
            .map_err(|e| ExtractionError::LoadFailed {
                name: name.to_string(),
                source: Box::new(e),
            })?
    }

    /// 从文件抽取文本
    pub async fn extract_file(&self, path: &Path) -> AppResult<String> {
        let name = file_name(path);
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ExtractionError::LoadFailed {
                name: name.clone(),
                source: Box::new(e),
            })?;
        self.extract(&name, bytes).await
    }
}

pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn extract_text_blocking(name: &str, bytes: &[u8]) -> AppResult<String> {
    let doc = Document::load_mem(bytes).map_err(|e| ExtractionError::LoadFailed {
        name: name.to_string(),
        source: Box::new(e),
    })?;

    let pages = doc.get_pages();
    debug!("PDF {} 共 {} 页", name, pages.len());

    let mut full_text = String::new();
    for page_number in pages.keys() {
        match doc.extract_text(&[*page_number]) {
            Ok(text) => {
                full_text.push_str(join_lines(&text).as_str());
                full_text.push_str("\n\n");
            }
            // 单页失败不影响其他页，最终由文本长度判断是否可用
            Err(e) => warn!("PDF {} 第 {} 页抽取失败: {}", name, page_number, e),
        }
    }

    Ok(full_text)
}

/// 把页内的换行压成空格
fn join_lines(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
