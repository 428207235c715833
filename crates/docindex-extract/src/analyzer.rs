use async_trait::async_trait;

use docindex_core::analysis::{AnalyzeResult, AnalyzedPage};
use docindex_core::error::{Error, Result};
use docindex_core::traits::DocumentAnalyzer;

/// Analyzer for plain UTF-8 text files.
///
/// Pages are separated by form feeds; no table detection. Richer formats
/// (PDF, images) come from external analyzers implementing the same trait.
pub struct PlainTextAnalyzer;

#[async_trait]
impl DocumentAnalyzer for PlainTextAnalyzer {
    async fn analyze(&self, bytes: &[u8]) -> Result<AnalyzeResult> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| Error::Extraction(format!("document is not valid UTF-8: {}", e)))?;

        let mut pages = Vec::new();
        let mut content = String::new();
        let mut offset = 0usize;
        for part in text.split('\u{0c}') {
            let length = part.chars().count();
            pages.push(AnalyzedPage { offset, length, tables: Vec::new() });
            content.push_str(part);
            offset += length;
        }
        Ok(AnalyzeResult { content, pages })
    }
}
