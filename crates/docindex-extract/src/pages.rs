//! Table-aware page text reconstruction.
//!
//! Turns an analyzer result into an ordered page map: for every page the
//! plain characters are copied through and each detected table is replaced
//! by a single inline HTML rendering at the position of its first covered
//! character.

use tracing::debug;

use docindex_core::analysis::{AnalyzeResult, AnalyzedTable};
use docindex_core::error::Result;
use docindex_core::traits::DocumentAnalyzer;
use docindex_core::types::PageDetail;

const NO_TABLE: i32 = -1;

pub struct PageExtractor<A: DocumentAnalyzer> {
    analyzer: A,
}

impl<A: DocumentAnalyzer> PageExtractor<A> {
    pub fn new(analyzer: A) -> Self {
        Self { analyzer }
    }

    /// Analyze `bytes` and reconstruct the per-page text map.
    ///
    /// Analyzer failures propagate as a hard failure for the whole file;
    /// there are no partial-page results.
    pub async fn extract(&self, bytes: &[u8]) -> Result<Vec<PageDetail>> {
        let result = self.analyzer.analyze(bytes).await?;
        Ok(build_page_map(&result))
    }
}

/// Reconstruct page text from an analysis result, inlining tables as HTML.
pub fn build_page_map(result: &AnalyzeResult) -> Vec<PageDetail> {
    let content: Vec<char> = result.content.chars().collect();
    let mut pages = Vec::with_capacity(result.pages.len());
    let mut offset = 0usize;

    for (index, page) in result.pages.iter().enumerate() {
        // Flat per-position table id array for this page's span.
        let mut table_chars = vec![NO_TABLE; page.length];
        for (t_idx, table) in page.tables.iter().enumerate() {
            for cell in &table.cells {
                for span in &cell.spans {
                    for i in 0..span.length {
                        let pos = span.offset + i;
                        if pos >= page.offset && pos - page.offset < page.length {
                            table_chars[pos - page.offset] = t_idx as i32;
                        }
                    }
                }
            }
        }

        let mut text = String::new();
        let mut added = vec![false; page.tables.len()];
        for (i, &marker) in table_chars.iter().enumerate() {
            if marker == NO_TABLE {
                if let Some(&c) = content.get(page.offset + i) {
                    text.push(c);
                }
            } else if !added[marker as usize] {
                // Emit the full table once at its first covered position.
                text.push_str(&table_to_html(&page.tables[marker as usize]));
                added[marker as usize] = true;
            }
        }
        text.push(' ');

        let length = text.chars().count();
        debug!(page = index, offset, chars = length, tables = page.tables.len(), "reconstructed page");
        pages.push(PageDetail { index, offset, text });
        offset += length;
    }
    pages
}

/// Render a detected table as inline HTML, rows in row order and cells in
/// column order. Header-class cells become `<th>`; span attributes appear
/// only when greater than one.
pub fn table_to_html(table: &AnalyzedTable) -> String {
    let mut html = String::from("<table>");
    for row in 0..table.row_count {
        html.push_str("<tr>");
        let mut row_cells: Vec<_> = table.cells.iter().filter(|c| c.row == row).collect();
        row_cells.sort_by_key(|c| c.column);
        for cell in row_cells {
            let tag = if cell.kind.is_header() { "th" } else { "td" };
            html.push('<');
            html.push_str(tag);
            if cell.column_span > 1 {
                html.push_str(&format!(" colspan=\"{}\"", cell.column_span));
            }
            if cell.row_span > 1 {
                html.push_str(&format!(" rowspan=\"{}\"", cell.row_span));
            }
            html.push('>');
            html.push_str(&escape_html(&cell.content));
            html.push_str(&format!("</{}>", tag));
        }
        html.push_str("</tr>");
    }
    html.push_str("</table>");
    html
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
