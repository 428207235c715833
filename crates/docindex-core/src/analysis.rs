//! Result model returned by document-analysis collaborators.
//!
//! Offsets and lengths are char positions into `AnalyzeResult::content`.
//! The pipeline never inspects the source bytes itself; everything flows
//! from this shape.

use serde::{Deserialize, Serialize};

/// Full analysis output for one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResult {
    pub content: String,
    pub pages: Vec<AnalyzedPage>,
}

/// One page: its content span plus any detected tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzedPage {
    pub offset: usize,
    pub length: usize,
    pub tables: Vec<AnalyzedTable>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzedTable {
    pub row_count: usize,
    pub column_count: usize,
    pub cells: Vec<TableCell>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableCell {
    pub row: usize,
    pub column: usize,
    pub row_span: usize,
    pub column_span: usize,
    pub kind: CellKind,
    pub content: String,
    /// Char spans this cell covers in the page content.
    pub spans: Vec<TextSpan>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum CellKind {
    Content,
    ColumnHeader,
    RowHeader,
    StubHead,
    Description,
}

impl CellKind {
    /// Header-class cells render as `<th>`, everything else as `<td>`.
    pub fn is_header(self) -> bool {
        matches!(self, CellKind::ColumnHeader | CellKind::RowHeader)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TextSpan {
    pub offset: usize,
    pub length: usize,
}
