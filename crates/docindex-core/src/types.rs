//! Domain types shared by the extraction pipeline and the index backends.

use serde::{Deserialize, Serialize};

pub type SectionId = String;

/// One physical page of a source document after text reconstruction.
///
/// - `index`: zero-based page number
/// - `offset`: starting position (in chars) of this page within the
///   concatenated full-document text
/// - `text`: reconstructed page text with detected tables inlined as HTML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageDetail {
    pub index: usize,
    pub offset: usize,
    pub text: String,
}

/// A bounded, possibly-overlapping chunk of the reconstructed document text.
///
/// `content` is always a contiguous substring of the concatenated page text
/// (inlined table HTML included). Sections are never mutated after the
/// splitter emits them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub content: String,
    pub source_page: String,
    pub source_file: String,
    pub category: Option<String>,
}

/// Derives the stable store-safe key for a section.
///
/// The key is `{source_file}-{start_offset}` with every character outside
/// `[0-9a-zA-Z_-]` replaced by `_` and leading underscores trimmed, so the
/// same file and offset always map to the same id across runs.
pub fn section_id(source_file: &str, start_offset: usize) -> SectionId {
    let raw = format!("{}-{}", source_file, start_offset);
    let sanitized: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();
    sanitized.trim_start_matches('_').to_string()
}

/// Returns the index of the page containing `offset`.
///
/// Pages are few relative to sections, so a linear scan is fine. Offsets at
/// or past the last page boundary resolve to the last page.
pub fn find_page(pages: &[PageDetail], offset: usize) -> usize {
    for i in 0..pages.len().saturating_sub(1) {
        if offset >= pages[i].offset && offset < pages[i + 1].offset {
            return i;
        }
    }
    pages.len().saturating_sub(1)
}

/// A fully prepared index document: section fields plus its embedding(s).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexDocument {
    pub id: SectionId,
    pub content: String,
    pub category: Option<String>,
    pub sourcepage: String,
    pub sourcefile: String,
    pub embedding: Vec<f32>,
    pub image_embedding: Option<Vec<f32>>,
}

impl IndexDocument {
    pub fn from_section(section: &Section, embedding: Vec<f32>) -> Self {
        Self {
            id: section.id.clone(),
            content: section.content.clone(),
            category: section.category.clone(),
            sourcepage: section.source_page.clone(),
            sourcefile: section.source_file.clone(),
            embedding,
            image_embedding: None,
        }
    }
}

/// Per-flush accounting returned by the batching writer.
///
/// `succeeded < attempted` means a partial-batch failure; the caller decides
/// whether that is fatal (default: log and continue).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlushReport {
    pub attempted: usize,
    pub succeeded: usize,
}

impl FlushReport {
    pub fn merge(&mut self, other: FlushReport) {
        self.attempted += other.attempted;
        self.succeeded += other.succeeded;
    }
}

/// Name of the durable corpus object for one page: `{file_stem}-{page}.txt`.
pub fn corpus_object_name(file_stem: &str, page_index: usize) -> String {
    format!("{}-{}.txt", file_stem, page_index)
}
