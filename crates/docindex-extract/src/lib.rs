//! docindex-extract
//!
//! Table-aware page text reconstruction and the sliding-window section
//! splitter. Pure CPU-bound once the analyzer result is in hand.

pub mod analyzer;
pub mod pages;
pub mod splitter;

pub use analyzer::PlainTextAnalyzer;
pub use pages::{build_page_map, table_to_html, PageExtractor};
pub use splitter::{SectionSplitter, SplitIter};
