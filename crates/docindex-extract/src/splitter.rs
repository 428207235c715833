//! Sliding-window section splitting with boundary snapping.
//!
//! The splitter walks the concatenated page text in windows of
//! `max_section_length` chars, snapping both window edges to sentence or
//! word boundaries, and pulls the next window back when a section ends
//! inside an unclosed `<table`. Adjacent sections deliberately share up to
//! `section_overlap` chars so downstream retrieval keeps context across
//! chunk boundaries.

use docindex_core::config::IngestOptions;
use docindex_core::types::{find_page, section_id, PageDetail, Section};

const SENTENCE_ENDINGS: [char; 3] = ['.', '!', '?'];
const WORD_BREAKS: [char; 12] =
    [',', ';', ':', ' ', '(', ')', '[', ']', '{', '}', '\t', '\n'];

#[derive(Debug, Clone)]
pub struct SectionSplitter {
    max_section_length: usize,
    sentence_search_limit: usize,
    section_overlap: usize,
}

impl Default for SectionSplitter {
    fn default() -> Self {
        Self {
            max_section_length: 1000,
            sentence_search_limit: 100,
            section_overlap: 100,
        }
    }
}

impl SectionSplitter {
    pub fn new(opts: &IngestOptions) -> Self {
        Self {
            max_section_length: opts.max_section_length,
            sentence_search_limit: opts.sentence_search_limit,
            section_overlap: opts.section_overlap,
        }
    }

    /// Split the page map into ordered, overlapping sections.
    ///
    /// Each call performs a fresh pass over the concatenated text; the
    /// returned iterator is finite and not resumable mid-stream.
    pub fn split<'a>(
        &self,
        pages: &'a [PageDetail],
        source_file: &'a str,
        category: Option<&'a str>,
    ) -> SplitIter<'a> {
        let text: Vec<char> = pages.iter().flat_map(|p| p.text.chars()).collect();
        let last_end = text.len();
        SplitIter {
            text,
            pages,
            source_file,
            category,
            max_section_length: self.max_section_length,
            sentence_search_limit: self.sentence_search_limit,
            section_overlap: self.section_overlap,
            start: 0,
            last_end,
            done: false,
        }
    }
}

/// Finite, non-restartable stream of sections over one document.
pub struct SplitIter<'a> {
    text: Vec<char>,
    pages: &'a [PageDetail],
    source_file: &'a str,
    category: Option<&'a str>,
    max_section_length: usize,
    sentence_search_limit: usize,
    section_overlap: usize,
    start: usize,
    last_end: usize,
    done: bool,
}

impl<'a> SplitIter<'a> {
    fn emit(&self, start: usize, end: usize) -> Section {
        let content: String = self.text[start..end].iter().collect();
        let page = find_page(self.pages, start);
        Section {
            id: section_id(self.source_file, start),
            content,
            source_page: source_page_name(self.source_file, page),
            source_file: self.source_file.to_string(),
            category: self.category.map(str::to_string),
        }
    }
}

impl<'a> Iterator for SplitIter<'a> {
    type Item = Section;

    fn next(&mut self) -> Option<Section> {
        if self.done {
            return None;
        }
        let length = self.text.len();

        if self.start + self.section_overlap >= length {
            // Main loop is over; a partial tail window may remain.
            self.done = true;
            if self.start + self.section_overlap < self.last_end {
                return Some(self.emit(self.start, self.last_end));
            }
            return None;
        }

        let mut end = self.start + self.max_section_length;
        if end > length {
            end = length;
        } else {
            // Scan forward for a sentence ending, remembering the last word
            // break in case no terminator appears within the search window.
            let mut last_word: i64 = -1;
            while end < length
                && end - self.start - self.max_section_length < self.sentence_search_limit
                && !SENTENCE_ENDINGS.contains(&self.text[end])
            {
                if WORD_BREAKS.contains(&self.text[end]) {
                    last_word = end as i64;
                }
                end += 1;
            }
            if end < length && !SENTENCE_ENDINGS.contains(&self.text[end]) && last_word > 0 {
                end = last_word as usize;
            }
            if end < length {
                end += 1;
            }
        }

        // Snap the window start back to a sentence or word boundary.
        let mut start = self.start;
        let mut last_word: i64 = -1;
        let lower_bound =
            end as i64 - self.max_section_length as i64 - 2 * self.sentence_search_limit as i64;
        while start > 0
            && start as i64 > lower_bound
            && !SENTENCE_ENDINGS.contains(&self.text[start])
        {
            if WORD_BREAKS.contains(&self.text[start]) {
                last_word = start as i64;
            }
            start -= 1;
        }
        if !SENTENCE_ENDINGS.contains(&self.text[start]) && last_word > 0 {
            start = last_word as usize;
        }
        if start > 0 {
            start += 1;
        }

        let section = self.emit(start, end);

        // Table continuity: when the section ends inside an unclosed table
        // that opens deep enough into the window, pull the next start back to
        // the table. The depth check keeps oversized tables from looping.
        let window = &self.text[start..end];
        let last_table_start = rfind_chars(window, "<table");
        let next_overlap_start = end - self.section_overlap;
        match last_table_start {
            Some(table_at)
                if table_at > 2 * self.sentence_search_limit
                    && rfind_chars(window, "</table").map_or(true, |close| table_at > close) =>
            {
                self.start = next_overlap_start.min(start + table_at);
            }
            _ => self.start = next_overlap_start,
        }
        self.last_end = end;

        Some(section)
    }
}

/// Last occurrence of `needle` within a char window, as a char offset.
fn rfind_chars(haystack: &[char], needle: &str) -> Option<usize> {
    let needle: Vec<char> = needle.chars().collect();
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    (0..=haystack.len() - needle.len()).rev().find(|&i| haystack[i..i + needle.len()] == needle[..])
}

/// Page-level provenance label, matching the archived corpus object name.
pub fn source_page_name(source_file: &str, page_index: usize) -> String {
    let stem = std::path::Path::new(source_file)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| source_file.to_string());
    docindex_core::types::corpus_object_name(&stem, page_index)
}
