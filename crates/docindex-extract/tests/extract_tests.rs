use docindex_core::analysis::{
    AnalyzeResult, AnalyzedPage, AnalyzedTable, CellKind, TableCell, TextSpan,
};
use docindex_core::traits::DocumentAnalyzer;
use docindex_core::types::PageDetail;
use docindex_extract::{build_page_map, table_to_html, PlainTextAnalyzer, SectionSplitter};

fn cell(row: usize, column: usize, kind: CellKind, content: &str, spans: Vec<TextSpan>) -> TableCell {
    TableCell { row, column, row_span: 1, column_span: 1, kind, content: content.to_string(), spans }
}

#[tokio::test]
async fn plain_text_analyzer_splits_pages_on_form_feed() {
    let analyzer = PlainTextAnalyzer;
    let result = analyzer.analyze("first page\u{0c}second page".as_bytes()).await.expect("analyze");
    assert_eq!(result.pages.len(), 2);
    assert_eq!(result.pages[0].offset, 0);
    assert_eq!(result.pages[0].length, 10);
    assert_eq!(result.pages[1].offset, 10);
    assert_eq!(result.content, "first pagesecond page");
}

#[tokio::test]
async fn plain_text_analyzer_rejects_invalid_utf8() {
    let analyzer = PlainTextAnalyzer;
    assert!(analyzer.analyze(&[0xff, 0xfe, 0x00]).await.is_err());
}

#[test]
fn page_map_records_running_offsets_with_trailing_space() {
    let result = AnalyzeResult {
        content: "abcdef".to_string(),
        pages: vec![
            AnalyzedPage { offset: 0, length: 3, tables: vec![] },
            AnalyzedPage { offset: 3, length: 3, tables: vec![] },
        ],
    };
    let pages = build_page_map(&result);
    assert_eq!(pages[0].text, "abc ");
    assert_eq!(pages[0].offset, 0);
    assert_eq!(pages[1].text, "def ");
    assert_eq!(pages[1].offset, 4);
}

#[test]
fn table_covering_whole_page_renders_exactly_once() {
    // Every char of the page maps to the same table id.
    let table = AnalyzedTable {
        row_count: 1,
        column_count: 1,
        cells: vec![cell(0, 0, CellKind::Content, "x", vec![TextSpan { offset: 0, length: 10 }])],
    };
    let result = AnalyzeResult {
        content: "xxxxxxxxxx".to_string(),
        pages: vec![AnalyzedPage { offset: 0, length: 10, tables: vec![table] }],
    };
    let pages = build_page_map(&result);
    let rendered = &pages[0].text;
    assert_eq!(rendered.matches("<table>").count(), 1, "no duplicate rendering");
    assert_eq!(rendered, &format!("{} ", "<table><tr><td>x</td></tr></table>"));
}

#[test]
fn table_html_uses_header_tags_span_attrs_and_escaping() {
    let table = AnalyzedTable {
        row_count: 2,
        column_count: 2,
        cells: vec![
            TableCell {
                row: 0,
                column: 0,
                row_span: 1,
                column_span: 2,
                kind: CellKind::ColumnHeader,
                content: "A & B".to_string(),
                spans: vec![],
            },
            cell(1, 1, CellKind::Content, "<b>", vec![]),
            cell(1, 0, CellKind::RowHeader, "row", vec![]),
        ],
    };
    let html = table_to_html(&table);
    assert_eq!(
        html,
        "<table><tr><th colspan=\"2\">A &amp; B</th></tr><tr><th>row</th><td>&lt;b&gt;</td></tr></table>"
    );
}

#[test]
fn table_interleaved_with_text_keeps_surrounding_chars() {
    // chars 2..5 belong to a table, the rest is prose
    let table = AnalyzedTable {
        row_count: 1,
        column_count: 1,
        cells: vec![cell(0, 0, CellKind::Content, "tbl", vec![TextSpan { offset: 2, length: 3 }])],
    };
    let result = AnalyzeResult {
        content: "ab123cd".to_string(),
        pages: vec![AnalyzedPage { offset: 0, length: 7, tables: vec![table] }],
    };
    let pages = build_page_map(&result);
    assert_eq!(pages[0].text, "ab<table><tr><td>tbl</td></tr></table>cd ");
}

fn synthetic_pages(texts: &[&str]) -> Vec<PageDetail> {
    let mut offset = 0;
    texts
        .iter()
        .enumerate()
        .map(|(index, t)| {
            let page = PageDetail { index, offset, text: (*t).to_string() };
            offset += t.chars().count();
            page
        })
        .collect()
}

fn start_offset(section: &docindex_core::types::Section) -> usize {
    section.id.rsplit('-').next().and_then(|s| s.parse().ok()).expect("id carries offset")
}

#[test]
fn four_page_document_of_3800_chars_yields_four_sections() {
    // 4 pages of 949 chars + the per-page trailing space = 3800 chars total.
    let page: String = "a".repeat(949) + " ";
    let pages = synthetic_pages(&[&page, &page, &page, &page]);
    let total: usize = pages.iter().map(|p| p.text.chars().count()).sum();
    assert_eq!(total, 3800);

    let splitter = SectionSplitter::default();
    let sections: Vec<_> = splitter.split(&pages, "report.pdf", None).collect();
    assert_eq!(sections.len(), 4);

    let starts: Vec<usize> = sections.iter().map(start_offset).collect();
    assert!(starts.windows(2).all(|w| w[0] <= w[1]), "start offsets are non-decreasing");
    let last = sections.last().expect("non-empty");
    assert_eq!(start_offset(last) + last.content.chars().count(), 3800);
}

#[test]
fn sections_respect_length_and_overlap_bounds() {
    // sentence-rich text: terminators every ~40 chars keep boundary snapping local
    let sentence = "The quick brown fox jumps over a lazy dog. ";
    let text: String = sentence.repeat(120); // ~5280 chars
    let pages = synthetic_pages(&[&text]);
    let splitter = SectionSplitter::default();
    let sections: Vec<_> = splitter.split(&pages, "prose.txt", None).collect();
    assert!(sections.len() > 1);

    // start snapping can pull a window back as far as the previous sentence
    // terminator, so both bounds carry one sentence (44 chars) of slack
    for s in &sections {
        let len = s.content.chars().count();
        assert!(len >= 1);
        assert!(len <= 1000 + 100 + sentence.len(), "section of {} chars out of bounds", len);
    }
    for pair in sections.windows(2) {
        let end = start_offset(&pair[0]) + pair[0].content.chars().count();
        let next_start = start_offset(&pair[1]);
        assert!(next_start <= end, "adjacent sections must touch or overlap");
        assert!(end - next_start <= 100 + sentence.len(), "overlap {} exceeds bound", end - next_start);
    }
}

#[test]
fn splitter_never_cuts_mid_word_when_a_break_exists() {
    let word = "abcdefghi "; // 10 chars, break at each boundary
    let text: String = word.repeat(400);
    let pages = synthetic_pages(&[&text]);
    let sections: Vec<_> = SectionSplitter::default().split(&pages, "words.txt", None).collect();
    for pair in sections.windows(2) {
        // every emitted boundary lands on a word edge, so content never
        // starts in the middle of "abcdefghi"
        assert!(pair[1].content.starts_with('a') || pair[1].content.starts_with(' '));
    }
}

#[test]
fn short_document_below_overlap_emits_nothing() {
    let pages = synthetic_pages(&["tiny text "]);
    let sections: Vec<_> = SectionSplitter::default().split(&pages, "tiny.txt", None).collect();
    assert!(sections.is_empty());
}

#[test]
fn medium_document_emits_single_clamped_section() {
    let text = "word ".repeat(100); // 500 chars
    let pages = synthetic_pages(&[&text]);
    let sections: Vec<_> = SectionSplitter::default().split(&pages, "mid.txt", None).collect();
    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0].content.chars().count(), 500);
}

#[test]
fn unclosed_table_pulls_next_section_back_to_table_start() {
    // 500 chars of prose, then an 800-char table, then more prose. The first
    // window ends inside the table, so the next one must start at the table.
    let prose = "Sentence number one is here. ".repeat(18); // 522 chars
    let prose = &prose[..500];
    let row = "<tr><td>datum</td></tr>"; // 23 chars
    let table = format!("<table>{}</table>", row.repeat(34)); // 797 chars
    let tail = "Closing remarks follow the table. ".repeat(20);
    let text = format!("{}{}{}", prose, table, tail);
    let pages = synthetic_pages(&[&text]);

    let sections: Vec<_> = SectionSplitter::default().split(&pages, "tabled.pdf", None).collect();
    assert!(sections.len() >= 2);
    assert!(
        !sections[0].content.contains("</table"),
        "first window ends inside the unclosed table"
    );
    let full_table_holder = sections
        .iter()
        .find(|s| s.content.contains("<table") && s.content.contains("</table>"));
    assert!(full_table_holder.is_some(), "some section carries the whole table");
}

#[test]
fn sections_resolve_source_page_by_offset() {
    let page: String = "a".repeat(949) + " ";
    let pages = synthetic_pages(&[&page, &page, &page, &page]);
    let sections: Vec<_> = SectionSplitter::default().split(&pages, "report.pdf", None).collect();
    assert_eq!(sections[0].source_page, "report-0.txt");
    let last = sections.last().expect("sections");
    assert_eq!(last.source_page, format!("report-{}.txt", 2850 / 950));
}

#[test]
fn section_content_is_contiguous_substring_of_document() {
    let sentence = "Chunk boundaries must preserve every character faithfully. ";
    let text = sentence.repeat(60);
    let pages = synthetic_pages(&[&text]);
    let all: Vec<char> = text.chars().collect();
    for s in SectionSplitter::default().split(&pages, "doc.txt", None) {
        let start = start_offset(&s);
        let expected: String = all[start..start + s.content.chars().count()].iter().collect();
        assert_eq!(s.content, expected);
    }
}
