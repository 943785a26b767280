//! Span-aware table reconstruction.
//!
//! HTML encodes merged cells as `rowspan`/`colspan` attributes, so the
//! logical grid only emerges once every span is replayed: a spanning cell's
//! value has to reappear at each row and column position it covers. The walk
//! here keeps an active-span map per column and consults it before consuming
//! source cells, then right-pads the result into a rectangular matrix.

use std::collections::HashMap;

use scraper::{ElementRef, Selector};
use tracing::debug;

use crate::error::Result;
use crate::extract::document::{element_text, Document};

/// Rectangular matrix of cell texts.
pub type TableMatrix = Vec<Vec<String>>;

/// Selector tried when the caller names none. Wiki-style data tables are
/// the most common extraction target.
pub const DEFAULT_TABLE_SELECTOR: &str = "table.wikitable";

/// A pending rowspan: the value repeats at one column until `remaining`
/// further rows have consumed it.
struct SpanState {
    value: String,
    remaining: u32,
}

/// Find the biggest table matching `selector` (default wiki-style) and
/// reconstruct it. `Ok(None)` when nothing matches.
pub fn extract_table(doc: &Document, selector: Option<&str>) -> Result<Option<TableMatrix>> {
    let selector = selector.unwrap_or(DEFAULT_TABLE_SELECTOR);
    match largest_table(doc, selector)? {
        Some(table) => {
            let matrix = reconstruct(&table);
            debug!(selector, rows = matrix.len(), "table reconstructed");
            Ok(Some(matrix))
        }
        None => Ok(None),
    }
}

/// The matching table with the most `<tr>` descendants. Ties keep the first
/// one encountered; callers may depend on that ordering.
pub fn largest_table<'a>(doc: &'a Document, selector: &str) -> Result<Option<ElementRef<'a>>> {
    let row_sel = Selector::parse("tr").unwrap();
    let mut best: Option<(usize, ElementRef<'a>)> = None;
    for table in doc.select_all(selector)? {
        let rows = table.select(&row_sel).count();
        let replace = match &best {
            Some((most, _)) => rows > *most,
            None => true,
        };
        if replace {
            best = Some((rows, table));
        }
    }
    Ok(best.map(|(_, table)| table))
}

/// Reconstruct the logical grid of one table element. Never fails: spans
/// that do not parse degrade to plain cells.
pub fn reconstruct(table: &ElementRef<'_>) -> TableMatrix {
    let row_sel = Selector::parse("tr").unwrap();
    let cell_sel = Selector::parse("th, td").unwrap();

    let mut spans: HashMap<usize, SpanState> = HashMap::new();
    let mut matrix: TableMatrix = Vec::new();

    for row in table.select(&row_sel) {
        let mut cells = row.select(&cell_sel);
        let mut out: Vec<String> = Vec::new();
        let mut col = 0usize;

        loop {
            // A span carried over from an earlier row owns this column; it
            // emits without consuming a source cell.
            if let Some(state) = spans.get_mut(&col) {
                out.push(state.value.clone());
                state.remaining -= 1;
                if state.remaining == 0 {
                    spans.remove(&col);
                }
                col += 1;
                continue;
            }

            let Some(cell) = cells.next() else { break };
            let (rowspan, colspan) = span_attrs(&cell);
            let text = element_text(&cell);

            for offset in 0..colspan as usize {
                out.push(text.clone());
                if rowspan > 1 {
                    spans.insert(
                        col + offset,
                        SpanState {
                            value: text.clone(),
                            remaining: rowspan - 1,
                        },
                    );
                }
            }
            col += colspan as usize;
        }

        matrix.push(out);
    }

    let width = matrix.iter().map(Vec::len).max().unwrap_or(0);
    for row in &mut matrix {
        row.resize(width, String::new());
    }
    matrix
}

/// Span attributes of a cell. Absent attributes default to 1; if either
/// value fails to parse as an unsigned integer, both collapse to 1. An
/// explicit zero is kept, so `colspan="0"` makes a cell vanish.
fn span_attrs(cell: &ElementRef<'_>) -> (u32, u32) {
    let parsed = |name: &str| match cell.value().attr(name) {
        None => Some(1),
        Some(v) => v.trim().parse::<u32>().ok(),
    };
    match (parsed("rowspan"), parsed("colspan")) {
        (Some(rows), Some(cols)) => (rows, cols),
        _ => (1, 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(html: &str) -> Document {
        Document::parse(html, None)
    }

    fn table_of(document: &Document) -> ElementRef<'_> {
        document.select_one("table").unwrap().unwrap()
    }

    #[test]
    fn span_free_table_is_identity() {
        let d = doc(
            "<table>
                <tr><th>a</th><th>b</th></tr>
                <tr><td>1</td><td>2</td></tr>
                <tr><td>3</td><td>4</td></tr>
            </table>",
        );
        let matrix = reconstruct(&table_of(&d));
        assert_eq!(
            matrix,
            vec![
                vec!["a".to_string(), "b".to_string()],
                vec!["1".to_string(), "2".to_string()],
                vec!["3".to_string(), "4".to_string()],
            ]
        );
    }

    #[test]
    fn ragged_rows_are_right_padded() {
        let d = doc(
            "<table>
                <tr><td>a</td><td>b</td><td>c</td></tr>
                <tr><td>d</td></tr>
            </table>",
        );
        let matrix = reconstruct(&table_of(&d));
        assert!(matrix.iter().all(|row| row.len() == 3));
        assert_eq!(matrix[1], vec!["d", "", ""]);
    }

    #[test]
    fn two_by_two_span_block_repeats_everywhere_it_covers() {
        let d = doc(
            "<table>
                <tr><td rowspan='2' colspan='2'>X</td><td>r1</td></tr>
                <tr><td>r2</td></tr>
            </table>",
        );
        let matrix = reconstruct(&table_of(&d));
        assert_eq!(matrix[0], vec!["X", "X", "r1"]);
        assert_eq!(matrix[1], vec!["X", "X", "r2"]);
    }

    #[test]
    fn rowspan_repeats_value_down_a_category_column() {
        let d = doc(
            "<table>
                <tr><td rowspan='3'>fruit</td><td>apple</td></tr>
                <tr><td>pear</td></tr>
                <tr><td>plum</td></tr>
                <tr><td>veg</td><td>kale</td></tr>
            </table>",
        );
        let matrix = reconstruct(&table_of(&d));
        assert_eq!(matrix[0], vec!["fruit", "apple"]);
        assert_eq!(matrix[1], vec!["fruit", "pear"]);
        assert_eq!(matrix[2], vec!["fruit", "plum"]);
        assert_eq!(matrix[3], vec!["veg", "kale"]);
    }

    #[test]
    fn colspan_header_over_narrow_body() {
        let d = doc(
            "<table>
                <tr><th colspan='3'>wide</th></tr>
                <tr><td>a</td><td>b</td><td>c</td></tr>
            </table>",
        );
        let matrix = reconstruct(&table_of(&d));
        assert_eq!(matrix[0], vec!["wide", "wide", "wide"]);
        assert_eq!(matrix[1], vec!["a", "b", "c"]);
    }

    #[test]
    fn malformed_span_collapses_both_to_one() {
        let d = doc(
            "<table>
                <tr><td rowspan='abc' colspan='3'>m</td><td>n</td></tr>
                <tr><td>o</td><td>p</td></tr>
            </table>",
        );
        let matrix = reconstruct(&table_of(&d));
        // rowspan failing to parse also cancels the numeric colspan.
        assert_eq!(matrix[0], vec!["m", "n"]);
        assert_eq!(matrix[1], vec!["o", "p"]);
    }

    #[test]
    fn surrounding_whitespace_in_span_values_is_tolerated() {
        let d = doc(
            "<table>
                <tr><td colspan=' 2 '>w</td></tr>
                <tr><td>a</td><td>b</td></tr>
            </table>",
        );
        let matrix = reconstruct(&table_of(&d));
        assert_eq!(matrix[0], vec!["w", "w"]);
    }

    #[test]
    fn zero_colspan_vanishes_the_cell() {
        let d = doc(
            "<table>
                <tr><td colspan='0'>ghost</td><td>real</td></tr>
            </table>",
        );
        let matrix = reconstruct(&table_of(&d));
        assert_eq!(matrix, vec![vec!["real".to_string()]]);
    }

    #[test]
    fn cell_text_is_flattened_and_collapsed() {
        let d = doc(
            "<table><tr><td>  Hello <b>big</b>\n world </td></tr></table>",
        );
        let matrix = reconstruct(&table_of(&d));
        assert_eq!(matrix[0][0], "Hello big world");
    }

    #[test]
    fn largest_table_prefers_most_rows_and_first_on_ties() {
        let d = doc(
            "<table id='small'><tr><td>1</td></tr></table>
             <table id='first-big'><tr><td>1</td></tr><tr><td>2</td></tr></table>
             <table id='second-big'><tr><td>1</td></tr><tr><td>2</td></tr></table>",
        );
        let chosen = largest_table(&d, "table").unwrap().unwrap();
        assert_eq!(chosen.value().id(), Some("first-big"));
    }

    #[test]
    fn extract_table_uses_wiki_default_and_reports_absence() {
        let d = doc(
            "<table class='wikitable'><tr><td>w</td></tr></table>
             <table><tr><td>plain1</td></tr><tr><td>plain2</td></tr></table>",
        );
        let matrix = extract_table(&d, None).unwrap().unwrap();
        assert_eq!(matrix, vec![vec!["w".to_string()]]);

        let none = extract_table(&doc("<p>no tables</p>"), None).unwrap();
        assert!(none.is_none());

        assert!(extract_table(&d, Some("table[[")).is_err());
    }
}
