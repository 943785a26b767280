//! Document querying and structured extraction.

pub mod document;
pub mod table;

pub use document::{element_text, Document, SelectorInventory};
pub use table::{extract_table, largest_table, reconstruct, TableMatrix};

/// Collapse whitespace runs to single spaces and trim the ends.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
