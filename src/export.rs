//! Flat-file export of extracted data.

use std::path::Path;

use tracing::debug;

use crate::error::Result;
use crate::extract::table::TableMatrix;

/// Write a matrix to a CSV file, creating parent directories as needed.
pub fn save_csv(matrix: &TableMatrix, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)?;
    for row in matrix {
        writer.write_record(row)?;
    }
    writer.flush()?;
    debug!(path = %path.display(), rows = matrix.len(), "saved CSV");
    Ok(())
}

/// Write a JSON value to a file, pretty-printed, creating parent
/// directories as needed.
pub fn save_json(value: &serde_json::Value, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    let text = serde_json::to_string_pretty(value).expect("Value serialization is infallible");
    std::fs::write(path, text)?;
    debug!(path = %path.display(), "saved JSON");
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_roundtrips_rows_and_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/tables/data.csv");
        let matrix = vec![
            vec!["name".to_string(), "qty".to_string()],
            vec!["apples, green".to_string(), "3".to_string()],
        ];

        save_csv(&matrix, &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("name,qty"));
        // Commas in values stay quoted.
        assert!(written.contains("\"apples, green\",3"));
    }

    #[test]
    fn json_is_pretty_printed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        let value = serde_json::json!({"items": ["a", "b"]});

        save_json(&value, &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"items\""));
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&written).unwrap(),
            value
        );
    }
}
