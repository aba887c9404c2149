// src/storage/mod.rs
use std::fs;
use std::path::{Path, PathBuf};
use crate::extractors::table::ExtractedTable;
use crate::utils::error::StorageError;

pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    /// Creates a new StorageManager with the specified base directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        // Create the base directory if it doesn't exist
        if !base_path.exists() {
            fs::create_dir_all(&base_path)
                .map_err(StorageError::IoError)?;
        }

        Ok(Self { base_dir: base_path })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Writes the table as `table_{n}.csv`, `n` being the one-based table position.
    /// The header line is the union of keys over all records.
    pub fn save_table_csv(&self, table: &ExtractedTable) -> Result<PathBuf, StorageError> {
        let file_path = self.base_dir.join(format!("table_{}.csv", table.index + 1));
        let columns = table.columns();

        let mut writer = csv::Writer::from_path(&file_path)?;

        if !columns.is_empty() {
            writer.write_record(&columns)?;
            for record in &table.records {
                writer.write_record(columns.iter().map(|c| record.get(c).unwrap_or("")))?;
            }
        } else {
            tracing::warn!("Table #{} has no records, writing an empty CSV file", table.index);
        }

        writer.flush().map_err(StorageError::IoError)?;

        tracing::info!("Saved table to {}", file_path.display());

        Ok(file_path)
    }

    /// Saves metadata about the table in JSON format next to the CSV file
    pub fn save_table_metadata(&self, table: &ExtractedTable, source_url: &str) -> Result<PathBuf, StorageError> {
        let file_path = self.base_dir.join(format!("table_{}_meta.json", table.index + 1));

        let metadata = serde_json::json!({
            "source_url": source_url,
            "table_index": table.index,
            "mode": table.mode,
            "titles": table.titles,
            "columns": table.columns(),
            "row_count": table.records.len(),
            "extraction_timestamp": chrono::Utc::now().to_rfc3339(),
        });

        let metadata_str = serde_json::to_string_pretty(&metadata)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        fs::write(&file_path, metadata_str)
            .map_err(StorageError::IoError)?;

        tracing::info!("Saved metadata to {}", file_path.display());

        Ok(file_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::table::{ExtractionMode, Record};

    fn sample_table() -> ExtractedTable {
        let records: Vec<Record> = vec![
            [("Name", "Alice")].into_iter().collect(),
            [("Name", "Bob"), ("Age", "25")].into_iter().collect(),
        ];
        ExtractedTable {
            index: 2,
            mode: ExtractionMode::AutoForced,
            titles: vec!["Name".to_string(), "Age".to_string()],
            records,
        }
    }

    #[test]
    fn test_creates_missing_output_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("out").join("tables");

        let storage = StorageManager::new(&nested).unwrap();
        assert!(nested.is_dir());
        assert_eq!(storage.base_dir(), nested.as_path());
    }

    #[test]
    fn test_csv_header_is_union_of_all_records() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = StorageManager::new(tmp.path()).unwrap();

        let path = storage.save_table_csv(&sample_table()).unwrap();
        assert_eq!(path.file_name().unwrap(), "table_3.csv");

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, "Name,Age\nAlice,\nBob,25\n");
    }

    #[test]
    fn test_csv_quotes_delimiters() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = StorageManager::new(tmp.path()).unwrap();
        let table = ExtractedTable {
            index: 0,
            mode: ExtractionMode::Headers,
            titles: vec!["City".to_string()],
            records: vec![[("City", "Portland, OR")].into_iter().collect()],
        };

        let path = storage.save_table_csv(&table).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "City\n\"Portland, OR\"\n");
    }

    #[test]
    fn test_empty_table_writes_empty_csv() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = StorageManager::new(tmp.path()).unwrap();
        let table = ExtractedTable {
            index: 0,
            mode: ExtractionMode::Forced,
            titles: vec!["A".to_string()],
            records: Vec::new(),
        };

        let path = storage.save_table_csv(&table).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "");
    }

    #[test]
    fn test_metadata_describes_table() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = StorageManager::new(tmp.path()).unwrap();

        let path = storage.save_table_metadata(&sample_table(), "https://example.com/t").unwrap();
        assert_eq!(path.file_name().unwrap(), "table_3_meta.json");

        let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(json["source_url"], "https://example.com/t");
        assert_eq!(json["table_index"], 2);
        assert_eq!(json["mode"], "auto_forced");
        assert_eq!(json["row_count"], 2);
        assert_eq!(json["columns"], serde_json::json!(["Name", "Age"]));
        assert!(json["extraction_timestamp"].is_string());
    }
}
