use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use contracts::DemandRow;

/// Header line of the demand dataset. Written once when the file is created;
/// existing rows are never rewritten.
pub const CSV_HEADER: &str = "date,product_id,location_id,demand,price";

#[derive(Debug)]
pub enum StoreError {
    EmptyField(&'static str),
    Io(std::io::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyField(field) => write!(f, "demand row field must not be empty: {field}"),
            Self::Io(err) => write!(f, "demand csv write failed: {err}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Append-only store for the forecasting dataset. Each append lands as one
/// intact newline-terminated line; concurrent appenders may interleave lines
/// but never split one.
#[derive(Debug, Clone)]
pub struct DemandCsvStore {
    path: PathBuf,
}

impl DemandCsvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append_row(&self, row: &DemandRow) -> Result<(), StoreError> {
        validate_row(row)?;

        let needs_header = match std::fs::metadata(&self.path) {
            Ok(metadata) => metadata.len() == 0,
            Err(_) => true,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        // Header and first row go out in a single write so a fresh file never
        // holds a header with a torn first line.
        let mut payload = String::new();
        if needs_header {
            payload.push_str(CSV_HEADER);
            payload.push('\n');
        }
        payload.push_str(&row.to_csv_line());
        payload.push('\n');

        file.write_all(payload.as_bytes())?;
        Ok(())
    }
}

fn validate_row(row: &DemandRow) -> Result<(), StoreError> {
    if row.date.trim().is_empty() {
        return Err(StoreError::EmptyField("date"));
    }
    if row.product_id == 0 {
        return Err(StoreError::EmptyField("product_id"));
    }
    if row.location_id.trim().is_empty() {
        return Err(StoreError::EmptyField("location_id"));
    }
    if row.demand.trim().is_empty() {
        return Err(StoreError::EmptyField("demand"));
    }
    if row.price.trim().is_empty() {
        return Err(StoreError::EmptyField("price"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(product_id: u64) -> DemandRow {
        DemandRow {
            date: "2024-11-02".to_string(),
            product_id,
            location_id: "loc_9".to_string(),
            demand: "120".to_string(),
            price: "19.99".to_string(),
        }
    }

    #[test]
    fn fresh_file_gets_one_header_then_data_lines() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DemandCsvStore::new(dir.path().join("demand_data.csv"));

        for id in 1..=3 {
            store.append_row(&row(id)).expect("append");
        }

        let contents = std::fs::read_to_string(store.path()).expect("read back");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], CSV_HEADER);
        for (line, id) in lines[1..].iter().zip(1_u64..) {
            assert_eq!(*line, format!("2024-11-02,{id},loc_9,120,19.99"));
            assert_eq!(line.split(',').count(), 5);
        }
    }

    #[test]
    fn existing_rows_are_never_rewritten() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DemandCsvStore::new(dir.path().join("demand_data.csv"));

        store.append_row(&row(1)).expect("first append");
        let before = std::fs::read_to_string(store.path()).expect("read");

        store.append_row(&row(2)).expect("second append");
        let after = std::fs::read_to_string(store.path()).expect("read");

        assert!(after.starts_with(&before));
        assert_eq!(after.lines().count(), 3);
    }

    #[test]
    fn empty_fields_are_rejected_before_touching_the_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DemandCsvStore::new(dir.path().join("demand_data.csv"));

        let mut bad = row(1);
        bad.demand = "  ".to_string();
        assert!(matches!(
            store.append_row(&bad),
            Err(StoreError::EmptyField("demand"))
        ));
        assert!(!store.path().exists());
    }
}
