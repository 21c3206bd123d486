//! In-memory CSV table with the handful of column operations the pipeline
//! stages need: append/replace a column, merge a column in by key, select,
//! reorder and truncate rows.
//!
//! Cells are kept as text. A blank cell is a missing value.

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::error::{LigscreenError, Result};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsvTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CsvTable {
    /// Build a table; rows are padded or truncated to the header width.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut r| {
                r.resize(width, String::new());
                r
            })
            .collect();
        Self { headers, rows }
    }

    /// Read a CSV file whose first record is the header.
    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(LigscreenError::MissingInput(path.to_path_buf()));
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)?;

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        debug!(path = %path.display(), rows = rows.len(), "Loaded CSV table");
        Ok(Self::new(headers, rows))
    }

    /// Write the table, creating parent directories when needed.
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Like [`column_index`](Self::column_index) but missing columns are an error.
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| LigscreenError::MissingColumn(name.to_string()))
    }

    pub fn value(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Numeric value of a cell; blank and `NaN` cells are missing.
    pub fn parse_f64(&self, row: usize, col: usize) -> Option<f64> {
        let raw = self.value(row, col).trim();
        if raw.is_empty() {
            return None;
        }
        raw.parse::<f64>().ok().filter(|v| v.is_finite())
    }

    /// Numeric view of a whole column.
    pub fn column_f64(&self, col: usize) -> Vec<Option<f64>> {
        (0..self.rows.len()).map(|r| self.parse_f64(r, col)).collect()
    }

    /// Assign a column: replaced in place when `name` exists, appended otherwise.
    pub fn set_column(&mut self, name: &str, values: Vec<String>) -> Result<()> {
        self.check_len(name, values.len())?;
        match self.column_index(name) {
            Some(col) => {
                for (row, v) in self.rows.iter_mut().zip(values) {
                    row[col] = v;
                }
            }
            None => {
                self.headers.push(name.to_string());
                for (row, v) in self.rows.iter_mut().zip(values) {
                    row.push(v);
                }
            }
        }
        Ok(())
    }

    /// Insert a new column at position `at` (clamped to the table width).
    pub fn insert_column(&mut self, at: usize, name: &str, values: Vec<String>) -> Result<()> {
        self.check_len(name, values.len())?;
        let at = at.min(self.headers.len());
        self.headers.insert(at, name.to_string());
        for (row, v) in self.rows.iter_mut().zip(values) {
            row.insert(at, v);
        }
        Ok(())
    }

    /// Merge-by-key: set column `name` to `lookup[key]` for every row, where the
    /// key is read from `key_col` and passed through [`normalize_key`].
    /// Unmatched rows get a blank cell. Returns the number of matched rows.
    pub fn map_column(
        &mut self,
        key_col: usize,
        name: &str,
        lookup: &HashMap<String, String>,
    ) -> Result<usize> {
        let mut matched = 0;
        let values: Vec<String> = (0..self.rows.len())
            .map(|r| {
                let key = normalize_key(self.value(r, key_col));
                match lookup.get(&key) {
                    Some(v) => {
                        matched += 1;
                        v.clone()
                    }
                    None => String::new(),
                }
            })
            .collect();
        self.set_column(name, values)?;
        Ok(matched)
    }

    /// Project onto the named columns, in the given order.
    pub fn select(&self, names: &[&str]) -> Result<CsvTable> {
        let indices = names
            .iter()
            .map(|n| self.require_column(n))
            .collect::<Result<Vec<_>>>()?;
        let headers = names.iter().map(|n| n.to_string()).collect();
        let rows = self
            .rows
            .iter()
            .map(|r| indices.iter().map(|&i| r[i].clone()).collect())
            .collect();
        Ok(CsvTable { headers, rows })
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> CsvTable {
        CsvTable {
            headers: self.headers.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Rows in the order given by `order` (indices into the current rows).
    pub fn reorder(&self, order: &[usize]) -> CsvTable {
        CsvTable {
            headers: self.headers.clone(),
            rows: order.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }

    fn check_len(&self, name: &str, got: usize) -> Result<()> {
        if got != self.rows.len() {
            return Err(LigscreenError::Parse(format!(
                "column '{}' has {} values for {} rows",
                name,
                got,
                self.rows.len()
            )));
        }
        Ok(())
    }
}

/// Canonical form of a join key.
///
/// Keys are trimmed, and integer-valued keys are rendered without leading zeros
/// or a fractional part, so `"7"`, `"07"` and `"7.0"` all join together.
pub fn normalize_key(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return i.to_string();
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
            return (f as i64).to_string();
        }
    }
    trimmed.to_string()
}

/// Render a float cell. Non-finite values become a blank (missing) cell.
pub fn format_float(value: f64) -> String {
    if value.is_finite() {
        value.to_string()
    } else {
        String::new()
    }
}

/// Render an optional float cell.
pub fn format_opt_float(value: Option<f64>) -> String {
    value.map(format_float).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn sample() -> CsvTable {
        CsvTable::new(
            vec!["smiles".into(), "id-num".into()],
            vec![
                vec!["CCO".into(), "0".into()],
                vec!["c1ccccc1".into(), "1".into()],
                vec!["CC(=O)O".into(), "2".into()],
            ],
        )
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key(" 7 "), "7");
        assert_eq!(normalize_key("007"), "7");
        assert_eq!(normalize_key("7.0"), "7");
        assert_eq!(normalize_key("7.5"), "7.5");
        assert_eq!(normalize_key("lig-a"), "lig-a");
    }

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(-9.723), "-9.723");
        assert_eq!(format_float(2.0), "2");
        assert_eq!(format_float(f64::NAN), "");
        assert_eq!(format_opt_float(None), "");
    }

    #[test]
    fn test_map_column_merges_by_key() {
        let mut table = sample();
        let lookup: HashMap<String, String> =
            [("0".to_string(), "-7.1".to_string()), ("2".to_string(), "-8.4".to_string())]
                .into_iter()
                .collect();
        let matched = table.map_column(1, "vina_affinity", &lookup).unwrap();
        assert_eq!(matched, 2);
        assert_eq!(table.headers().last().unwrap(), "vina_affinity");
        assert_eq!(table.parse_f64(0, 2), Some(-7.1));
        assert_eq!(table.parse_f64(1, 2), None);
        assert_eq!(table.value(1, 2), "");
    }

    #[test]
    fn test_set_column_replaces_existing() {
        let mut table = sample();
        table
            .set_column("id-num", vec!["a".into(), "b".into(), "c".into()])
            .unwrap();
        assert_eq!(table.headers().len(), 2);
        assert_eq!(table.value(2, 1), "c");
        assert!(table.set_column("short", vec!["x".into()]).is_err());
    }

    #[test]
    fn test_insert_select_reorder_head() {
        let mut table = sample();
        table
            .insert_column(1, "flag", vec!["y".into(), "n".into(), "y".into()])
            .unwrap();
        assert_eq!(table.headers(), &["smiles", "flag", "id-num"]);

        let selected = table.select(&["id-num", "smiles"]).unwrap();
        assert_eq!(selected.rows()[0], vec!["0".to_string(), "CCO".to_string()]);
        assert!(table.select(&["missing"]).is_err());

        let reordered = selected.reorder(&[2, 0, 1]).head(2);
        assert_eq!(reordered.len(), 2);
        assert_eq!(reordered.value(0, 0), "2");
        assert_eq!(reordered.value(1, 0), "0");
    }

    #[test]
    fn test_roundtrip_and_ragged_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("t.csv");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "a,b,c\n1,2\n3,4,5,6\n\n7,8,9\n").unwrap();

        let table = CsvTable::read(&path).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows()[0], vec!["1", "2", ""]);
        assert_eq!(table.rows()[1], vec!["3", "4", "5"]);

        let out = dir.path().join("out").join("copy.csv");
        table.write(&out).unwrap();
        let reread = CsvTable::read(&out).unwrap();
        assert_eq!(reread, table);
    }

    #[test]
    fn test_read_missing_file() {
        let err = CsvTable::read(Path::new("/nonexistent/table.csv")).unwrap_err();
        assert!(matches!(err, LigscreenError::MissingInput(_)));
    }
}
