//! Adapters from external inputs to a [`DataFrame`].

use crate::error::{AnalysisError, Result};
use polars::io::csv::read::{CsvParseOptions, CsvReadOptions};
use polars::prelude::*;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Rows sampled for CSV schema inference.
const INFER_SCHEMA_ROWS: usize = 1000;

static JSON_NULL: Value = Value::Null;

/// Load a CSV file with a header row.
///
/// Falls back to reading without quote handling, then to a cleaned copy of
/// the content, before giving up.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidInput`] when the file is missing or no
/// strategy can parse it.
pub fn load_csv(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(AnalysisError::InvalidInput(format!(
            "Input file not found: {}",
            path.display()
        )));
    }

    let quoted = read_with(
        CsvReadOptions::default()
            .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"'))),
        path,
    );
    let df = match quoted {
        Ok(df) => df,
        Err(e) => {
            debug!("Standard loading failed: {}", e);
            match read_with(CsvReadOptions::default(), path) {
                Ok(df) => df,
                Err(e) => {
                    debug!("Loading without quotes failed: {}", e);
                    read_cleaned(path)?
                }
            }
        }
    };

    info!("Loaded {}: {:?}", path.display(), df.shape());
    Ok(df)
}

fn read_with(options: CsvReadOptions, path: &Path) -> PolarsResult<DataFrame> {
    options
        .with_has_header(true)
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
}

fn read_cleaned(path: &Path) -> Result<DataFrame> {
    let content = std::fs::read_to_string(path)?;
    let cleaned = content
        .replace("\"\"\"", "\"")
        .replace("\"\"", "\"")
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .into_reader_with_file_handle(std::io::Cursor::new(cleaned))
        .finish()
        .map_err(|e| {
            AnalysisError::InvalidInput(format!("Could not parse {}: {}", path.display(), e))
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JsonColumnKind {
    Null,
    Bool,
    Int,
    Float,
    Str,
}

impl JsonColumnKind {
    fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Bool,
            Value::Number(n) if n.is_i64() => Self::Int,
            Value::Number(_) => Self::Float,
            _ => Self::Str,
        }
    }

    /// Narrowest kind that can hold both.
    fn merge(self, other: Self) -> Self {
        match (self, other) {
            (a, b) if a == b => a,
            (Self::Null, k) | (k, Self::Null) => k,
            (Self::Int, Self::Float) | (Self::Float, Self::Int) => Self::Float,
            _ => Self::Str,
        }
    }
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Build a frame from a JSON array of objects.
///
/// Columns appear in the order their keys are first met. Keys missing
/// from a record are null.
/// A column whose values mix kinds falls back to strings; integers mixed
/// with floats become floats.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidInput`] unless `records` is a non-empty
/// array of objects with at least one key.
pub fn frame_from_records(records: &Value) -> Result<DataFrame> {
    let rows = records.as_array().ok_or_else(|| {
        AnalysisError::InvalidInput("expected a JSON array of records".to_string())
    })?;

    let mut objects = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let object = row.as_object().ok_or_else(|| {
            AnalysisError::InvalidInput(format!("record {} is not a JSON object", i))
        })?;
        objects.push(object);
    }

    let mut names: Vec<&str> = Vec::new();
    for object in &objects {
        for key in object.keys() {
            if !names.contains(&key.as_str()) {
                names.push(key);
            }
        }
    }
    if names.is_empty() {
        return Err(AnalysisError::InvalidInput(
            "records contain no columns".to_string(),
        ));
    }

    let columns = names
        .iter()
        .map(|name| {
            let values: Vec<&Value> = objects
                .iter()
                .map(|o| o.get(*name).unwrap_or(&JSON_NULL))
                .collect();
            let kind = values
                .iter()
                .fold(JsonColumnKind::Null, |acc, v| acc.merge(JsonColumnKind::of(v)));
            debug!("Record column '{}' read as {:?}", name, kind);
            build_column(name, kind, &values)
        })
        .collect::<Vec<_>>();

    Ok(DataFrame::new(columns)?)
}

fn build_column(name: &str, kind: JsonColumnKind, values: &[&Value]) -> Column {
    match kind {
        JsonColumnKind::Bool => {
            let v: Vec<Option<bool>> = values.iter().map(|v| v.as_bool()).collect();
            Column::new(name.into(), v)
        }
        JsonColumnKind::Int => {
            let v: Vec<Option<i64>> = values.iter().map(|v| v.as_i64()).collect();
            Column::new(name.into(), v)
        }
        JsonColumnKind::Float => {
            let v: Vec<Option<f64>> = values.iter().map(|v| v.as_f64()).collect();
            Column::new(name.into(), v)
        }
        JsonColumnKind::Str | JsonColumnKind::Null => {
            let v: Vec<Option<String>> = values.iter().map(|v| value_to_string(v)).collect();
            Column::new(name.into(), v)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_frame_from_records_infers_kinds() {
        let records = json!([
            {"age": 34, "score": 4.5, "smoker": true, "city": "Lyon"},
            {"age": 41, "score": 3, "smoker": false, "city": null},
            {"age": null, "score": 2.5, "smoker": true}
        ]);
        let df = frame_from_records(&records).unwrap();

        assert_eq!(df.shape(), (3, 4));
        assert_eq!(df.column("age").unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column("score").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("smoker").unwrap().dtype(), &DataType::Boolean);
        assert_eq!(df.column("city").unwrap().dtype(), &DataType::String);
        assert_eq!(df.column("city").unwrap().null_count(), 2);
        assert_eq!(df.column("age").unwrap().null_count(), 1);
    }

    #[test]
    fn test_mixed_column_becomes_string() {
        let records = json!([{"code": 12}, {"code": "A7"}]);
        let df = frame_from_records(&records).unwrap();
        let code = df.column("code").unwrap();
        assert_eq!(code.dtype(), &DataType::String);
        assert_eq!(code.str().unwrap().get(0), Some("12"));
    }

    #[test]
    fn test_sparse_records_fill_nulls() {
        let records = json!([{"a": 1, "b": 2}, {"c": 3}]);
        let df = frame_from_records(&records).unwrap();
        assert_eq!(df.width(), 3);
        assert_eq!(df.column("a").unwrap().null_count(), 1);
        assert_eq!(df.column("c").unwrap().null_count(), 1);
    }

    #[test]
    fn test_rejects_non_tabular_input() {
        assert!(matches!(
            frame_from_records(&json!({"a": 1})),
            Err(AnalysisError::InvalidInput(_))
        ));
        assert!(matches!(
            frame_from_records(&json!([1, 2, 3])),
            Err(AnalysisError::InvalidInput(_))
        ));
        assert!(matches!(
            frame_from_records(&json!([])),
            Err(AnalysisError::InvalidInput(_))
        ));
        assert!(matches!(
            frame_from_records(&json!([{}, {}])),
            Err(AnalysisError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_load_csv_missing_file() {
        let err = load_csv("does/not/exist.csv").unwrap_err();
        assert!(err.is_input_error());
    }
}
