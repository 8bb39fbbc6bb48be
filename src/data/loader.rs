use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{Array, AsArray};
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type,
};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::model::{Cell, HealthTable};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("data file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("parsing JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid JSON layout: {0}")]
    InvalidJson(String),

    #[error("reading parquet: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("decoding parquet batch: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

impl LoadError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            LoadError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            LoadError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load and clean a health dataset.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`            – comma-delimited with a header row
/// * `.tsv` / `.tab`   – tab-delimited with a header row
/// * `.json`           – `[{ "gender": "Female", "age": 45, ... }, ...]`
/// * `.parquet`/`.pq`  – flat columns, as written by Pandas or Polars
pub fn load(path: &Path) -> Result<HealthTable, LoadError> {
    // Only a missing file is `NotFound`; permission and other failures stay `Io`.
    std::fs::metadata(path).map_err(|e| LoadError::io(path, e))?;

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" => load_delimited(path, b',')?,
        "tsv" | "tab" => load_delimited(path, b'\t')?,
        "json" => load_json(path)?,
        "parquet" | "pq" => load_parquet(path)?,
        other => return Err(LoadError::UnsupportedFormat(other.to_string())),
    };

    log::info!(
        "Loaded {} records from {} with columns {:?}",
        table.len(),
        path.display(),
        table.schema.present_columns()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// Delimited loader
// ---------------------------------------------------------------------------

fn load_delimited(path: &Path, delimiter: u8) -> Result<HealthTable, LoadError> {
    let file = std::fs::File::open(path).map_err(|e| LoadError::io(path, e))?;
    read_delimited(file, delimiter)
}

/// Parse delimited text with a header row from any reader.
pub fn read_delimited<R: Read>(reader: R, delimiter: u8) -> Result<HealthTable, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(Cell::from_field).collect());
    }

    Ok(HealthTable::from_cells(&headers, rows))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the default `df.to_json(orient='records')`.
/// Keys missing from a record read as null.
fn load_json(path: &Path) -> Result<HealthTable, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
    parse_json(&text)
}

pub fn parse_json(text: &str) -> Result<HealthTable, LoadError> {
    let root: JsonValue = serde_json::from_str(text)?;

    let records = root
        .as_array()
        .ok_or_else(|| LoadError::InvalidJson("expected top-level JSON array".into()))?;

    // Header order follows first appearance across records.
    let mut headers: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| LoadError::InvalidJson(format!("row {i} is not a JSON object")))?;
        for key in obj.keys() {
            if !headers.iter().any(|h| h == key) {
                headers.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .filter_map(|rec| rec.as_object())
        .map(|obj| {
            headers
                .iter()
                .map(|h| obj.get(h).map(json_to_cell).unwrap_or(Cell::Null))
                .collect()
        })
        .collect();

    Ok(HealthTable::from_cells(&headers, rows))
}

fn json_to_cell(val: &JsonValue) -> Cell {
    match val {
        JsonValue::String(s) => Cell::from_field(s),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Cell::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Cell::Float(f)
            } else {
                Cell::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => Cell::Bool(*b),
        JsonValue::Null => Cell::Null,
        other => Cell::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of flat health columns.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`). Nested columns are read as text.
fn load_parquet(path: &Path) -> Result<HealthTable, LoadError> {
    let file = std::fs::File::open(path).map_err(|e| LoadError::io(path, e))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().trim().to_string())
        .collect();
    let reader = builder.build()?;

    let mut rows: Vec<Vec<Cell>> = Vec::new();
    for batch_result in reader {
        let batch = batch_result?;
        let start = rows.len();
        rows.extend((0..batch.num_rows()).map(|_| Vec::with_capacity(headers.len())));

        for col in batch.columns() {
            for row in 0..batch.num_rows() {
                rows[start + row].push(arrow_cell(col, row));
            }
        }
    }

    Ok(HealthTable::from_cells(&headers, rows))
}

/// Extract a single cell from an Arrow column at a given row.
fn arrow_cell(col: &Arc<dyn Array>, row: usize) -> Cell {
    if col.is_null(row) {
        return Cell::Null;
    }
    match col.data_type() {
        DataType::Utf8 => col
            .as_string_opt::<i32>()
            .map_or(Cell::Null, |s| Cell::from_field(s.value(row))),
        DataType::LargeUtf8 => col
            .as_string_opt::<i64>()
            .map_or(Cell::Null, |s| Cell::from_field(s.value(row))),
        DataType::Int8 => int_cell(
            col.as_primitive_opt::<Int8Type>()
                .map(|a| i64::from(a.value(row))),
        ),
        DataType::Int16 => int_cell(
            col.as_primitive_opt::<Int16Type>()
                .map(|a| i64::from(a.value(row))),
        ),
        DataType::Int32 => int_cell(
            col.as_primitive_opt::<Int32Type>()
                .map(|a| i64::from(a.value(row))),
        ),
        DataType::Int64 => int_cell(col.as_primitive_opt::<Int64Type>().map(|a| a.value(row))),
        DataType::Float32 => col
            .as_primitive_opt::<Float32Type>()
            .map_or(Cell::Null, |a| Cell::Float(f64::from(a.value(row)))),
        DataType::Float64 => col
            .as_primitive_opt::<Float64Type>()
            .map_or(Cell::Null, |a| Cell::Float(a.value(row))),
        DataType::Boolean => col
            .as_boolean_opt()
            .map_or(Cell::Null, |a| Cell::Bool(a.value(row))),
        other => match arrow::util::display::array_value_to_string(col, row) {
            Ok(s) => Cell::from_field(&s),
            Err(e) => {
                log::warn!("Ignoring parquet value of type {other:?}: {e}");
                Cell::Null
            }
        },
    }
}

fn int_cell(value: Option<i64>) -> Cell {
    value.map_or(Cell::Null, Cell::Integer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Condition, Flag};

    const SAMPLE: &str = "\
gender,age,diabetes,location
Female,45,yes,Alabama
Male,30,no,Alaska
Female,50,Yes,Alabama
";

    #[test]
    fn reads_csv_and_normalizes_flags() {
        let table = read_delimited(SAMPLE.as_bytes(), b',').unwrap();
        let flags: Vec<Flag> = table
            .records
            .iter()
            .map(|r| r.flag(Condition::Diabetes))
            .collect();
        assert_eq!(flags, vec![Flag::Yes, Flag::No, Flag::Yes]);
        assert!(table.schema.location);
        assert!(!table.schema.year);
    }

    #[test]
    fn reads_tab_delimited_and_trims_headers() {
        let text = " gender \tage\nMale\t61\n";
        let table = read_delimited(text.as_bytes(), b'\t').unwrap();
        assert!(table.schema.gender);
        assert_eq!(table.records[0].age, Some(61.0));
    }

    #[test]
    fn ragged_csv_is_an_error() {
        let text = "gender,age\nMale,30,extra\n";
        let err = read_delimited(text.as_bytes(), b',').unwrap_err();
        assert!(matches!(err, LoadError::Csv(_)));
    }

    #[test]
    fn parses_json_records_with_typed_values() {
        let text = r#"[
            {"gender": "Female", "age": 45, "smoking": 1.0},
            {"gender": "Male", "age": "old", "smoking": false, "year": 2019}
        ]"#;
        let table = parse_json(text).unwrap();
        assert!(table.schema.year);
        assert_eq!(table.records[0].flag(Condition::Smoking), Flag::Yes);
        assert_eq!(table.records[1].flag(Condition::Smoking), Flag::No);
        assert_eq!(table.records[1].age, None);
        assert_eq!(table.records[0].year, None);
        assert_eq!(table.records[1].year, Some(2019.0));
    }

    #[test]
    fn json_must_be_an_array_of_objects() {
        assert!(matches!(
            parse_json(r#"{"gender": "Male"}"#),
            Err(LoadError::InvalidJson(_))
        ));
        assert!(matches!(parse_json("[1, 2]"), Err(LoadError::InvalidJson(_))));
        assert!(matches!(parse_json("[{"), Err(LoadError::Json(_))));
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = load(Path::new("definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, LoadError::NotFound { .. }));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn unreadable_path_is_an_io_error_not_missing() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain.csv");
        std::fs::write(&file, "gender\nMale\n").unwrap();

        // A regular file used as a directory exists on disk but cannot be read through.
        let err = load(&file.join("nested.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }), "got {err:?}");
    }

    #[test]
    fn permission_denied_maps_to_io() {
        let denied = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        let err = LoadError::io(Path::new("locked.csv"), denied);
        assert!(matches!(err, LoadError::Io { ref path, .. } if path == Path::new("locked.csv")));

        let missing = std::io::Error::from(std::io::ErrorKind::NotFound);
        let err = LoadError::io(Path::new("gone.csv"), missing);
        assert!(matches!(err, LoadError::NotFound { .. }));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.xlsx");
        std::fs::write(&path, "gender\nMale\n").unwrap();
        assert!(matches!(load(&path), Err(LoadError::UnsupportedFormat(ext)) if ext == "xlsx"));
    }
}
