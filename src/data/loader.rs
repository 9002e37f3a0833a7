use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, bail};
use arrow::array::{Array, AsArray};
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type, UInt16Type,
    UInt32Type, UInt64Type, UInt8Type,
};
use arrow::util::display::array_value_to_string;
use calamine::{Data, Reader, Sheets, open_workbook_auto, open_workbook_auto_from_rs};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Table, Value};
use crate::error::{BrowseError, Result};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Supported on-disk formats, picked from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Workbook,
    Csv,
    Json,
    Parquet,
}

impl Format {
    pub fn from_name(name: &str) -> Result<Format> {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(Format::Workbook),
            "csv" => Ok(Format::Csv),
            "json" => Ok(Format::Json),
            "parquet" | "pq" => Ok(Format::Parquet),
            other => Err(BrowseError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Load a table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx` / `.xls` / `.ods` – workbook; `sheet` picks a sheet by name,
///   default is the first one
/// * `.csv`     – header row, cell types guessed per value
/// * `.json`    – `[{ "col": value, ... }, ...]`
/// * `.parquet` – any flat schema
pub fn load_file(path: &Path, sheet: Option<&str>) -> Result<Table> {
    if !path.exists() {
        return Err(BrowseError::SourceUnavailable(format!(
            "{} does not exist",
            path.display()
        )));
    }
    let format = Format::from_name(&path.to_string_lossy())?;
    let mut table = match format {
        Format::Workbook => {
            let workbook = open_workbook_auto(path)
                .with_context(|| format!("opening workbook {}", path.display()))?;
            load_workbook(workbook, sheet)?
        }
        Format::Csv => {
            let reader = csv::Reader::from_path(path).context("opening CSV")?;
            load_csv(reader)?
        }
        Format::Json => {
            let text = std::fs::read_to_string(path).context("reading JSON file")?;
            load_json(&text)?
        }
        Format::Parquet => {
            let file = std::fs::File::open(path).context("opening parquet file")?;
            let builder =
                ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
            load_parquet(builder)?
        }
    };
    table.promote_numeric_columns();
    Ok(table)
}

/// Load a table from an in-memory buffer (an uploaded file). `file_name`
/// only serves to pick the format.
pub fn load_bytes(data: &[u8], file_name: &str, sheet: Option<&str>) -> Result<Table> {
    let format = Format::from_name(file_name)?;
    let mut table = match format {
        Format::Workbook => {
            let workbook = open_workbook_auto_from_rs(Cursor::new(data.to_vec()))
                .with_context(|| format!("opening workbook {file_name}"))?;
            load_workbook(workbook, sheet)?
        }
        Format::Csv => load_csv(csv::Reader::from_reader(data))?,
        Format::Json => {
            let text = std::str::from_utf8(data).context("JSON upload is not UTF-8")?;
            load_json(text)?
        }
        Format::Parquet => {
            let builder = ParquetRecordBatchReaderBuilder::try_new(bytes::Bytes::from(data.to_vec()))
                .context("reading parquet metadata")?;
            load_parquet(builder)?
        }
    };
    table.promote_numeric_columns();
    Ok(table)
}

/// Sheet names of a workbook file, in workbook order. Other formats hold a
/// single table, reported under the file stem.
pub fn sheet_names_from_path(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(BrowseError::SourceUnavailable(format!(
            "{} does not exist",
            path.display()
        )));
    }
    match Format::from_name(&path.to_string_lossy())? {
        Format::Workbook => {
            let workbook = open_workbook_auto(path)
                .with_context(|| format!("opening workbook {}", path.display()))?;
            Ok(workbook.sheet_names())
        }
        _ => Ok(vec![file_stem(&path.to_string_lossy())]),
    }
}

pub fn sheet_names_from_bytes(data: &[u8], file_name: &str) -> Result<Vec<String>> {
    match Format::from_name(file_name)? {
        Format::Workbook => {
            let workbook = open_workbook_auto_from_rs(Cursor::new(data.to_vec()))
                .with_context(|| format!("opening workbook {file_name}"))?;
            Ok(workbook.sheet_names())
        }
        _ => Ok(vec![file_stem(file_name)]),
    }
}

fn file_stem(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Blank header cells become `Unnamed: <i>`; repeated names get `.1`, `.2`
/// suffixes, skipping any suffixed name already taken.
fn clean_headers<I: IntoIterator<Item = String>>(raw: I) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    let mut next_suffix: HashMap<String, usize> = HashMap::new();
    raw.into_iter()
        .enumerate()
        .map(|(i, header)| {
            let header = header.trim();
            let base = if header.is_empty() {
                format!("Unnamed: {i}")
            } else {
                header.to_string()
            };
            let mut name = base.clone();
            if used.contains(&name) {
                let n = next_suffix.entry(base.clone()).or_insert(1);
                loop {
                    name = format!("{base}.{n}");
                    *n += 1;
                    if !used.contains(&name) {
                        break;
                    }
                }
            }
            used.insert(name.clone());
            name
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Workbook loader
// ---------------------------------------------------------------------------

/// The first row of the selected sheet is the header row.
fn load_workbook<RS: Read + Seek>(mut workbook: Sheets<RS>, sheet: Option<&str>) -> Result<Table> {
    let names = workbook.sheet_names();
    let name = match sheet {
        Some(wanted) if names.iter().any(|n| n == wanted) => wanted.to_string(),
        Some(wanted) => return Err(BrowseError::SheetNotFound(wanted.to_string())),
        None => names
            .first()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Workbook contains no sheets"))?,
    };

    let range = workbook
        .worksheet_range(&name)
        .with_context(|| format!("reading sheet {name}"))?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(Table::default());
    };
    let columns = clean_headers(header.iter().map(|c| match c {
        Data::Empty => String::new(),
        other => other.to_string(),
    }));

    let mut table = Table::new(columns);
    for row in rows {
        table.push_row(row.iter().map(workbook_cell).collect())?;
    }
    Ok(table)
}

fn workbook_cell(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::String(s) => Value::String(s.clone()),
        Data::Int(i) => Value::Integer(*i),
        // Spreadsheets store every number as a float; whole numbers read back
        // as integers and mixed columns are promoted again afterwards.
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => Value::Integer(*f as i64),
        Data::Float(f) => Value::Float(*f),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(d) => Value::Date(d.format("%Y-%m-%dT%H:%M:%S").to_string()),
            None => Value::Float(dt.as_f64()),
        },
        Data::DateTimeIso(s) => Value::Date(s.clone()),
        Data::DurationIso(s) => Value::String(s.clone()),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented):
///
/// ```json
/// [
///   { "dataset_id": "iris", "title": "Edgar Anderson's Iris Data", "rows": 150 },
///   ...
/// ]
/// ```
fn load_json(text: &str) -> Result<Table> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut parsed = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        parsed.push(
            obj.iter()
                .map(|(key, val)| (key.clone(), json_to_value(val)))
                .collect::<Vec<_>>(),
        );
    }

    Ok(Table::from_records(parsed))
}

fn json_to_value(val: &JsonValue) -> Value {
    match val {
        JsonValue::String(s) => Value::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Null => Value::Null,
        other => Value::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one record per line.
fn load_csv<R: Read>(mut reader: csv::Reader<R>) -> Result<Table> {
    let headers = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect::<Vec<_>>();
    let mut table = Table::new(clean_headers(headers));

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let row = (0..table.num_columns())
            .map(|i| guess_value_type(record.get(i).unwrap_or("")))
            .collect();
        table.push_row(row)?;
    }

    Ok(table)
}

fn guess_value_type(s: &str) -> Value {
    if s.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return Value::Float(f);
    }
    if s == "true" || s == "false" {
        return Value::Bool(s == "true");
    }
    Value::String(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load every column of a Parquet file. Files written by both Pandas
/// (`df.to_parquet()`) and Polars (`df.write_parquet()`) are accepted.
fn load_parquet<T>(builder: ParquetRecordBatchReaderBuilder<T>) -> Result<Table>
where
    T: parquet::file::reader::ChunkReader + 'static,
{
    let columns = clean_headers(
        builder
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone()),
    );
    let reader = builder.build().context("building parquet reader")?;

    let mut table = Table::new(columns);
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            let values = batch
                .columns()
                .iter()
                .map(|col| arrow_value(col, row))
                .collect::<anyhow::Result<Vec<_>>>()
                .with_context(|| format!("Row {row}"))?;
            table.push_row(values)?;
        }
    }
    Ok(table)
}

/// Extract a single cell from an Arrow column at a given row.
fn arrow_value(col: &Arc<dyn Array>, row: usize) -> anyhow::Result<Value> {
    if col.is_null(row) {
        return Ok(Value::Null);
    }
    let value = match col.data_type() {
        DataType::Utf8 => Value::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => Value::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int8 => Value::Integer(col.as_primitive::<Int8Type>().value(row) as i64),
        DataType::Int16 => Value::Integer(col.as_primitive::<Int16Type>().value(row) as i64),
        DataType::Int32 => Value::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => Value::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::UInt8 => Value::Integer(col.as_primitive::<UInt8Type>().value(row) as i64),
        DataType::UInt16 => Value::Integer(col.as_primitive::<UInt16Type>().value(row) as i64),
        DataType::UInt32 => Value::Integer(col.as_primitive::<UInt32Type>().value(row) as i64),
        DataType::UInt64 => {
            let v = col.as_primitive::<UInt64Type>().value(row);
            match i64::try_from(v) {
                Ok(i) => Value::Integer(i),
                Err(_) => Value::Float(v as f64),
            }
        }
        DataType::Float32 => Value::Float(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => Value::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => Value::Bool(col.as_boolean().value(row)),
        DataType::Date32 | DataType::Date64 | DataType::Timestamp(_, _) => {
            Value::Date(array_value_to_string(col.as_ref(), row)?)
        }
        DataType::Null => Value::Null,
        DataType::List(_) | DataType::LargeList(_) | DataType::Struct(_) | DataType::Map(_, _) => {
            bail!("nested column type {:?} is not supported", col.data_type())
        }
        _ => Value::String(array_value_to_string(col.as_ref(), row)?),
    };
    Ok(value)
}
