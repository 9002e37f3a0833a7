use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{BrowseError, Result};

// ---------------------------------------------------------------------------
// Value – a single cell of a table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common dataframe dtypes.
/// Used as a frequency key downstream, so `Value` must be `Ord` + `Hash`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// ISO-8601 date/time kept as text.
    Date(String),
    Null,
}

// -- Manual Eq/Ord so we can count and dedupe values --

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        use Value::*;
        fn discriminant(v: &Value) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
                Date(_) => 5,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) | (Date(a), Date(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::String(s) | Value::Date(s) => s.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Null => {}
        }
    }
}

/// UI rendering: floats to four decimals, null as `<null>`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v:.4}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Date(d) => write!(f, "{d}"),
            Value::Null => write!(f, "<null>"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl Value {
    /// Interpret the value as an `f64` for statistics.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Null, or a float NaN.
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Float(v) => v.is_nan(),
            _ => false,
        }
    }

    /// Raw text form used for searching and exporting. `None` for null.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Value::String(s) | Value::Date(s) => Some(Cow::Borrowed(s.as_str())),
            Value::Integer(i) => Some(Cow::Owned(i.to_string())),
            // Debug keeps the shortest round-trip digits and a trailing `.0`.
            Value::Float(v) => Some(Cow::Owned(format!("{v:?}"))),
            Value::Bool(b) => Some(Cow::Borrowed(if *b { "true" } else { "false" })),
            Value::Null => None,
        }
    }

    /// Comparison within one kind of value: numbers (integer and float may
    /// mix), strings, booleans or dates. Anything else is incomparable.
    pub fn natural_cmp(&self, other: &Value) -> Option<Ordering> {
        use Value::*;
        match (self, other) {
            (Integer(a), Integer(b)) => Some(a.cmp(b)),
            (String(a), String(b)) | (Date(a), Date(b)) => Some(a.cmp(b)),
            (Bool(a), Bool(b)) => Some(a.cmp(b)),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => None,
            },
        }
    }

    fn kind(&self) -> Option<ColumnType> {
        match self {
            Value::Null => None,
            Value::Integer(_) => Some(ColumnType::Integer),
            Value::Float(_) => Some(ColumnType::Float),
            Value::Bool(_) => Some(ColumnType::Boolean),
            Value::Date(_) => Some(ColumnType::Datetime),
            Value::String(_) => Some(ColumnType::Text),
        }
    }
}

// ---------------------------------------------------------------------------
// ColumnType – storage type observed on a loaded column
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    /// Every cell is null.
    Empty,
    Integer,
    Float,
    Boolean,
    Datetime,
    Text,
    /// Cells of more than one kind.
    Mixed,
}

impl ColumnType {
    /// Infer the type from a column's cells, ignoring nulls.
    pub fn infer<'a>(values: impl IntoIterator<Item = &'a Value>) -> Self {
        let mut seen: Option<ColumnType> = None;
        for kind in values.into_iter().filter_map(Value::kind) {
            seen = Some(match (seen, kind) {
                (None, k) => k,
                (Some(a), b) if a == b => a,
                (Some(ColumnType::Integer), ColumnType::Float)
                | (Some(ColumnType::Float), ColumnType::Integer) => ColumnType::Float,
                _ => return ColumnType::Mixed,
            });
        }
        seen.unwrap_or(ColumnType::Empty)
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }

    /// The generic "object" storage class: strings, mixed cells or nothing.
    pub fn is_textual(self) -> bool {
        matches!(self, ColumnType::Text | ColumnType::Mixed | ColumnType::Empty)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Empty => "empty",
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Boolean => "boolean",
            ColumnType::Datetime => "datetime",
            ColumnType::Text => "text",
            ColumnType::Mixed => "mixed",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Table – ordered named columns, rows of cells
// ---------------------------------------------------------------------------

pub type Row = Vec<Value>;

/// An immutable-by-convention snapshot of tabular data.
///
/// Every row has exactly one cell per declared column; missing values are
/// `Value::Null`, never absent.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    /// An empty table with the given columns.
    pub fn new(columns: Vec<String>) -> Self {
        Table {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table, rejecting rows whose width differs from `columns`.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Row>) -> Result<Self> {
        if let Some((row, r)) = rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != columns.len())
        {
            return Err(BrowseError::RowWidth {
                row,
                expected: columns.len(),
                found: r.len(),
            });
        }
        Ok(Table { columns, rows })
    }

    /// Build a table from records of `(column, value)` pairs. Columns are
    /// ordered by first appearance; keys absent from a record become null.
    pub fn from_records<I, R>(records: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = (String, Value)>,
    {
        let mut columns: Vec<String> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut sparse: Vec<Vec<(usize, Value)>> = Vec::new();

        for record in records {
            let mut cells = Vec::new();
            for (key, value) in record {
                let idx = *index.entry(key.clone()).or_insert_with(|| {
                    columns.push(key);
                    columns.len() - 1
                });
                cells.push((idx, value));
            }
            sparse.push(cells);
        }

        let width = columns.len();
        let rows = sparse
            .into_iter()
            .map(|cells| {
                let mut row = vec![Value::Null; width];
                for (idx, value) in cells {
                    row[idx] = value;
                }
                row
            })
            .collect();
        Table { columns, rows }
    }

    pub fn push_row(&mut self, row: Row) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(BrowseError::RowWidth {
                row: self.rows.len(),
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cell lookup by row index and column name.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let col = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[col])
    }

    /// Iterate the cells of one column.
    pub fn column_values(&self, col: usize) -> impl Iterator<Item = &Value> + '_ {
        self.rows.iter().map(move |r| &r[col])
    }

    pub fn column_type(&self, col: usize) -> ColumnType {
        ColumnType::infer(self.column_values(col))
    }

    /// A new table holding the given rows, in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }

    /// Rows `start..end`, with both bounds clamped to the table.
    pub fn slice(&self, start: usize, end: usize) -> Table {
        let end = end.min(self.rows.len());
        let start = start.min(end);
        Table {
            columns: self.columns.clone(),
            rows: self.rows[start..end].to_vec(),
        }
    }

    /// Keep only the named columns, in the given order. Names not present in
    /// the table are skipped.
    pub fn project(&self, names: &[&str]) -> Table {
        let picked: Vec<(usize, &str)> = names
            .iter()
            .filter_map(|n| self.column_index(n).map(|i| (i, *n)))
            .collect();
        Table {
            columns: picked.iter().map(|(_, n)| n.to_string()).collect(),
            rows: self
                .rows
                .iter()
                .map(|r| picked.iter().map(|(i, _)| r[*i].clone()).collect())
                .collect(),
        }
    }

    /// Drop the named columns if present.
    pub fn without_columns(&self, names: &[&str]) -> Table {
        let keep: Vec<&str> = self
            .columns
            .iter()
            .map(String::as_str)
            .filter(|c| !names.contains(c))
            .collect();
        self.project(&keep)
    }

    /// A copy with a leading `name` column numbering the rows from 1.
    pub fn numbered(&self, name: &str) -> Table {
        let mut columns = Vec::with_capacity(self.columns.len() + 1);
        columns.push(name.to_string());
        columns.extend(self.columns.iter().cloned());
        let rows = self
            .rows
            .iter()
            .enumerate()
            .map(|(i, r)| {
                let mut row = Vec::with_capacity(r.len() + 1);
                row.push(Value::Integer(i as i64 + 1));
                row.extend(r.iter().cloned());
                row
            })
            .collect();
        Table { columns, rows }
    }

    /// Rename a column in place. Returns `false` when `from` does not exist.
    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        match self.column_index(from) {
            Some(i) => {
                self.columns[i] = to.to_string();
                true
            }
            None => false,
        }
    }

    /// Append a column holding `fill` in every row.
    pub fn push_column(&mut self, name: &str, fill: Value) {
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(fill.clone());
        }
    }

    /// Convert integer cells to floats in columns that mix both, so that a
    /// column has a single numeric storage type.
    pub fn promote_numeric_columns(&mut self) {
        for col in 0..self.columns.len() {
            if self.column_type(col) != ColumnType::Float {
                continue;
            }
            for row in &mut self.rows {
                if let Value::Integer(i) = row[col] {
                    row[col] = Value::Float(i as f64);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn from_rows_rejects_ragged_rows() {
        let err = Table::from_rows(
            cols(&["a", "b"]),
            vec![vec![Value::Integer(1), Value::Integer(2)], vec![Value::Null]],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            BrowseError::RowWidth {
                row: 1,
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn from_records_fills_missing_keys_with_null() {
        let t = Table::from_records(vec![
            vec![("a".to_string(), Value::Integer(1))],
            vec![("b".to_string(), Value::from("x"))],
        ]);
        assert_eq!(t.columns(), &["a", "b"]);
        assert_eq!(t.get(0, "b"), Some(&Value::Null));
        assert_eq!(t.get(1, "a"), Some(&Value::Null));
    }

    #[test]
    fn project_skips_unknown_columns() {
        let t = Table::from_rows(cols(&["a", "b", "c"]), vec![vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)]])
            .unwrap();
        let p = t.project(&["c", "zzz", "a"]);
        assert_eq!(p.columns(), &["c", "a"]);
        assert_eq!(p.rows()[0], vec![Value::Integer(3), Value::Integer(1)]);
    }

    #[test]
    fn column_type_inference() {
        let ints = [Value::Integer(1), Value::Null, Value::Integer(3)];
        assert_eq!(ColumnType::infer(&ints), ColumnType::Integer);

        let nums = [Value::Integer(1), Value::from(2.5)];
        assert_eq!(ColumnType::infer(&nums), ColumnType::Float);

        let mixed = [Value::Integer(1), Value::from("x")];
        assert_eq!(ColumnType::infer(&mixed), ColumnType::Mixed);

        assert_eq!(ColumnType::infer(&[Value::Null]), ColumnType::Empty);
    }

    #[test]
    fn promote_numeric_columns_converts_integers() {
        let mut t = Table::from_rows(
            cols(&["x", "id"]),
            vec![
                vec![Value::Integer(1), Value::Integer(1)],
                vec![2.5.into(), Value::Integer(2)],
            ],
        )
        .unwrap();
        t.promote_numeric_columns();
        assert_eq!(t.get(0, "x"), Some(&Value::Float(1.0)));
        assert_eq!(t.get(0, "id"), Some(&Value::Integer(1)));
    }

    #[test]
    fn natural_cmp_mixes_numbers_but_not_kinds() {
        assert_eq!(
            Value::Integer(2).natural_cmp(&Value::from(1.5)),
            Some(Ordering::Greater)
        );
        assert_eq!(Value::from("a").natural_cmp(&Value::Integer(1)), None);
    }

    #[test]
    fn as_text_renders_raw_values() {
        assert_eq!(Value::from(1.0).as_text().as_deref(), Some("1.0"));
        assert_eq!(Value::Integer(7).as_text().as_deref(), Some("7"));
        assert_eq!(Value::Null.as_text(), None);
    }
}
