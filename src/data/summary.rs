use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::RangeInclusive;

use serde::Serialize;
use thiserror::Error;

use super::model::{ColumnType, Table, Value};

/// Columns with at most this many distinct values (null included) get a
/// value breakdown whatever their type.
pub const LOW_CARDINALITY_LIMIT: usize = 50;

/// Longest value breakdown reported per column.
pub const VALUE_COUNTS_LIMIT: usize = 100;

pub const PREVIEW_PAGE_SIZES: RangeInclusive<usize> = 5..=1000;
pub const DEFAULT_PREVIEW_PAGE_SIZE: usize = 20;

/// Why a summary section could not be produced. The other sections are
/// still reported.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SummaryError {
    #[error("cannot describe a table without columns")]
    NoColumns,

    #[error("the table has no numeric columns")]
    NoNumericColumns,

    #[error("column `{0}` does not exist")]
    UnknownColumn(String),
}

// ---------------------------------------------------------------------------
// Row sources and preview paging
// ---------------------------------------------------------------------------

/// Anything rows can be previewed from. A source may not know its length.
pub trait RowSource {
    fn column_names(&self) -> &[String];

    /// `None` when the length cannot be determined up front.
    fn row_count(&self) -> Option<usize>;

    fn head(&self, n: usize) -> Table;

    fn slice(&self, start: usize, end: usize) -> Table;
}

impl RowSource for Table {
    fn column_names(&self) -> &[String] {
        self.columns()
    }

    fn row_count(&self) -> Option<usize> {
        Some(self.len())
    }

    fn head(&self, n: usize) -> Table {
        Table::slice(self, 0, n)
    }

    fn slice(&self, start: usize, end: usize) -> Table {
        Table::slice(self, start, end)
    }
}

/// Rows × columns; either side may be unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Shape {
    pub rows: Option<usize>,
    pub columns: Option<usize>,
}

impl Shape {
    pub fn of<S: RowSource + ?Sized>(source: &S) -> Self {
        Shape {
            rows: source.row_count(),
            columns: Some(source.column_names().len()),
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn dim(d: Option<usize>) -> String {
            d.map_or_else(|| "N/A".to_string(), |n| n.to_string())
        }
        write!(f, "{} rows x {} columns", dim(self.rows), dim(self.columns))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewEnd {
    /// Inclusive 1-based index of the last row shown.
    Row(usize),
    Unknown,
}

impl fmt::Display for PreviewEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreviewEnd::Row(n) => write!(f, "{n}"),
            PreviewEnd::Unknown => write!(f, "∞"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Preview {
    pub rows: Table,
    /// 1-based index of the first row shown.
    pub start: usize,
    pub end: PreviewEnd,
}

/// `rows[offset .. min(offset + count, row_count)]`. A source of unknown
/// length yields its first `count` rows and an unknown end instead.
pub fn preview_slice<S: RowSource + ?Sized>(source: &S, offset: usize, count: usize) -> Preview {
    match source.row_count() {
        Some(n) => {
            let start = offset.min(n);
            let end = offset.saturating_add(count).min(n);
            Preview {
                rows: source.slice(start, end),
                start: start + 1,
                end: PreviewEnd::Row(end),
            }
        }
        None => {
            log::debug!("Row count unknown, previewing the first {count} rows");
            Preview {
                rows: source.head(count),
                start: offset + 1,
                end: PreviewEnd::Unknown,
            }
        }
    }
}

/// Number of preview pages, 1 when the length is unknown.
pub fn preview_pages<S: RowSource + ?Sized>(source: &S, page_size: usize) -> usize {
    let page_size = page_size.clamp(*PREVIEW_PAGE_SIZES.start(), *PREVIEW_PAGE_SIZES.end());
    source
        .row_count()
        .map_or(1, |n| n.div_ceil(page_size).max(1))
}

/// One page of a dataset preview. Page size is clamped to
/// [`PREVIEW_PAGE_SIZES`], the page to the pages available.
pub fn preview_page<S: RowSource + ?Sized>(source: &S, page: usize, page_size: usize) -> Preview {
    let page_size = page_size.clamp(*PREVIEW_PAGE_SIZES.start(), *PREVIEW_PAGE_SIZES.end());
    let page = page.clamp(1, preview_pages(source, page_size));
    preview_slice(source, (page - 1) * page_size, page_size)
}

// ---------------------------------------------------------------------------
// Descriptive statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericStats {
    pub count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation; absent below two values.
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub q50: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoricalStats {
    pub count: usize,
    pub unique: usize,
    pub top: Option<Value>,
    pub freq: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ColumnStats {
    Numeric(NumericStats),
    Categorical(CategoricalStats),
}

pub type Described<T> = Result<Vec<(String, T)>, SummaryError>;

impl NumericStats {
    pub fn compute<'a>(values: impl IntoIterator<Item = &'a Value>) -> Self {
        let mut nums: Vec<f64> = values
            .into_iter()
            .filter(|v| !v.is_missing())
            .filter_map(Value::as_f64)
            .collect();
        nums.sort_by(f64::total_cmp);

        let count = nums.len();
        if count == 0 {
            return NumericStats {
                count,
                mean: None,
                std: None,
                min: None,
                q25: None,
                q50: None,
                q75: None,
                max: None,
            };
        }

        let n = count as f64;
        let mean = nums.iter().sum::<f64>() / n;
        let std = (count > 1).then(|| {
            let ss = nums.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
            (ss / (n - 1.0)).sqrt()
        });

        NumericStats {
            count,
            mean: Some(mean),
            std,
            min: nums.first().copied(),
            q25: Some(percentile(&nums, 0.25)),
            q50: Some(percentile(&nums, 0.50)),
            q75: Some(percentile(&nums, 0.75)),
            max: nums.last().copied(),
        }
    }
}

/// Linear interpolation between closest ranks; `sorted` must be non-empty.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let idx = p * (sorted.len() - 1) as f64;
    let lo = idx.floor() as usize;
    let hi = idx.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = idx - lo as f64;
        sorted[lo] * (1.0 - frac) + sorted[hi] * frac
    }
}

impl CategoricalStats {
    pub fn compute<'a>(values: impl IntoIterator<Item = &'a Value>) -> Self {
        let freqs = frequencies(values, false);
        CategoricalStats {
            count: freqs.iter().map(|f| f.count).sum(),
            unique: freqs.len(),
            top: freqs.first().map(|f| f.value.clone()),
            freq: freqs.first().map(|f| f.count),
        }
    }
}

/// Numeric columns only. Column types come from the cells, so a table
/// without rows has no numeric columns and yields `NoNumericColumns`.
pub fn describe_numeric(table: &Table) -> Described<NumericStats> {
    if table.num_columns() == 0 {
        return Err(SummaryError::NoColumns);
    }
    let stats: Vec<_> = (0..table.num_columns())
        .filter(|&c| table.column_type(c).is_numeric())
        .map(|c| {
            (
                table.columns()[c].clone(),
                NumericStats::compute(table.column_values(c)),
            )
        })
        .collect();
    if stats.is_empty() {
        return Err(SummaryError::NoNumericColumns);
    }
    Ok(stats)
}

/// Every column: numeric statistics for numeric columns, count / unique /
/// top / freq for the rest.
pub fn describe_all(table: &Table) -> Described<ColumnStats> {
    if table.num_columns() == 0 {
        return Err(SummaryError::NoColumns);
    }
    Ok((0..table.num_columns())
        .map(|c| {
            let stats = if table.column_type(c).is_numeric() {
                ColumnStats::Numeric(NumericStats::compute(table.column_values(c)))
            } else {
                ColumnStats::Categorical(CategoricalStats::compute(table.column_values(c)))
            };
            (table.columns()[c].clone(), stats)
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Categorical breakdowns
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueCount {
    pub value: Value,
    pub count: usize,
}

/// Frequencies by descending count; ties keep first-appearance order.
/// Missing values (null, NaN) share one `Null` bucket when included.
fn frequencies<'a>(values: impl IntoIterator<Item = &'a Value>, include_missing: bool) -> Vec<ValueCount> {
    let mut counts: Vec<ValueCount> = Vec::new();
    let mut index: HashMap<Value, usize> = HashMap::new();
    for v in values {
        let key = if v.is_missing() {
            if !include_missing {
                continue;
            }
            Value::Null
        } else {
            v.clone()
        };
        match index.get(&key) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(key.clone(), counts.len());
                counts.push(ValueCount { value: key, count: 1 });
            }
        }
    }
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// Distinct values of a column, counting null as one value.
pub fn distinct_count(table: &Table, col: usize) -> usize {
    table
        .column_values(col)
        .map(|v| if v.is_missing() { &Value::Null } else { v })
        .collect::<HashSet<_>>()
        .len()
}

/// Textual columns and columns with at most [`LOW_CARDINALITY_LIMIT`]
/// distinct values, by name.
pub fn categorical_columns(table: &Table) -> Vec<String> {
    let mut names: Vec<String> = (0..table.num_columns())
        .filter(|&c| {
            table.column_type(c).is_textual() || distinct_count(table, c) <= LOW_CARDINALITY_LIMIT
        })
        .map(|c| table.columns()[c].clone())
        .collect();
    names.sort();
    names
}

/// Top [`VALUE_COUNTS_LIMIT`] values of `column`, null included.
pub fn value_counts(table: &Table, column: &str) -> Result<Vec<ValueCount>, SummaryError> {
    let col = table
        .column_index(column)
        .ok_or_else(|| SummaryError::UnknownColumn(column.to_string()))?;
    let mut counts = frequencies(table.column_values(col), true);
    counts.truncate(VALUE_COUNTS_LIMIT);
    Ok(counts)
}

// ---------------------------------------------------------------------------
// Summary – everything the detail view shows for one dataset
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Breakdown {
    pub column: String,
    pub counts: Result<Vec<ValueCount>, SummaryError>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub shape: Shape,
    pub dtypes: Vec<(String, ColumnType)>,
    pub numeric: Described<NumericStats>,
    pub overall: Described<ColumnStats>,
    pub categorical: Vec<Breakdown>,
}

/// Per-column view over a [`Summary`].
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary<'a> {
    pub name: &'a str,
    pub dtype: ColumnType,
    pub stats: Option<&'a ColumnStats>,
    /// Present only for categorical-like columns.
    pub value_counts: Option<&'a Result<Vec<ValueCount>, SummaryError>>,
}

/// Summarize an arbitrary table. Each section fails on its own; a failed
/// section never prevents the others from being reported.
pub fn summarize(table: &Table) -> Summary {
    let dtypes = (0..table.num_columns())
        .map(|c| (table.columns()[c].clone(), table.column_type(c)))
        .collect();

    let numeric = describe_numeric(table);
    if let Err(e) = &numeric {
        log::warn!("Numeric statistics unavailable: {e}");
    }
    let overall = describe_all(table);
    if let Err(e) = &overall {
        log::warn!("Statistics unavailable: {e}");
    }

    let categorical = categorical_columns(table)
        .into_iter()
        .map(|column| {
            let counts = value_counts(table, &column);
            if let Err(e) = &counts {
                log::warn!("Value counts unavailable for {column}: {e}");
            }
            Breakdown { column, counts }
        })
        .collect();

    Summary {
        shape: Shape::of(table),
        dtypes,
        numeric,
        overall,
        categorical,
    }
}

impl Summary {
    pub fn columns(&self) -> Vec<ColumnSummary<'_>> {
        self.dtypes
            .iter()
            .map(|(name, dtype)| ColumnSummary {
                name,
                dtype: *dtype,
                stats: self
                    .overall
                    .as_ref()
                    .ok()
                    .and_then(|all| all.iter().find(|(n, _)| n == name).map(|(_, s)| s)),
                value_counts: self
                    .categorical
                    .iter()
                    .find(|b| &b.column == name)
                    .map(|b| &b.counts),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn table() -> Table {
        Table::from_rows(
            vec!["species".into(), "length".into(), "id".into()],
            (0..60)
                .map(|i| {
                    vec![
                        if i % 7 == 0 {
                            Value::Null
                        } else {
                            Value::from(["setosa", "virginica", "versicolor"][i % 3])
                        },
                        Value::Float(i as f64 / 2.0),
                        Value::Integer(i as i64),
                    ]
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn numeric_stats_match_reference_values() {
        let values: Vec<Value> = [1.0, 2.0, 3.0, 4.0].into_iter().map(Value::Float).collect();
        let s = NumericStats::compute(&values);
        assert_eq!(s.count, 4);
        assert_eq!(s.mean, Some(2.5));
        assert_eq!(s.q25, Some(1.75));
        assert_eq!(s.q50, Some(2.5));
        assert_eq!(s.q75, Some(3.25));
        let std = s.std.unwrap();
        assert!((std - 1.2909944487358056).abs() < 1e-12);
    }

    #[test]
    fn single_value_has_no_std() {
        let s = NumericStats::compute(&[Value::Integer(3), Value::Null]);
        assert_eq!(s.count, 1);
        assert_eq!(s.std, None);
        assert_eq!(s.min, Some(3.0));
    }

    #[test]
    fn categorical_stats_ignore_nulls_and_break_ties_by_first_seen() {
        let values = [
            Value::from("b"),
            Value::Null,
            Value::from("a"),
            Value::from("a"),
            Value::from("b"),
        ];
        let s = CategoricalStats::compute(&values);
        assert_eq!(s.count, 4);
        assert_eq!(s.unique, 2);
        assert_eq!(s.top, Some(Value::from("b")));
        assert_eq!(s.freq, Some(2));
    }

    #[test]
    fn value_counts_include_null_bucket() {
        let counts = value_counts(&table(), "species").unwrap();
        let null = counts.iter().find(|c| c.value == Value::Null).unwrap();
        assert_eq!(null.count, 9);
        assert_eq!(counts.iter().map(|c| c.count).sum::<usize>(), 60);
        assert!(counts.windows(2).all(|w| w[0].count >= w[1].count));
    }

    #[test]
    fn value_counts_unknown_column() {
        assert_eq!(
            value_counts(&table(), "nope"),
            Err(SummaryError::UnknownColumn("nope".into()))
        );
    }

    #[test]
    fn categorical_columns_are_textual_or_low_cardinality() {
        let t = table();
        // species is text; length and id have 60 distinct values each.
        assert_eq!(categorical_columns(&t), vec!["species"]);

        let small = t.slice(0, 10);
        assert_eq!(categorical_columns(&small), vec!["id", "length", "species"]);
    }

    #[test]
    fn value_counts_are_truncated() {
        let t = Table::from_rows(
            vec!["code".into()],
            (0..250).map(|i| vec![Value::from(format!("c{i}"))]).collect(),
        )
        .unwrap();
        assert_eq!(value_counts(&t, "code").unwrap().len(), VALUE_COUNTS_LIMIT);
    }

    #[test]
    fn sections_fail_independently() {
        let text_only = Table::from_rows(vec!["name".into()], vec![vec![Value::from("x")]]).unwrap();
        let s = summarize(&text_only);
        assert_eq!(s.numeric, Err(SummaryError::NoNumericColumns));
        assert!(s.overall.is_ok());
        assert_eq!(s.categorical.len(), 1);

        let empty = summarize(&Table::default());
        assert_eq!(empty.numeric, Err(SummaryError::NoColumns));
        assert_eq!(empty.overall, Err(SummaryError::NoColumns));
        assert_eq!(empty.shape, Shape { rows: Some(0), columns: Some(0) });
    }

    #[test]
    fn describe_all_mixes_numeric_and_categorical() {
        let all = describe_all(&table()).unwrap();
        assert!(matches!(all[0].1, ColumnStats::Categorical(_)));
        assert!(matches!(all[1].1, ColumnStats::Numeric(_)));
    }

    #[test]
    fn column_summaries_attach_breakdowns_to_categorical_columns() {
        let s = summarize(&table());
        let cols = s.columns();
        assert_eq!(cols.len(), 3);
        assert_eq!(cols[0].dtype, ColumnType::Text);
        assert!(cols[0].value_counts.is_some());
        assert!(cols[1].value_counts.is_none());
        assert!(cols[2].stats.is_some());
    }

    #[test]
    fn preview_pages_are_clamped() {
        let t = table();
        let p = preview_page(&t, 2, 20);
        assert_eq!(p.start, 21);
        assert_eq!(p.end, PreviewEnd::Row(40));
        let last = preview_page(&t, 99, 25);
        assert_eq!(last.start, 51);
        assert_eq!(last.end, PreviewEnd::Row(60));
        assert_eq!(last.rows.len(), 10);
    }

    struct Unsized(Table);

    impl RowSource for Unsized {
        fn column_names(&self) -> &[String] {
            self.0.columns()
        }
        fn row_count(&self) -> Option<usize> {
            None
        }
        fn head(&self, n: usize) -> Table {
            self.0.slice(0, n)
        }
        fn slice(&self, start: usize, end: usize) -> Table {
            self.0.slice(start, end)
        }
    }

    #[test]
    fn unknown_length_falls_back_to_head() {
        let source = Unsized(table());
        let p = preview_slice(&source, 40, 5);
        assert_eq!(p.end, PreviewEnd::Unknown);
        assert_eq!(p.rows.get(0, "id"), Some(&Value::Integer(0)));
        assert_eq!(Shape::of(&source).to_string(), "N/A rows x 3 columns");
    }

    #[test]
    fn table_without_rows_has_no_numeric_columns() {
        let empty = Table::new(vec!["length".into(), "species".into()]);
        assert_eq!(empty.column_type(0), ColumnType::Empty);
        assert_eq!(describe_numeric(&empty), Err(SummaryError::NoNumericColumns));

        let s = summarize(&empty);
        assert_eq!(s.shape.rows, Some(0));
        assert!(s.overall.is_ok());
    }
}
