use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::catalog::DISPLAY_COLUMNS;
use super::model::Table;

/// Columns the search box looks at.
pub const SEARCH_COLUMNS: [&str; 3] = ["dataset_id", "title", "title_es"];

/// Page sizes offered in the UI.
pub const PAGE_SIZES: [usize; 4] = [10, 25, 50, 100];

pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Name of the in-page sequence column.
pub const ROW_NUMBER_COLUMN: &str = "#";

// ---------------------------------------------------------------------------
// QuerySpec – filter / sort / pagination parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Parameters for one catalog query. Page size and page number are always
/// at least 1.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuerySpec {
    search_text: Option<String>,
    sort_column: Option<String>,
    sort_direction: SortDirection,
    page_size: usize,
    page_number: usize,
}

impl Default for QuerySpec {
    fn default() -> Self {
        Self {
            search_text: None,
            sort_column: None,
            sort_direction: SortDirection::Ascending,
            page_size: DEFAULT_PAGE_SIZE,
            page_number: 1,
        }
    }
}

impl QuerySpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search_text = Some(text.into());
        self
    }

    pub fn with_sort(mut self, column: impl Into<String>, direction: SortDirection) -> Self {
        self.sort_column = Some(column.into());
        self.sort_direction = direction;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// 1-based; out-of-range pages are clamped when the query runs.
    pub fn with_page(mut self, page_number: usize) -> Self {
        self.page_number = page_number.max(1);
        self
    }

    pub fn search_text(&self) -> Option<&str> {
        self.search_text.as_deref()
    }

    pub fn sort_column(&self) -> Option<&str> {
        self.sort_column.as_deref()
    }

    pub fn sort_direction(&self) -> SortDirection {
        self.sort_direction
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page_number(&self) -> usize {
        self.page_number
    }

    /// `ceil(rows / page_size)`, never less than 1.
    pub fn total_pages(&self, rows: usize) -> usize {
        rows.div_ceil(self.page_size).max(1)
    }

    /// Trimmed, lower-cased search needle; `None` when there is nothing to
    /// search for.
    fn needle(&self) -> Option<String> {
        self.search_text
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase)
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Filtered and sorted rows, every column kept.
#[derive(Debug, Clone, PartialEq)]
pub struct Filtered {
    pub table: Table,
    /// Why the requested sort was not applied, if it was not.
    pub sort_skipped: Option<String>,
}

/// One page of a catalog query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    /// `#`, `dataset_id`, `title`, `title_es` (those present), `#` running
    /// from 1 within the page.
    pub rows: Table,
    pub total_matches: usize,
    /// 1-based global index of the first row on the page; 0 when empty.
    pub start_index: usize,
    /// Inclusive global index of the last row on the page; 0 when empty.
    pub end_index: usize,
    /// The page actually returned, after clamping.
    pub page_number: usize,
    pub total_pages: usize,
    pub sort_skipped: Option<String>,
}

impl QueryResult {
    /// The page without the `#` column, as exported.
    pub fn export_rows(&self) -> Table {
        self.rows.without_columns(&[ROW_NUMBER_COLUMN])
    }
}

// ---------------------------------------------------------------------------
// Filter → sort → paginate
// ---------------------------------------------------------------------------

/// Indices of rows whose `dataset_id`, `title` or `title_es` contains the
/// trimmed search text, ignoring case. Null cells never match; no search
/// text keeps every row.
pub fn matching_rows(table: &Table, spec: &QuerySpec) -> Vec<usize> {
    let Some(needle) = spec.needle() else {
        return (0..table.len()).collect();
    };
    let search_cols: Vec<usize> = SEARCH_COLUMNS
        .iter()
        .filter_map(|c| table.column_index(c))
        .collect();

    table
        .rows()
        .iter()
        .enumerate()
        .filter(|(_, row)| {
            search_cols.iter().any(|&c| {
                row[c]
                    .as_text()
                    .is_some_and(|text| text.to_lowercase().contains(&needle))
            })
        })
        .map(|(i, _)| i)
        .collect()
}

/// Stable-sort `indices` by `column`. Missing values go last in both
/// directions. Fails, leaving `indices` untouched, when the column does not
/// exist or holds values of kinds that cannot be compared.
fn sort_indices(
    table: &Table,
    indices: &mut [usize],
    column: &str,
    direction: SortDirection,
) -> Result<(), String> {
    let col = table
        .column_index(column)
        .ok_or_else(|| format!("column `{column}` does not exist"))?;
    let rows = table.rows();

    let mut present = indices
        .iter()
        .map(|&i| &rows[i][col])
        .filter(|v| !v.is_missing());
    if let Some(first) = present.next() {
        if let Some(other) = present.find(|v| first.natural_cmp(v).is_none()) {
            return Err(format!(
                "values `{first}` and `{other}` in column `{column}` cannot be compared"
            ));
        }
    }

    indices.sort_by(|&a, &b| {
        let (va, vb) = (&rows[a][col], &rows[b][col]);
        match (va.is_missing(), vb.is_missing()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => {
                let ord = va.natural_cmp(vb).unwrap_or(Ordering::Equal);
                match direction {
                    SortDirection::Ascending => ord,
                    SortDirection::Descending => ord.reverse(),
                }
            }
        }
    });
    Ok(())
}

fn filtered_indices(table: &Table, spec: &QuerySpec) -> (Vec<usize>, Option<String>) {
    let mut indices = matching_rows(table, spec);
    let mut sort_skipped = None;
    if let Some(column) = spec.sort_column() {
        if let Err(reason) = sort_indices(table, &mut indices, column, spec.sort_direction()) {
            log::warn!("Sort skipped, rows left in filtered order: {reason}");
            sort_skipped = Some(reason);
        }
    }
    (indices, sort_skipped)
}

/// Filter and sort without paginating, keeping every column.
pub fn filter_sort(table: &Table, spec: &QuerySpec) -> Filtered {
    let (indices, sort_skipped) = filtered_indices(table, spec);
    Filtered {
        table: table.select_rows(&indices),
        sort_skipped,
    }
}

/// Run a catalog query: filter, sort, then cut out the requested page.
pub fn query(table: &Table, spec: &QuerySpec) -> QueryResult {
    let (indices, sort_skipped) = filtered_indices(table, spec);
    let total = indices.len();
    let total_pages = spec.total_pages(total);

    let mut columns = vec![ROW_NUMBER_COLUMN];
    columns.extend(DISPLAY_COLUMNS);

    if total == 0 {
        return QueryResult {
            rows: table.slice(0, 0).numbered(ROW_NUMBER_COLUMN).project(&columns),
            total_matches: 0,
            start_index: 0,
            end_index: 0,
            page_number: 1,
            total_pages,
            sort_skipped,
        };
    }

    let page = spec.page_number().clamp(1, total_pages);
    let start = (page - 1) * spec.page_size();
    let end = (start + spec.page_size()).min(total);

    QueryResult {
        rows: table
            .select_rows(&indices[start..end])
            .numbered(ROW_NUMBER_COLUMN)
            .project(&columns),
        total_matches: total,
        start_index: start + 1,
        end_index: end,
        page_number: page,
        total_pages,
        sort_skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Value;
    use pretty_assertions::assert_eq;

    fn sample() -> Table {
        let rows = [
            ("A1", "First Dataset", "Primer Conjunto"),
            ("b2", "Second", "Segundo"),
            ("C3", "Third dataset", "Tercer Conjunto"),
            ("d4", "Fourth", "Cuarto"),
        ];
        Table::from_rows(
            vec!["dataset_id".into(), "title".into(), "title_es".into(), "rows".into()],
            rows.iter()
                .enumerate()
                .map(|(i, (id, t, es))| {
                    vec![
                        Value::from(*id),
                        Value::from(*t),
                        Value::from(*es),
                        Value::Integer(10 - i as i64),
                    ]
                })
                .collect(),
        )
        .unwrap()
    }

    fn ids(t: &Table) -> Vec<String> {
        let col = t.column_index("dataset_id").unwrap();
        t.column_values(col).map(|v| v.to_string()).collect()
    }

    #[test]
    fn search_matches_title_case_insensitively() {
        let r = query(&sample(), &QuerySpec::new().with_search("first"));
        assert_eq!(r.total_matches, 1);
        assert_eq!(ids(&r.rows), vec!["A1"]);
    }

    #[test]
    fn search_matches_dataset_id() {
        let r = query(&sample(), &QuerySpec::new().with_search("b2"));
        assert_eq!(r.total_matches, 1);
        assert_eq!(ids(&r.rows), vec!["b2"]);
    }

    #[test]
    fn search_matches_spanish_title_and_trims() {
        let r = query(&sample(), &QuerySpec::new().with_search("  conjunto "));
        assert_eq!(ids(&r.rows), vec!["A1", "C3"]);
    }

    #[test]
    fn whitespace_search_keeps_everything() {
        let r = query(&sample(), &QuerySpec::new().with_search("   "));
        assert_eq!(r.total_matches, 4);
    }

    #[test]
    fn sort_descending_first_page() {
        let spec = QuerySpec::new()
            .with_sort("dataset_id", SortDirection::Descending)
            .with_page_size(2)
            .with_page(1);
        let r = query(&sample(), &spec);
        assert_eq!(r.total_matches, 4);
        assert_eq!(ids(&r.rows), vec!["d4", "b2"]);
        assert_eq!((r.start_index, r.end_index), (1, 2));
    }

    #[test]
    fn out_of_range_page_is_clamped() {
        let spec = QuerySpec::new().with_page_size(2).with_page(3);
        let r = query(&sample(), &spec);
        assert_eq!(r.page_number, 2);
        assert_eq!(ids(&r.rows), vec!["C3", "d4"]);
        assert_eq!((r.start_index, r.end_index), (3, 4));
    }

    #[test]
    fn page_has_numbered_display_columns_only() {
        let r = query(&sample(), &QuerySpec::new().with_page_size(3).with_page(2));
        assert_eq!(r.rows.columns(), &["#", "dataset_id", "title", "title_es"]);
        assert_eq!(r.rows.get(0, "#"), Some(&Value::Integer(1)));
        assert_eq!(r.export_rows().columns(), &["dataset_id", "title", "title_es"]);
    }

    #[test]
    fn no_match_yields_empty_page_for_any_page_number() {
        for page in [1, 2, 50] {
            let r = query(&sample(), &QuerySpec::new().with_search("zzz").with_page(page));
            assert_eq!(r.total_matches, 0);
            assert!(r.rows.is_empty());
            assert_eq!((r.start_index, r.end_index), (0, 0));
        }
    }

    #[test]
    fn sort_on_missing_column_is_skipped() {
        let spec = QuerySpec::new().with_sort("nope", SortDirection::Descending);
        let r = query(&sample(), &spec);
        assert!(r.sort_skipped.is_some());
        assert_eq!(ids(&r.rows), vec!["A1", "b2", "C3", "d4"]);
    }

    #[test]
    fn sort_on_incomparable_values_is_skipped() {
        let t = Table::from_rows(
            vec!["dataset_id".into(), "title".into(), "title_es".into()],
            vec![
                vec![Value::from("x"), Value::from("a"), Value::Null],
                vec![Value::Integer(3), Value::from("b"), Value::Null],
            ],
        )
        .unwrap();
        let filtered = filter_sort(&t, &QuerySpec::new().with_sort("dataset_id", SortDirection::Ascending));
        assert!(filtered.sort_skipped.is_some());
        assert_eq!(filtered.table, t);
    }

    #[test]
    fn numeric_sort_with_nulls_last() {
        let t = Table::from_rows(
            vec!["dataset_id".into(), "n".into()],
            vec![
                vec![Value::from("a"), Value::Integer(5)],
                vec![Value::from("b"), Value::Null],
                vec![Value::from("c"), Value::Float(1.5)],
                vec![Value::from("d"), Value::Integer(5)],
            ],
        )
        .unwrap();
        let asc = filter_sort(&t, &QuerySpec::new().with_sort("n", SortDirection::Ascending));
        assert_eq!(ids(&asc.table), vec!["c", "a", "d", "b"]);
        let desc = filter_sort(&t, &QuerySpec::new().with_sort("n", SortDirection::Descending));
        assert_eq!(ids(&desc.table), vec!["a", "d", "c", "b"]);
    }

    #[test]
    fn filter_sort_keeps_all_columns() {
        let f = filter_sort(&sample(), &QuerySpec::new().with_search("dataset"));
        assert_eq!(f.table.num_columns(), 4);
        assert_eq!(ids(&f.table), vec!["A1", "C3"]);
    }

    #[test]
    fn page_size_is_at_least_one() {
        assert_eq!(QuerySpec::new().with_page_size(0).page_size(), 1);
        assert_eq!(QuerySpec::new().total_pages(0), 1);
        assert_eq!(QuerySpec::new().with_page_size(2).total_pages(5), 3);
    }
}
