use std::collections::BTreeSet;
use std::time::SystemTime;

use chrono::{DateTime, Local};

use super::model::Table;
use crate::error::{BrowseError, Result};

/// Columns every catalog must carry.
pub const REQUIRED_COLUMNS: [&str; 3] = ["dataset_id", "title", "title_es"];

/// Columns shown in a catalog page, in display order (after `#`).
pub const DISPLAY_COLUMNS: [&str; 3] = REQUIRED_COLUMNS;

// ---------------------------------------------------------------------------
// CatalogTable – a table validated against the catalog schema
// ---------------------------------------------------------------------------

/// A [`Table`] known to carry [`REQUIRED_COLUMNS`]. Duplicate dataset ids are
/// allowed.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogTable {
    table: Table,
}

impl CatalogTable {
    /// Validate `table`, naming every missing required column (sorted).
    pub fn new(table: Table) -> Result<Self> {
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|c| !table.has_column(c))
            .map(|c| c.to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if !missing.is_empty() {
            return Err(BrowseError::SchemaInvalid { missing });
        }
        Ok(CatalogTable { table })
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn into_table(self) -> Table {
        self.table
    }
}

/// Distinct dataset ids of `table` as text, sorted. Null ids are skipped.
pub fn dataset_ids(table: &Table) -> Vec<String> {
    let Some(col) = table.column_index("dataset_id") else {
        return Vec::new();
    };
    table
        .column_values(col)
        .filter_map(|v| v.as_text().map(|t| t.into_owned()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

// ---------------------------------------------------------------------------
// SourceInfo – where the catalog came from, for the footer caption
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SourceInfo {
    pub name: String,
    /// File modification time, or load time for uploads.
    pub updated: SystemTime,
}

impl SourceInfo {
    pub fn caption(&self) -> String {
        let updated: DateTime<Local> = self.updated.into();
        format!(
            "Source: {} — Last updated: {}",
            self.name,
            updated.format("%Y-%m-%d %H:%M:%S")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Value;

    fn table(columns: &[&str]) -> Table {
        Table::new(columns.iter().map(|c| c.to_string()).collect())
    }

    #[test]
    fn missing_columns_are_named_in_sorted_order() {
        let err = CatalogTable::new(table(&["title", "notes"])).unwrap_err();
        match err {
            BrowseError::SchemaInvalid { missing } => {
                assert_eq!(missing, vec!["dataset_id", "title_es"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn extra_columns_are_accepted() {
        let catalog = CatalogTable::new(table(&["title_es", "extra", "dataset_id", "title"]));
        assert!(catalog.is_ok());
    }

    #[test]
    fn dataset_ids_are_distinct_and_sorted() {
        let t = Table::from_rows(
            vec!["dataset_id".to_string()],
            vec![
                vec![Value::from("iris")],
                vec![Value::Null],
                vec![Value::from("AirPassengers")],
                vec![Value::from("iris")],
            ],
        )
        .unwrap();
        assert_eq!(dataset_ids(&t), vec!["AirPassengers", "iris"]);
    }
}
