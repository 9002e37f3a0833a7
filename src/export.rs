use crate::data::model::Table;
use crate::error::Result;

/// Default file names offered by the save dialogs.
pub const FILTERED_EXPORT_NAME: &str = "pydataset_filtered.csv";
pub const PAGE_EXPORT_NAME: &str = "pydataset_page.csv";
pub const LIBRARY_CATALOG_EXPORT_NAME: &str = "library_catalog.csv";

/// Serialize a table as UTF-8 CSV: header row, comma separated, fields
/// quoted only when needed, nulls as empty fields.
pub fn table_to_csv(table: &Table) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(Vec::new());

    writer.write_record(table.columns())?;
    for row in table.rows() {
        writer.write_record(
            row.iter()
                .map(|v| v.as_text().map(|t| t.into_owned()).unwrap_or_default()),
        )?;
    }

    writer
        .into_inner()
        .map_err(|e| std::io::Error::other(e.to_string()).into())
}

/// `<dataset>.csv`
pub fn dataset_export_name(dataset: &str) -> String {
    format!("{dataset}.csv")
}

/// `<dataset>_show_doc.txt`
pub fn documentation_export_name(dataset: &str) -> String {
    format!("{dataset}_show_doc.txt")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Value;

    #[test]
    fn csv_quotes_on_demand_and_blanks_nulls() {
        let t = Table::from_rows(
            vec!["dataset_id".into(), "title".into(), "n".into()],
            vec![
                vec![Value::from("iris"), Value::from("Iris, \"classic\""), Value::Integer(150)],
                vec![Value::from("mtcars"), Value::Null, Value::Float(32.5)],
            ],
        )
        .unwrap();
        let out = String::from_utf8(table_to_csv(&t).unwrap()).unwrap();
        assert_eq!(
            out,
            "dataset_id,title,n\niris,\"Iris, \"\"classic\"\"\",150\nmtcars,,32.5\n"
        );
    }

    #[test]
    fn empty_table_still_has_header() {
        let t = Table::new(vec!["a".into(), "b".into()]);
        assert_eq!(table_to_csv(&t).unwrap(), b"a,b\n");
    }
}
