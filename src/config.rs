use std::path::PathBuf;

use clap::Parser;

use crate::data::query::{DEFAULT_PAGE_SIZE, PAGE_SIZES};

pub const DEFAULT_CATALOG: &str = "data/pydataset_list_translated.xlsx";
pub const DEFAULT_LIBRARY: &str = "data/datasets";
pub const DEFAULT_NOTES: &str = "codigos";
pub const DEFAULT_CACHE_CAPACITY: usize = 32;

#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "catalog-browser", about = "Browse a translated dataset catalog")]
pub struct Config {
    /// Catalog workbook (or CSV / JSON / Parquet table) to open at start-up
    #[arg(long, default_value = DEFAULT_CATALOG)]
    pub catalog: PathBuf,

    /// Sheet to read from the catalog workbook (default: the first one)
    #[arg(long)]
    pub sheet: Option<String>,

    /// Directory holding the dataset library
    #[arg(long, default_value = DEFAULT_LIBRARY)]
    pub library: PathBuf,

    /// Directory holding the markdown notes
    #[arg(long, default_value = DEFAULT_NOTES)]
    pub notes: PathBuf,

    /// Catalog rows per page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE, value_parser = parse_page_size)]
    pub page_size: usize,

    /// Entries kept by each in-memory cache
    #[arg(long, default_value_t = DEFAULT_CACHE_CAPACITY)]
    pub cache_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            catalog: PathBuf::from(DEFAULT_CATALOG),
            sheet: None,
            library: PathBuf::from(DEFAULT_LIBRARY),
            notes: PathBuf::from(DEFAULT_NOTES),
            page_size: DEFAULT_PAGE_SIZE,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

fn parse_page_size(s: &str) -> Result<usize, String> {
    let n: usize = s.parse().map_err(|e| format!("{e}"))?;
    if PAGE_SIZES.contains(&n) {
        Ok(n)
    } else {
        Err(format!("page size must be one of {PAGE_SIZES:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_default_impl() {
        let parsed = Config::try_parse_from(["catalog-browser"]).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn page_size_must_be_offered() {
        assert!(Config::try_parse_from(["catalog-browser", "--page-size", "50"]).is_ok());
        assert!(Config::try_parse_from(["catalog-browser", "--page-size", "7"]).is_err());
    }

    #[test]
    fn paths_and_sheet_are_overridable() {
        let c = Config::try_parse_from([
            "catalog-browser",
            "--catalog",
            "other.xlsx",
            "--sheet",
            "Hoja2",
            "--library",
            "lib",
        ])
        .unwrap();
        assert_eq!(c.catalog, PathBuf::from("other.xlsx"));
        assert_eq!(c.sheet.as_deref(), Some("Hoja2"));
        assert_eq!(c.library, PathBuf::from("lib"));
    }
}
