/// Data layer: the table model, loading, and the catalog operations.
///
/// Architecture:
/// ```text
///  .xlsx / .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader  │  parse file or upload → Table
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ catalog  │  check required columns → CatalogTable
///   └──────────┘
///        │
///        ├──────────────────────┐
///        ▼                      ▼
///   ┌──────────┐          ┌──────────┐
///   │  query   │          │ library  │  dataset id → Table + docs
///   └──────────┘          └──────────┘
///   search, sort, page          │
///                               ▼
///                         ┌──────────┐
///                         │ summary  │  shape, dtypes, describe, counts
///                         └──────────┘
/// ```

pub mod catalog;
pub mod library;
pub mod loader;
pub mod model;
pub mod query;
pub mod summary;
