use thiserror::Error;

// ---------------------------------------------------------------------------
// Error taxonomy
// ---------------------------------------------------------------------------

/// Hard failures surfaced to the user.
///
/// Degraded computations (a sort that cannot be performed, a statistics
/// section that cannot be computed) are *not* errors: they are reported next
/// to the result they affect and the rest of the pipeline carries on.
#[derive(Error, Debug)]
pub enum BrowseError {
    /// A required file or directory does not exist.
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// A loaded catalog lacks one or more of the required columns.
    #[error("The catalog is missing the required columns: {}", .missing.join(", "))]
    SchemaInvalid { missing: Vec<String> },

    /// The dataset library cannot be used at all in this session.
    #[error("Dataset library unavailable: {0}")]
    LibraryUnavailable(String),

    /// One named dataset failed to load; other datasets are unaffected.
    #[error("Could not load dataset `{name}`: {reason}")]
    DatasetLoad { name: String, reason: String },

    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    #[error("Unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("Row {row} has {found} values but the table declares {expected} columns")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Invalid note name: {0}")]
    InvalidNoteName(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{0:#}")]
    Load(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, BrowseError>;
