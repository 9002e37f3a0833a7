//! Browse a translated catalog of datasets: search, sort and page the
//! catalog, inspect individual datasets from a library, and keep notes.

pub mod cache;
pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod notes;
pub mod state;

pub use config::Config;
pub use error::{BrowseError, Result};
pub use state::AppState;
