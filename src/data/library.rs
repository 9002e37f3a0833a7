use std::path::{Path, PathBuf};

use super::loader::load_file;
use super::model::{Table, Value};
use crate::error::{BrowseError, Result};

/// Dataset file extensions, in lookup order.
pub const DATASET_EXTENSIONS: [&str; 4] = ["parquet", "pq", "csv", "json"];

/// Documentation file extensions, in lookup order.
pub const DOC_EXTENSIONS: [&str; 2] = ["txt", "md"];

/// Optional listing of the library's datasets.
pub const INDEX_FILE: &str = "index.csv";

/// Rows shown in the library catalog view.
pub const CATALOG_PREVIEW_ROWS: usize = 200;

// ---------------------------------------------------------------------------
// DatasetLibrary – datasets addressable by name
// ---------------------------------------------------------------------------

/// A collection of datasets loadable by name.
///
/// Failing to reach the library at all is reported when it is opened
/// ([`BrowseError::LibraryUnavailable`]); a dataset that cannot be loaded
/// fails on its own ([`BrowseError::DatasetLoad`]).
pub trait DatasetLibrary {
    /// One row per dataset with at least `dataset_id`, `title` and `package`.
    fn catalog(&self) -> Result<Table>;

    fn load(&self, name: &str) -> Result<Table>;

    /// Documentation text; empty when the dataset has none.
    fn documentation(&self, name: &str) -> Result<String>;
}

/// A directory of dataset files (`<id>.parquet`, `<id>.csv`, `<id>.json`)
/// with optional documentation (`<id>.txt`, `<id>.md`) and an optional
/// `index.csv`.
#[derive(Debug, Clone)]
pub struct DirectoryLibrary {
    root: PathBuf,
}

impl DirectoryLibrary {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(BrowseError::LibraryUnavailable(format!(
                "{} is not a directory",
                root.display()
            )));
        }
        log::info!("Dataset library opened at {}", root.display());
        Ok(DirectoryLibrary { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Names of every dataset file in the library, sorted and deduplicated.
    pub fn dataset_names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let path = entry?.path();
            if !path.is_file() || path.file_name().is_some_and(|n| n == INDEX_FILE) {
                continue;
            }
            let is_dataset = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| DATASET_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
            if let (true, Some(stem)) = (is_dataset, path.file_stem().and_then(|s| s.to_str())) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        names.dedup();
        Ok(names)
    }

    /// The file `name` loads from. Callers key caches on it.
    pub fn dataset_path(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        self.find(name, &DATASET_EXTENSIONS)
            .ok_or_else(|| BrowseError::DatasetLoad {
                name: name.to_string(),
                reason: "no such dataset in the library".to_string(),
            })
    }

    fn find(&self, name: &str, extensions: &[&str]) -> Option<PathBuf> {
        extensions
            .iter()
            .map(|ext| self.root.join(format!("{name}.{ext}")))
            .find(|p| p.is_file())
    }

    fn first_doc_line(&self, name: &str) -> Option<String> {
        let text = std::fs::read_to_string(self.find(name, &DOC_EXTENSIONS)?).ok()?;
        text.lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(str::to_string)
    }
}

/// Names are plain file stems: no separators, no parent references.
fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
        return Err(BrowseError::DatasetLoad {
            name: name.to_string(),
            reason: "invalid dataset name".to_string(),
        });
    }
    Ok(())
}

impl DatasetLibrary for DirectoryLibrary {
    fn catalog(&self) -> Result<Table> {
        let index = self.root.join(INDEX_FILE);
        if index.is_file() {
            return Ok(normalize_catalog(load_file(&index, None)?));
        }

        let mut table = Table::new(vec!["dataset_id".into(), "title".into(), "package".into()]);
        for name in self.dataset_names()? {
            let title = Value::from(self.first_doc_line(&name));
            table.push_row(vec![Value::String(name), title, Value::Null])?;
        }
        Ok(table)
    }

    fn load(&self, name: &str) -> Result<Table> {
        let path = self.dataset_path(name)?;
        load_file(&path, None).map_err(|e| BrowseError::DatasetLoad {
            name: name.to_string(),
            reason: format!("{e}"),
        })
    }

    fn documentation(&self, name: &str) -> Result<String> {
        validate_name(name)?;
        match self.find(name, &DOC_EXTENSIONS) {
            Some(path) => std::fs::read_to_string(&path).map_err(|e| BrowseError::DatasetLoad {
                name: name.to_string(),
                reason: format!("reading {}: {e}", path.display()),
            }),
            None => Ok(String::new()),
        }
    }
}

/// Bring a library listing to the `dataset_id` / `title` / `package` layout:
/// `Item` and `Title` are renamed when the canonical names are absent, and a
/// null `package` column is added if missing.
pub fn normalize_catalog(mut table: Table) -> Table {
    if !table.has_column("dataset_id") {
        table.rename_column("Item", "dataset_id");
    }
    if !table.has_column("title") {
        table.rename_column("Title", "title");
    }
    if !table.has_column("package") {
        table.push_column("package", Value::Null);
    }
    table
}

/// The listing as shown in the documentation view.
pub fn catalog_preview(table: &Table) -> Table {
    table
        .project(&["dataset_id", "title", "package"])
        .slice(0, CATALOG_PREVIEW_ROWS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn library() -> (tempfile::TempDir, DirectoryLibrary) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("iris.csv"), "sepal_length,species\n5.1,setosa\n4.9,setosa\n").unwrap();
        fs::write(dir.path().join("iris.txt"), "\nEdgar Anderson's Iris Data\n\nMore text.\n").unwrap();
        fs::write(dir.path().join("broken.json"), "{not json").unwrap();
        fs::write(dir.path().join("readme.rst"), "ignored").unwrap();
        let lib = DirectoryLibrary::open(dir.path()).unwrap();
        (dir, lib)
    }

    #[test]
    fn missing_directory_is_unavailable() {
        let err = DirectoryLibrary::open("/nonexistent/library").unwrap_err();
        assert!(matches!(err, BrowseError::LibraryUnavailable(_)));
    }

    #[test]
    fn catalog_is_derived_from_files() {
        let (_dir, lib) = library();
        let catalog = lib.catalog().unwrap();
        assert_eq!(catalog.columns(), &["dataset_id", "title", "package"]);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(0, "dataset_id"), Some(&Value::from("broken")));
        assert_eq!(catalog.get(0, "title"), Some(&Value::Null));
        assert_eq!(
            catalog.get(1, "title"),
            Some(&Value::from("Edgar Anderson's Iris Data"))
        );
    }

    #[test]
    fn index_file_is_normalized() {
        let (dir, lib) = library();
        fs::write(dir.path().join(INDEX_FILE), "Item,Title\niris,Iris\n").unwrap();
        let catalog = lib.catalog().unwrap();
        assert_eq!(catalog.columns(), &["dataset_id", "title", "package"]);
        assert_eq!(catalog.get(0, "package"), Some(&Value::Null));
    }

    #[test]
    fn load_failures_are_per_dataset() {
        let (_dir, lib) = library();
        assert_eq!(lib.load("iris").unwrap().len(), 2);
        for name in ["broken", "missing", "../iris"] {
            match lib.load(name) {
                Err(BrowseError::DatasetLoad { name: n, .. }) => assert_eq!(n, name),
                other => panic!("unexpected result for {name}: {other:?}"),
            }
        }
    }

    #[test]
    fn documentation_is_empty_when_absent() {
        let (_dir, lib) = library();
        assert!(lib.documentation("iris").unwrap().contains("Iris Data"));
        assert_eq!(lib.documentation("broken").unwrap(), "");
    }

    #[test]
    fn dataset_path_resolves_the_loaded_file() {
        let (dir, lib) = library();
        assert_eq!(lib.dataset_path("iris").unwrap(), dir.path().join("iris.csv"));
        assert!(matches!(
            lib.dataset_path("missing"),
            Err(BrowseError::DatasetLoad { .. })
        ));
    }
}
