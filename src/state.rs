use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use crate::cache::{Memo, SourceKey};
use crate::config::Config;
use crate::data::catalog::{CatalogTable, SourceInfo, dataset_ids};
use crate::data::library::{DatasetLibrary, DirectoryLibrary, catalog_preview};
use crate::data::loader;
use crate::data::model::Table;
use crate::data::query::{self, Filtered, QueryResult, QuerySpec, SortDirection};
use crate::data::summary::{self, DEFAULT_PREVIEW_PAGE_SIZE, Preview, Summary};
use crate::error::{BrowseError, Result};
use crate::export;
use crate::notes::{self, NOTE_EXTENSION, NoteStore};

// ---------------------------------------------------------------------------
// Pieces of state
// ---------------------------------------------------------------------------

/// Where the current catalog was read from.
#[derive(Debug, Clone)]
pub enum CatalogOrigin {
    Path(PathBuf),
    Upload { name: String, data: Arc<Vec<u8>> },
}

#[derive(Debug, Clone)]
pub struct LoadedCatalog {
    pub catalog: Arc<CatalogTable>,
    pub key: SourceKey,
    pub origin: CatalogOrigin,
    pub source: SourceInfo,
    pub sheets: Vec<String>,
    pub sheet: Option<String>,
}

/// A dataset opened from the library, with its summary.
#[derive(Debug, Clone)]
pub struct DatasetDetail {
    pub name: String,
    pub table: Arc<Table>,
    pub summary: Arc<Summary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Catalog,
    Documentation,
    Notes,
}

type QueryKey = (SourceKey, QuerySpec);

struct Caches {
    catalogs: Memo<SourceKey, SourceKey, CatalogTable>,
    pages: Memo<QueryKey, QueryKey, QueryResult>,
    filtered: Memo<QueryKey, QueryKey, Filtered>,
    datasets: Memo<SourceKey, SourceKey, Table>,
    summaries: Memo<SourceKey, SourceKey, Summary>,
}

impl Caches {
    fn new(capacity: usize) -> Self {
        Caches {
            catalogs: Memo::new(capacity, SourceKey::clone),
            pages: Memo::new(capacity, |key: &QueryKey| key.clone()),
            // Paging does not change the filtered set.
            filtered: Memo::new(capacity, |(source, spec): &QueryKey| {
                (source.clone(), spec.clone().with_page(1).with_page_size(1))
            }),
            datasets: Memo::new(capacity, SourceKey::clone),
            summaries: Memo::new(capacity, SourceKey::clone),
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: Config,

    /// Loaded catalog (None until a catalog is opened).
    pub catalog: Option<LoadedCatalog>,

    // ---- query controls ----
    pub search: String,
    pub sort_column: Option<String>,
    pub sort_direction: SortDirection,
    pub page_size: usize,
    pub page: usize,

    /// Current page and filtered set (cached).
    pub result: Option<Arc<QueryResult>>,
    pub filtered: Option<Arc<Filtered>>,
    /// Dataset ids of the filtered set, for the dataset selector.
    pub dataset_ids: Vec<String>,

    // ---- dataset detail ----
    pub library: std::result::Result<DirectoryLibrary, String>,
    /// Side-panel availability line, refreshed when the library is opened.
    library_status: String,
    pub selected_dataset: Option<String>,
    pub detail: Option<std::result::Result<DatasetDetail, String>>,
    pub preview_page: usize,
    pub preview_page_size: usize,
    /// Categorical column whose value counts are charted.
    pub breakdown_column: Option<String>,

    // ---- documentation view ----
    pub library_catalog: Option<std::result::Result<Table, String>>,
    pub doc_selected: Option<String>,
    pub doc_text: Option<std::result::Result<String, String>>,

    // ---- notes ----
    pub notes: NoteStore,
    pub show_notes: bool,
    pub note_filter: String,
    pub note_names: Vec<String>,
    pub selected_note: Option<String>,
    /// Editor buffer for the selected note.
    pub note_text: String,

    pub view: View,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    caches: Caches,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let library = open_library(&config.library);
        let library_status = describe_library(&library);
        Self {
            catalog: None,
            search: String::new(),
            sort_column: None,
            sort_direction: SortDirection::Ascending,
            page_size: config.page_size,
            page: 1,
            result: None,
            filtered: None,
            dataset_ids: Vec::new(),
            library,
            library_status,
            selected_dataset: None,
            detail: None,
            preview_page: 1,
            preview_page_size: DEFAULT_PREVIEW_PAGE_SIZE,
            breakdown_column: None,
            library_catalog: None,
            doc_selected: None,
            doc_text: None,
            notes: NoteStore::new(&config.notes),
            show_notes: false,
            note_filter: String::new(),
            note_names: Vec::new(),
            selected_note: None,
            note_text: String::new(),
            view: View::default(),
            status_message: None,
            caches: Caches::new(config.cache_capacity),
            config,
        }
    }

    /// Log and show an error; pass successes through.
    pub fn report<T>(&mut self, result: Result<T>) -> Option<T> {
        match result {
            Ok(v) => Some(v),
            Err(e) => {
                log::error!("{e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
                None
            }
        }
    }

    // ---- catalog loading ----

    /// Open the configured catalog. A missing file is not an error here:
    /// the UI then asks for a file instead.
    pub fn open_configured_catalog(&mut self) {
        let path = self.config.catalog.clone();
        if !path.exists() {
            self.status_message = Some(format!(
                "{} not found. Open a catalog file with File → Open catalog…",
                path.display()
            ));
            return;
        }
        let sheet = self.config.sheet.clone();
        let loaded = self.load_catalog(CatalogOrigin::Path(path), sheet);
        self.report(loaded);
    }

    pub fn load_catalog_from_path(&mut self, path: &Path, sheet: Option<String>) -> Result<()> {
        self.load_catalog(CatalogOrigin::Path(path.to_path_buf()), sheet)
    }

    /// Load an uploaded catalog; `name` picks the format.
    pub fn load_catalog_from_bytes(&mut self, name: &str, data: Vec<u8>, sheet: Option<String>) -> Result<()> {
        self.load_catalog(
            CatalogOrigin::Upload {
                name: name.to_string(),
                data: Arc::new(data),
            },
            sheet,
        )
    }

    fn load_catalog(&mut self, origin: CatalogOrigin, sheet: Option<String>) -> Result<()> {
        let (sheets, key, source) = match &origin {
            CatalogOrigin::Path(path) => {
                let sheets = loader::sheet_names_from_path(path)?;
                let key = SourceKey::for_path(path, sheet.as_deref())?;
                let updated = std::fs::metadata(path)
                    .and_then(|m| m.modified())
                    .unwrap_or_else(|_| SystemTime::now());
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                (sheets, key, SourceInfo { name, updated })
            }
            CatalogOrigin::Upload { name, data } => {
                let sheets = loader::sheet_names_from_bytes(data, name)?;
                let key = SourceKey::for_bytes(data, sheet.as_deref());
                let source = SourceInfo {
                    name: name.clone(),
                    updated: SystemTime::now(),
                };
                (sheets, key, source)
            }
        };

        let catalog = self.caches.catalogs.get_or_try_insert_with(&key, |_| {
            let table = match &origin {
                CatalogOrigin::Path(path) => loader::load_file(path, sheet.as_deref())?,
                CatalogOrigin::Upload { name, data } => {
                    loader::load_bytes(data, name, sheet.as_deref())?
                }
            };
            CatalogTable::new(table)
        })?;

        log::info!(
            "Loaded catalog {}: {} rows, {} columns",
            source.name,
            catalog.table().len(),
            catalog.table().num_columns()
        );

        if let Some(col) = &self.sort_column {
            if !catalog.table().has_column(col) {
                self.sort_column = None;
            }
        }
        self.catalog = Some(LoadedCatalog {
            catalog,
            key,
            origin,
            source,
            sheets,
            sheet,
        });
        self.page = 1;
        self.status_message = None;
        self.refresh();
        Ok(())
    }

    /// Re-read the current catalog and the library listing, picking up
    /// changes on disk.
    pub fn reload(&mut self) -> Result<()> {
        self.reload_library();
        let Some(loaded) = &self.catalog else {
            return Ok(());
        };
        let (origin, sheet) = (loaded.origin.clone(), loaded.sheet.clone());
        self.load_catalog(origin, sheet)
    }

    pub fn select_sheet(&mut self, sheet: String) -> Result<()> {
        let Some(loaded) = &self.catalog else {
            return Ok(());
        };
        if loaded.sheet.as_deref() == Some(sheet.as_str()) {
            return Ok(());
        }
        let origin = loaded.origin.clone();
        self.load_catalog(origin, Some(sheet))
    }

    pub fn total_rows(&self) -> usize {
        self.catalog.as_ref().map_or(0, |c| c.catalog.table().len())
    }

    // ---- querying ----

    pub fn current_spec(&self) -> QuerySpec {
        let mut spec = QuerySpec::new()
            .with_search(self.search.clone())
            .with_page_size(self.page_size)
            .with_page(self.page);
        if let Some(col) = &self.sort_column {
            spec = spec.with_sort(col.clone(), self.sort_direction);
        }
        spec
    }

    /// Recompute the current page and filtered set after a control change.
    pub fn refresh(&mut self) {
        let Some(loaded) = &self.catalog else {
            return;
        };
        let input = (loaded.key.clone(), self.current_spec());
        let table = loaded.catalog.table();

        let page = self
            .caches
            .pages
            .get_or_try_insert_with(&input, |(_, spec)| {
                Ok::<_, BrowseError>(query::query(table, spec))
            });
        let filtered = self
            .caches
            .filtered
            .get_or_try_insert_with(&input, |(_, spec)| {
                Ok::<_, BrowseError>(query::filter_sort(table, spec))
            });

        if let (Ok(page), Ok(filtered)) = (page, filtered) {
            self.page = page.page_number;
            self.dataset_ids = dataset_ids(&filtered.table);
            self.result = Some(page);
            self.filtered = Some(filtered);
        }
    }

    pub fn set_search(&mut self, text: impl Into<String>) {
        self.search = text.into();
        self.refresh();
    }

    pub fn set_sort(&mut self, column: Option<String>, direction: SortDirection) {
        self.sort_column = column;
        self.sort_direction = direction;
        self.refresh();
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.refresh();
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
        self.refresh();
    }

    pub fn total_pages(&self) -> usize {
        self.result.as_ref().map_or(1, |r| r.total_pages)
    }

    // ---- exports ----

    pub fn export_filtered(&self) -> Result<Vec<u8>> {
        match &self.filtered {
            Some(f) => export::table_to_csv(&f.table),
            None => Ok(Vec::new()),
        }
    }

    pub fn export_page(&self) -> Result<Vec<u8>> {
        match &self.result {
            Some(r) => export::table_to_csv(&r.export_rows()),
            None => Ok(Vec::new()),
        }
    }

    pub fn export_dataset(&self) -> Option<(String, Result<Vec<u8>>)> {
        match &self.detail {
            Some(Ok(d)) => Some((export::dataset_export_name(&d.name), export::table_to_csv(&d.table))),
            _ => None,
        }
    }

    // ---- dataset detail ----

    fn library(&self) -> Result<&DirectoryLibrary> {
        self.library
            .as_ref()
            .map_err(|e| BrowseError::LibraryUnavailable(e.clone()))
    }

    /// Open a dataset from the library and summarize it. A failure only
    /// affects the detail view.
    pub fn select_dataset(&mut self, name: &str) {
        self.selected_dataset = Some(name.to_string());
        self.preview_page = 1;
        let detail = self.load_detail(name);
        match &detail {
            Ok(d) => {
                self.breakdown_column = d.summary.categorical.first().map(|b| b.column.clone());
            }
            Err(e) => {
                log::error!("{e}");
                self.breakdown_column = None;
            }
        }
        self.detail = Some(detail.map_err(|e| e.to_string()));
    }

    fn load_detail(&mut self, name: &str) -> Result<DatasetDetail> {
        let library = self.library.as_ref().map_err(|e| BrowseError::LibraryUnavailable(e.clone()))?;
        // Keyed on the file's metadata, so an edited dataset is read again.
        let path = library.dataset_path(name)?;
        let key = SourceKey::for_path(&path, None).map_err(|e| BrowseError::DatasetLoad {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        let table = self
            .caches
            .datasets
            .get_or_try_insert_with(&key, |_| library.load(name))?;
        let summary = self
            .caches
            .summaries
            .get_or_try_insert_with(&key, |_| Ok::<_, BrowseError>(summary::summarize(&table)))?;
        log::info!("Opened dataset {name}: {}", summary.shape);
        Ok(DatasetDetail {
            name: name.to_string(),
            table,
            summary,
        })
    }

    pub fn detail_preview(&self) -> Option<Preview> {
        match &self.detail {
            Some(Ok(d)) => Some(summary::preview_page(
                d.table.as_ref(),
                self.preview_page,
                self.preview_page_size,
            )),
            _ => None,
        }
    }

    pub fn detail_preview_pages(&self) -> usize {
        match &self.detail {
            Some(Ok(d)) => summary::preview_pages(d.table.as_ref(), self.preview_page_size),
            _ => 1,
        }
    }

    // ---- documentation view ----

    /// Availability line for the side panel.
    pub fn library_status(&self) -> &str {
        &self.library_status
    }

    /// Reopen the library directory and drop everything read from it.
    pub fn reload_library(&mut self) {
        self.library = open_library(&self.config.library);
        self.library_status = describe_library(&self.library);
        self.library_catalog = None;
        if let Some(name) = self.doc_selected.clone() {
            self.select_documentation(&name);
        }
    }

    pub fn ensure_library_catalog(&mut self) {
        if self.library_catalog.is_some() {
            return;
        }
        let catalog = self.library().and_then(|lib| lib.catalog());
        self.library_catalog = Some(catalog.map_err(|e| e.to_string()));
    }

    /// The first rows of the library listing, as shown.
    pub fn library_catalog_preview(&self) -> Option<Table> {
        match &self.library_catalog {
            Some(Ok(t)) => Some(catalog_preview(t)),
            _ => None,
        }
    }

    pub fn library_ids(&self) -> Vec<String> {
        match &self.library_catalog {
            Some(Ok(t)) => dataset_ids(t),
            _ => Vec::new(),
        }
    }

    pub fn select_documentation(&mut self, name: &str) {
        self.doc_selected = Some(name.to_string());
        let text = self.library().and_then(|lib| lib.documentation(name));
        self.doc_text = Some(text.map_err(|e| e.to_string()));
    }

    // ---- notes ----

    pub fn refresh_notes(&mut self) {
        let names = self.notes.list(NOTE_EXTENSION);
        self.note_names = self.report(names).unwrap_or_default();
    }

    /// Note names passing the filter box.
    pub fn visible_notes(&self) -> Vec<String> {
        notes::filter_names(&self.note_names, &self.note_filter)
    }

    pub fn select_note(&mut self, name: &str) {
        let content = self.notes.read(name);
        if let Some(content) = self.report(content) {
            self.selected_note = Some(name.to_string());
            self.note_text = content;
        }
    }

    pub fn save_note(&mut self) -> Result<()> {
        let Some(name) = &self.selected_note else {
            return Ok(());
        };
        self.notes.write(name, &self.note_text)?;
        self.status_message = Some(format!("Saved {name}"));
        Ok(())
    }
}

fn open_library(root: &Path) -> std::result::Result<DirectoryLibrary, String> {
    DirectoryLibrary::open(root).map_err(|e| {
        log::warn!("{e}");
        e.to_string()
    })
}

fn describe_library(library: &std::result::Result<DirectoryLibrary, String>) -> String {
    match library {
        Ok(lib) => match lib.dataset_names() {
            Ok(names) => format!("Dataset library available: {} datasets", names.len()),
            Err(e) => format!("Dataset library available ({e})"),
        },
        Err(e) => format!("Dataset library NOT available: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const CATALOG: &str = "dataset_id,title,title_es\n\
        A1,First Dataset,Primer Conjunto\n\
        b2,Second,Segundo\n\
        C3,Third dataset,Tercer Conjunto\n\
        d4,Fourth,Cuarto\n";

    fn state_in(dir: &Path) -> AppState {
        let library = dir.join("lib");
        fs::create_dir_all(&library).unwrap();
        fs::write(library.join("A1.csv"), "x,kind\n1,a\n2,b\n3,a\n").unwrap();
        fs::write(library.join("A1.txt"), "First dataset docs\n").unwrap();
        AppState::new(Config {
            catalog: dir.join("catalog.csv"),
            library,
            notes: dir.join("notes"),
            ..Config::default()
        })
    }

    #[test]
    fn missing_configured_catalog_asks_for_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_in(dir.path());
        state.open_configured_catalog();
        assert!(state.catalog.is_none());
        assert!(state.status_message.is_some());
    }

    #[test]
    fn uploaded_catalog_is_queried() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_in(dir.path());
        state
            .load_catalog_from_bytes("catalog.csv", CATALOG.as_bytes().to_vec(), None)
            .unwrap();
        assert_eq!(state.total_rows(), 4);

        state.set_search("conjunto");
        let result = state.result.clone().unwrap();
        assert_eq!(result.total_matches, 2);
        assert_eq!(state.dataset_ids, vec!["A1", "C3"]);

        state.set_page_size(10);
        state.set_page(9);
        assert_eq!(state.page, 1);
    }

    #[test]
    fn catalog_without_required_columns_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_in(dir.path());
        let err = state
            .load_catalog_from_bytes("bad.csv", b"dataset_id,title\nx,y\n".to_vec(), None)
            .unwrap_err();
        assert!(matches!(err, BrowseError::SchemaInvalid { ref missing } if missing == &["title_es"]));
        assert!(state.catalog.is_none());
    }

    #[test]
    fn exports_drop_row_numbers_from_page() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_in(dir.path());
        fs::write(dir.path().join("catalog.csv"), CATALOG).unwrap();
        state.open_configured_catalog();
        state.set_page_size(2);

        let page = String::from_utf8(state.export_page().unwrap()).unwrap();
        assert_eq!(page, "dataset_id,title,title_es\nA1,First Dataset,Primer Conjunto\nb2,Second,Segundo\n");
        let full = String::from_utf8(state.export_filtered().unwrap()).unwrap();
        assert_eq!(full.lines().count(), 5);
    }

    #[test]
    fn dataset_detail_and_failures_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_in(dir.path());
        state
            .load_catalog_from_bytes("catalog.csv", CATALOG.as_bytes().to_vec(), None)
            .unwrap();

        state.select_dataset("b2");
        assert!(matches!(state.detail, Some(Err(_))));
        assert_eq!(state.total_rows(), 4);

        state.select_dataset("A1");
        let detail = state.detail.clone().unwrap().unwrap();
        assert_eq!(detail.summary.shape.rows, Some(3));
        let preview = state.detail_preview().unwrap();
        assert_eq!(preview.rows.len(), 3);
        let (name, csv) = state.export_dataset().unwrap();
        assert_eq!(name, "A1.csv");
        assert!(csv.is_ok());
    }

    #[test]
    fn unavailable_library_fails_every_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = AppState::new(Config {
            library: dir.path().join("nowhere"),
            ..Config::default()
        });
        assert!(state.library_status().contains("NOT available"));
        state.select_dataset("iris");
        let message = state.detail.clone().unwrap().unwrap_err();
        assert!(message.contains("unavailable"));
    }

    #[test]
    fn documentation_view_reads_library() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_in(dir.path());
        state.ensure_library_catalog();
        assert_eq!(state.library_ids(), vec!["A1"]);
        state.select_documentation("A1");
        assert_eq!(state.doc_text, Some(Ok("First dataset docs\n".to_string())));
    }

    #[test]
    fn notes_are_edited_and_saved() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_in(dir.path());
        state.notes.write("iris.md", "old").unwrap();
        state.refresh_notes();
        assert_eq!(state.visible_notes(), vec!["iris.md"]);

        state.select_note("iris.md");
        state.note_text = "new".into();
        state.save_note().unwrap();
        assert_eq!(state.notes.read("iris.md").unwrap(), "new");
    }

    #[test]
    fn edited_dataset_is_read_again() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_in(dir.path());
        state.select_dataset("A1");
        assert_eq!(state.detail.clone().unwrap().unwrap().summary.shape.rows, Some(3));

        let rows: String = (1..=7).map(|i| format!("{i},a\n")).collect();
        fs::write(dir.path().join("lib").join("A1.csv"), format!("x,kind\n{rows}")).unwrap();
        state.select_dataset("A1");
        let detail = state.detail.clone().unwrap().unwrap();
        assert_eq!(detail.table.len(), 7);
        assert_eq!(detail.summary.shape.rows, Some(7));
    }

    #[test]
    fn reload_rescans_the_library() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_in(dir.path());
        state.ensure_library_catalog();
        assert_eq!(state.library_ids(), vec!["A1"]);
        assert!(state.library_status().contains("1 datasets"));

        fs::write(dir.path().join("lib").join("B2.csv"), "y\n1\n").unwrap();
        assert!(state.library_status().contains("1 datasets"));
        state.reload().unwrap();
        assert!(state.library_status().contains("2 datasets"));
        state.ensure_library_catalog();
        assert_eq!(state.library_ids(), vec!["A1", "B2"]);
    }

    #[test]
    fn invalid_configured_catalog_keeps_the_reason() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_in(dir.path());
        fs::write(dir.path().join("catalog.csv"), "dataset_id,title\nx,y\n").unwrap();
        state.open_configured_catalog();
        assert!(state.catalog.is_none());
        assert!(state.config.catalog.exists());
        let message = state.status_message.clone().unwrap();
        assert!(message.contains("missing the required columns: title_es"));
    }
}
