use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use catalog_browser::data::query::{PAGE_SIZES, SortDirection};
use catalog_browser::error::{BrowseError, Result};
use catalog_browser::notes::NotePreview;
use catalog_browser::state::{AppState, View};

const CATALOG_EXTENSIONS: [&str; 9] = ["xlsx", "xlsm", "xlsb", "xls", "ods", "csv", "json", "parquet", "pq"];

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu, view tabs and source caption.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open catalog…").clicked() {
                open_catalog_dialog(state);
                ui.close_menu();
            }
            if ui
                .add_enabled(state.catalog.is_some(), egui::Button::new("Reload"))
                .clicked()
            {
                let reloaded = state.reload();
                state.report(reloaded);
                ui.close_menu();
            }
        });

        ui.separator();

        ui.selectable_value(&mut state.view, View::Catalog, "Catalog");
        ui.selectable_value(&mut state.view, View::Documentation, "Documentation");
        ui.selectable_value(&mut state.view, View::Notes, "Notes");

        ui.separator();

        if let Some(loaded) = &state.catalog {
            ui.weak(loaded.source.caption());
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Left side panel – query controls and notes
// ---------------------------------------------------------------------------

/// Render the left control panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Dataset catalog");
    let available = state.library.is_ok();
    let status = state.library_status();
    ui.label(RichText::new(status).color(if available {
        Color32::DARK_GREEN
    } else {
        Color32::from_rgb(200, 120, 0)
    }));
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            query_controls(ui, state);
            ui.separator();
            notes_controls(ui, state);
        });
}

fn query_controls(ui: &mut Ui, state: &mut AppState) {
    let Some(loaded) = &state.catalog else {
        ui.label("No catalog loaded.");
        return;
    };
    // Clone what we need so we can mutate state below.
    let sheets = loaded.sheets.clone();
    let current_sheet = loaded
        .sheet
        .clone()
        .or_else(|| sheets.first().cloned())
        .unwrap_or_default();
    let columns = loaded.catalog.table().columns().to_vec();

    // ---- Sheet selector ----
    if sheets.len() > 1 {
        ui.strong("Sheet");
        let mut chosen = None;
        egui::ComboBox::from_id_salt("sheet")
            .selected_text(&current_sheet)
            .show_ui(ui, |ui: &mut Ui| {
                for sheet in &sheets {
                    if ui.selectable_label(current_sheet == *sheet, sheet).clicked() {
                        chosen = Some(sheet.clone());
                    }
                }
            });
        if let Some(sheet) = chosen {
            let selected = state.select_sheet(sheet);
            state.report(selected);
        }
        ui.separator();
    }

    // ---- Search ----
    ui.strong("Search");
    let mut search = state.search.clone();
    if ui
        .add(egui::TextEdit::singleline(&mut search).hint_text("dataset_id, title or title_es"))
        .changed()
    {
        state.set_search(search);
    }
    ui.add_space(6.0);

    // ---- Page size ----
    ui.strong("Rows per page");
    let mut page_size = state.page_size;
    egui::ComboBox::from_id_salt("page_size")
        .selected_text(page_size.to_string())
        .show_ui(ui, |ui: &mut Ui| {
            for size in PAGE_SIZES {
                ui.selectable_value(&mut page_size, size, size.to_string());
            }
        });
    if page_size != state.page_size {
        state.set_page_size(page_size);
    }
    ui.add_space(6.0);

    // ---- Sort ----
    ui.strong("Sort by");
    let mut sort_column = state.sort_column.clone();
    egui::ComboBox::from_id_salt("sort_column")
        .selected_text(sort_column.as_deref().unwrap_or("None"))
        .show_ui(ui, |ui: &mut Ui| {
            ui.selectable_value(&mut sort_column, None, "None");
            for col in &columns {
                ui.selectable_value(&mut sort_column, Some(col.clone()), col);
            }
        });
    let mut direction = state.sort_direction;
    ui.horizontal(|ui: &mut Ui| {
        ui.radio_value(&mut direction, SortDirection::Ascending, "Ascending");
        ui.radio_value(&mut direction, SortDirection::Descending, "Descending");
    });
    if sort_column != state.sort_column || direction != state.sort_direction {
        state.set_sort(sort_column, direction);
    }
    ui.add_space(6.0);

    // ---- Page ----
    let total_pages = state.total_pages();
    let mut page = state.page;
    ui.horizontal(|ui: &mut Ui| {
        ui.strong("Page");
        ui.add(egui::DragValue::new(&mut page).range(1..=total_pages));
        ui.label(format!("of {total_pages}"));
    });
    if page != state.page {
        state.set_page(page);
    }
}

fn notes_controls(ui: &mut Ui, state: &mut AppState) {
    if ui.checkbox(&mut state.show_notes, "Show notes").changed() && state.show_notes {
        state.refresh_notes();
    }
    if !state.show_notes {
        return;
    }

    ui.label(format!("Notes in {}", state.notes.dir().display()));
    ui.add(egui::TextEdit::singleline(&mut state.note_filter).hint_text("Filter notes"));

    let visible = state.visible_notes();
    if visible.is_empty() {
        ui.weak("No notes found.");
        return;
    }

    let mut open = None;
    for name in &visible {
        egui::CollapsingHeader::new(RichText::new(name).strong())
            .id_salt(name)
            .default_open(false)
            .show(ui, |ui: &mut Ui| {
                match state.notes.read(name) {
                    Ok(content) => {
                        let preview = NotePreview::of(&content);
                        ui.monospace(preview.text());
                    }
                    Err(e) => {
                        ui.label(RichText::new(e.to_string()).color(Color32::RED));
                    }
                }
                if ui.small_button("Open in editor").clicked() {
                    open = Some(name.clone());
                }
            });
    }
    if let Some(name) = open {
        state.select_note(&name);
        state.view = View::Notes;
    }
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

fn pick_catalog_file() -> Option<std::path::PathBuf> {
    rfd::FileDialog::new()
        .set_title("Open catalog")
        .add_filter("Supported files", &CATALOG_EXTENSIONS)
        .add_filter("Excel / ODS", &["xlsx", "xlsm", "xlsb", "xls", "ods"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file()
}

pub fn open_catalog_dialog(state: &mut AppState) {
    if let Some(path) = pick_catalog_file() {
        let loaded = state.load_catalog_from_path(&path, None);
        state.report(loaded);
    }
}

/// Read the chosen file whole and load it as an uploaded catalog.
pub fn upload_catalog_dialog(state: &mut AppState) {
    let Some(path) = pick_catalog_file() else {
        return;
    };
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let loaded = std::fs::read(&path)
        .map_err(BrowseError::from)
        .and_then(|bytes| state.load_catalog_from_bytes(&name, bytes, None));
    state.report(loaded);
}

/// Ask where to save `bytes` and write them there.
pub fn save_dialog(state: &mut AppState, title: &str, file_name: &str, bytes: Result<Vec<u8>>) {
    let Some(bytes) = state.report(bytes) else {
        return;
    };
    let Some(path) = rfd::FileDialog::new()
        .set_title(title)
        .set_file_name(file_name)
        .save_file()
    else {
        return;
    };
    match std::fs::write(&path, bytes) {
        Ok(()) => {
            log::info!("Saved {}", path.display());
            state.status_message = Some(format!("Saved {}", path.display()));
        }
        Err(e) => {
            state.report::<()>(Err(e.into()));
        }
    }
}
