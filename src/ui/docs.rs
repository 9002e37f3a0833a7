use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use catalog_browser::export::{self, LIBRARY_CATALOG_EXPORT_NAME};
use catalog_browser::state::AppState;

use super::panels::save_dialog;
use super::table::data_table;

// ---------------------------------------------------------------------------
// Documentation view – library listing and per-dataset docs
// ---------------------------------------------------------------------------

pub fn documentation_view(ui: &mut Ui, state: &mut AppState) {
    state.ensure_library_catalog();

    ui.heading("Dataset library");
    if let Some(Err(message)) = &state.library_catalog {
        ui.label(RichText::new(message).color(Color32::RED));
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            if let Some(preview) = state.library_catalog_preview() {
                ui.weak(format!("First {} datasets", preview.len()));
                data_table(ui, "library_catalog", &preview, 300.0);
            }
            if ui.button("⬇ Library catalog (CSV)").clicked() {
                let bytes = match &state.library_catalog {
                    Some(Ok(table)) => export::table_to_csv(table),
                    _ => Ok(Vec::new()),
                };
                save_dialog(state, "Save library catalog", LIBRARY_CATALOG_EXPORT_NAME, bytes);
            }
            ui.separator();

            let ids = state.library_ids();
            let current = state.doc_selected.clone();
            let mut chosen = None;
            egui::ComboBox::from_id_salt("doc_dataset")
                .selected_text(current.as_deref().unwrap_or("Choose a dataset…"))
                .show_ui(ui, |ui: &mut Ui| {
                    for id in &ids {
                        if ui.selectable_label(current.as_ref() == Some(id), id).clicked() {
                            chosen = Some(id.clone());
                        }
                    }
                });
            if let Some(id) = chosen {
                state.select_documentation(&id);
            }

            let (Some(name), Some(text)) = (state.doc_selected.clone(), state.doc_text.clone()) else {
                return;
            };
            match text {
                Ok(text) if text.is_empty() => {
                    ui.weak("No documentation for this dataset.");
                }
                Ok(text) => {
                    if ui.button("⬇ Documentation (TXT)").clicked() {
                        let file_name = export::documentation_export_name(&name);
                        save_dialog(state, "Save documentation", &file_name, Ok(text.clone().into_bytes()));
                    }
                    ui.monospace(text);
                }
                Err(message) => {
                    ui.label(RichText::new(message).color(Color32::RED));
                }
            }
        });
}
