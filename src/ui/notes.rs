use eframe::egui::{self, RichText, ScrollArea, Ui};

use catalog_browser::notes::NotePreview;
use catalog_browser::state::AppState;

use super::panels::save_dialog;

// ---------------------------------------------------------------------------
// Notes view – list, editor and preview
// ---------------------------------------------------------------------------

pub fn notes_view(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        ui.heading("Notes");
        if ui.small_button("⟳").on_hover_text("Rescan the notes directory").clicked() {
            state.refresh_notes();
        }
    });
    ui.horizontal(|ui: &mut Ui| {
        ui.label("Filter");
        ui.text_edit_singleline(&mut state.note_filter);
    });

    let visible = state.visible_notes();
    let current = state.selected_note.clone();
    let mut chosen = None;
    egui::ComboBox::from_id_salt("note")
        .selected_text(current.as_deref().unwrap_or("Choose a note…"))
        .show_ui(ui, |ui: &mut Ui| {
            for name in &visible {
                if ui.selectable_label(current.as_ref() == Some(name), name).clicked() {
                    chosen = Some(name.clone());
                }
            }
        });
    if let Some(name) = chosen {
        state.select_note(&name);
    }

    let Some(name) = state.selected_note.clone() else {
        if visible.is_empty() {
            ui.weak(format!("No notes in {}.", state.notes.dir().display()));
        }
        return;
    };

    ui.separator();
    ui.horizontal(|ui: &mut Ui| {
        if ui.button("💾 Save").clicked() {
            let saved = state.save_note();
            state.report(saved);
        }
        if ui.button("📋 Copy").clicked() {
            ui.ctx().copy_text(state.note_text.clone());
            state.status_message = Some(format!("Copied {name} to the clipboard"));
        }
        if ui.button("⬇ Export").clicked() {
            let bytes = Ok(state.note_text.clone().into_bytes());
            save_dialog(state, "Export note", &name, bytes);
        }
    });

    ui.columns(2, |columns: &mut [Ui]| {
        columns[0].label(RichText::new("Editor").strong());
        ScrollArea::vertical()
            .id_salt("note_editor")
            .show(&mut columns[0], |ui: &mut Ui| {
                ui.add(
                    egui::TextEdit::multiline(&mut state.note_text)
                        .code_editor()
                        .desired_rows(24)
                        .desired_width(f32::INFINITY),
                );
            });

        columns[1].label(RichText::new("Preview").strong());
        let preview = NotePreview::of(&state.note_text);
        if matches!(preview, NotePreview::Truncated(_)) {
            columns[1].weak("Shortened; the editor shows the whole note.");
        }
        ScrollArea::vertical()
            .id_salt("note_preview")
            .show(&mut columns[1], |ui: &mut Ui| {
                ui.monospace(preview.text());
            });
    });
}
