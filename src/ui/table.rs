use eframe::egui::{self, Ui};
use egui_extras::{Column, TableBuilder};

use catalog_browser::data::model::Table;

const ROW_HEIGHT: f32 = 18.0;

// ---------------------------------------------------------------------------
// Read-only table grid
// ---------------------------------------------------------------------------

/// Render `table` as a striped, scrollable grid. `id` keeps several grids
/// in one panel apart.
pub fn data_table(ui: &mut Ui, id: &str, table: &Table, max_height: f32) {
    if table.num_columns() == 0 {
        ui.weak("(no columns)");
        return;
    }

    ui.push_id(id, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .columns(Column::auto().at_least(40.0).clip(true), table.num_columns())
            .min_scrolled_height(0.0)
            .max_scroll_height(max_height)
            .header(ROW_HEIGHT + 2.0, |mut header| {
                for name in table.columns() {
                    header.col(|ui: &mut Ui| {
                        ui.strong(name);
                    });
                }
            })
            .body(|body| {
                body.rows(ROW_HEIGHT, table.len(), |mut row| {
                    let values = &table.rows()[row.index()];
                    for value in values {
                        row.col(|ui: &mut Ui| {
                            ui.label(value.to_string());
                        });
                    }
                });
            });
    });
}

/// Two-column name / value grid.
pub fn key_value_grid<'a>(ui: &mut Ui, id: &str, entries: impl IntoIterator<Item = (&'a str, String)>) {
    egui::Grid::new(id)
        .num_columns(2)
        .striped(true)
        .show(ui, |ui: &mut Ui| {
            for (key, value) in entries {
                ui.label(key);
                ui.monospace(value);
                ui.end_row();
            }
        });
}
