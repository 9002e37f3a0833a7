use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use catalog_browser::data::summary::{
    ColumnStats, NumericStats, PREVIEW_PAGE_SIZES, SummaryError, ValueCount,
};
use catalog_browser::data::model::{Table, Value};
use catalog_browser::export::{FILTERED_EXPORT_NAME, PAGE_EXPORT_NAME};
use catalog_browser::state::{AppState, DatasetDetail};

use super::chart::value_counts_chart;
use super::panels::{save_dialog, upload_catalog_dialog};
use super::table::{data_table, key_value_grid};

// ---------------------------------------------------------------------------
// Catalog view (central panel)
// ---------------------------------------------------------------------------

pub fn catalog_view(ui: &mut Ui, state: &mut AppState) {
    if state.catalog.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.vertical_centered(|ui: &mut Ui| {
                ui.heading("No catalog loaded");
                if !state.config.catalog.exists() {
                    ui.label(format!(
                        "{} was not found. Choose a catalog file to upload.",
                        state.config.catalog.display()
                    ));
                } else if let Some(msg) = &state.status_message {
                    ui.label(RichText::new(msg).color(Color32::RED));
                    ui.label("Choose another catalog file to upload.");
                }
                if ui.button("Upload catalog…").clicked() {
                    upload_catalog_dialog(state);
                }
            });
        });
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            results_section(ui, state);
            ui.separator();
            dataset_section(ui, state);
        });
}

fn results_section(ui: &mut Ui, state: &mut AppState) {
    let Some(result) = state.result.clone() else {
        return;
    };

    // ---- Metrics ----
    ui.horizontal(|ui: &mut Ui| {
        metric(ui, "Total datasets", state.total_rows());
        ui.separator();
        metric(ui, "Matching", result.total_matches);
        ui.separator();
        metric(ui, "Pages", result.total_pages);
    });

    if let Some(reason) = &result.sort_skipped {
        ui.label(RichText::new(format!("Sort not applied: {reason}")).color(Color32::from_rgb(200, 120, 0)));
    }

    if result.total_matches == 0 {
        ui.label("No datasets match the search.");
        return;
    }
    ui.label(format!(
        "Showing {}–{} of {}",
        result.start_index, result.end_index, result.total_matches
    ));

    // ---- Exports ----
    ui.horizontal(|ui: &mut Ui| {
        if ui.button("⬇ Filtered results (CSV)").clicked() {
            let bytes = state.export_filtered();
            save_dialog(state, "Save filtered results", FILTERED_EXPORT_NAME, bytes);
        }
        if ui.button("⬇ Current page (CSV)").clicked() {
            let bytes = state.export_page();
            save_dialog(state, "Save current page", PAGE_EXPORT_NAME, bytes);
        }
    });

    data_table(ui, "catalog_page", &result.rows, 420.0);

    // ---- Page navigation ----
    ui.horizontal(|ui: &mut Ui| {
        if ui
            .add_enabled(result.page_number > 1, egui::Button::new("◀ Previous"))
            .clicked()
        {
            state.set_page(result.page_number - 1);
        }
        ui.label(format!("Page {} of {}", result.page_number, result.total_pages));
        if ui
            .add_enabled(result.page_number < result.total_pages, egui::Button::new("Next ▶"))
            .clicked()
        {
            state.set_page(result.page_number + 1);
        }
    });
}

fn metric(ui: &mut Ui, label: &str, value: usize) {
    ui.vertical(|ui: &mut Ui| {
        ui.weak(label);
        ui.heading(value.to_string());
    });
}

// ---------------------------------------------------------------------------
// Dataset detail
// ---------------------------------------------------------------------------

fn dataset_section(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Dataset detail");
    if state.dataset_ids.is_empty() {
        ui.weak("No datasets to inspect.");
        return;
    }

    let ids = state.dataset_ids.clone();
    let current = state.selected_dataset.clone();
    let mut chosen = None;
    egui::ComboBox::from_id_salt("dataset")
        .selected_text(current.as_deref().unwrap_or("Choose a dataset…"))
        .show_ui(ui, |ui: &mut Ui| {
            for id in &ids {
                if ui.selectable_label(current.as_ref() == Some(id), id).clicked() {
                    chosen = Some(id.clone());
                }
            }
        });
    if let Some(id) = chosen {
        state.select_dataset(&id);
    }

    match state.detail.clone() {
        None => {}
        Some(Err(message)) => {
            ui.label(RichText::new(message).color(Color32::RED));
        }
        Some(Ok(detail)) => detail_view(ui, state, &detail),
    }
}

fn detail_view(ui: &mut Ui, state: &mut AppState, detail: &DatasetDetail) {
    let summary = &detail.summary;
    ui.label(format!("Shape: {}", summary.shape));

    if ui.button("⬇ Full dataset (CSV)").clicked() {
        if let Some((name, bytes)) = state.export_dataset() {
            save_dialog(state, "Save dataset", &name, bytes);
        }
    }

    // ---- Preview ----
    egui::CollapsingHeader::new(RichText::new("Preview").strong())
        .id_salt("preview")
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            let pages = state.detail_preview_pages();
            ui.horizontal(|ui: &mut Ui| {
                ui.label("Rows per page");
                ui.add(
                    egui::DragValue::new(&mut state.preview_page_size)
                        .range(PREVIEW_PAGE_SIZES),
                );
                ui.label("Page");
                ui.add(egui::DragValue::new(&mut state.preview_page).range(1..=pages));
                ui.label(format!("of {pages}"));
            });
            if let Some(preview) = state.detail_preview() {
                ui.weak(format!("Rows {}–{}", preview.start, preview.end));
                data_table(ui, "dataset_preview", &preview.rows, 300.0);
            }
        });

    // ---- Column types ----
    egui::CollapsingHeader::new(RichText::new("Column types").strong())
        .id_salt("dtypes")
        .show(ui, |ui: &mut Ui| {
            key_value_grid(
                ui,
                "dtypes_grid",
                summary.dtypes.iter().map(|(name, ty)| (name.as_str(), ty.to_string())),
            );
        });

    // ---- Statistics ----
    egui::CollapsingHeader::new(RichText::new("Numeric statistics").strong())
        .id_salt("numeric_stats")
        .show(ui, |ui: &mut Ui| match &summary.numeric {
            Ok(stats) => data_table(ui, "numeric_stats_table", &numeric_table(stats), 300.0),
            Err(e) => section_error(ui, e),
        });

    egui::CollapsingHeader::new(RichText::new("All columns").strong())
        .id_salt("overall_stats")
        .show(ui, |ui: &mut Ui| match &summary.overall {
            Ok(stats) => data_table(ui, "overall_stats_table", &overall_table(stats), 300.0),
            Err(e) => section_error(ui, e),
        });

    // ---- Value counts ----
    egui::CollapsingHeader::new(RichText::new("Categorical columns").strong())
        .id_salt("categorical")
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            if summary.categorical.is_empty() {
                ui.weak("No categorical columns.");
                return;
            }
            let selected = state.breakdown_column.clone().unwrap_or_default();
            egui::ComboBox::from_id_salt("breakdown_column")
                .selected_text(&selected)
                .show_ui(ui, |ui: &mut Ui| {
                    for b in &summary.categorical {
                        if ui.selectable_label(selected == b.column, &b.column).clicked() {
                            state.breakdown_column = Some(b.column.clone());
                        }
                    }
                });
            let Some(breakdown) = summary.categorical.iter().find(|b| b.column == selected) else {
                return;
            };
            match &breakdown.counts {
                Ok(counts) => {
                    value_counts_chart(ui, "value_counts_chart", counts);
                    data_table(ui, "value_counts_table", &counts_table(&breakdown.column, counts), 240.0);
                }
                Err(e) => section_error(ui, e),
            }
        });
}

fn section_error(ui: &mut Ui, error: &SummaryError) {
    ui.label(RichText::new(format!("Unavailable: {error}")).color(Color32::from_rgb(200, 120, 0)));
}

// ---------------------------------------------------------------------------
// Statistics as tables
// ---------------------------------------------------------------------------

const NUMERIC_HEADERS: [&str; 9] = ["column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"];

fn numeric_row(name: &str, s: &NumericStats) -> Vec<Value> {
    let mut row = vec![Value::from(name), Value::Integer(s.count as i64)];
    row.extend([s.mean, s.std, s.min, s.q25, s.q50, s.q75, s.max].map(Value::from));
    row
}

fn numeric_table(stats: &[(String, NumericStats)]) -> Table {
    let mut table = Table::new(NUMERIC_HEADERS.iter().map(|h| h.to_string()).collect());
    for (name, s) in stats {
        table.push_row(numeric_row(name, s)).ok();
    }
    table
}

fn overall_table(stats: &[(String, ColumnStats)]) -> Table {
    let mut headers: Vec<String> = NUMERIC_HEADERS.iter().map(|h| h.to_string()).collect();
    headers.extend(["unique", "top", "freq"].map(String::from));
    let width = headers.len();
    let mut table = Table::new(headers);
    for (name, s) in stats {
        let row = match s {
            ColumnStats::Numeric(n) => {
                let mut row = numeric_row(name, n);
                row.resize(width, Value::Null);
                row
            }
            ColumnStats::Categorical(c) => {
                let mut row = vec![Value::from(name.as_str()), Value::Integer(c.count as i64)];
                row.resize(NUMERIC_HEADERS.len(), Value::Null);
                row.push(Value::Integer(c.unique as i64));
                row.push(c.top.clone().unwrap_or(Value::Null));
                row.push(Value::from(c.freq.map(|f| f as i64)));
                row
            }
        };
        table.push_row(row).ok();
    }
    table
}

fn counts_table(column: &str, counts: &[ValueCount]) -> Table {
    let mut table = Table::new(vec![column.to_string(), "count".to_string()]);
    for c in counts {
        table.push_row(vec![c.value.clone(), Value::Integer(c.count as i64)]).ok();
    }
    table
}
