use eframe::egui::Ui;
use egui_plot::{Bar, BarChart, Plot};

use catalog_browser::data::summary::ValueCount;

use crate::color;

// ---------------------------------------------------------------------------
// Value-count bar chart
// ---------------------------------------------------------------------------

/// Bars in count order, one per value, labelled on the x axis.
pub fn value_counts_chart(ui: &mut Ui, id: &str, counts: &[ValueCount]) {
    let labels: Vec<String> = counts.iter().map(|c| c.value.to_string()).collect();
    let bars: Vec<Bar> = counts
        .iter()
        .zip(color::bar_colors(counts))
        .enumerate()
        .map(|(i, (c, fill))| {
            Bar::new(i as f64, c.count as f64)
                .name(&labels[i])
                .fill(fill)
        })
        .collect();

    Plot::new(id)
        .height(220.0)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .allow_boxed_zoom(false)
        .y_axis_label("count")
        .x_axis_formatter(move |mark, _range| {
            let i = mark.value.round();
            if (mark.value - i).abs() > 1e-6 || i < 0.0 {
                return String::new();
            }
            labels.get(i as usize).cloned().unwrap_or_default()
        })
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).width(0.7));
        });
}
