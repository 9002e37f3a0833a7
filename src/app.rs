use eframe::egui;

use catalog_browser::config::Config;
use catalog_browser::state::{AppState, View};

use crate::ui::{catalog, docs, notes, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct CatalogBrowserApp {
    pub state: AppState,
}

impl CatalogBrowserApp {
    /// Opens the configured catalog straight away.
    pub fn new(config: Config) -> Self {
        let mut state = AppState::new(config);
        state.open_configured_catalog();
        Self { state }
    }
}

impl eframe::App for CatalogBrowserApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: query controls ----
        egui::SidePanel::left("control_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: current view ----
        egui::CentralPanel::default().show(ctx, |ui| match self.state.view {
            View::Catalog => catalog::catalog_view(ui, &mut self.state),
            View::Documentation => docs::documentation_view(ui, &mut self.state),
            View::Notes => notes::notes_view(ui, &mut self.state),
        });
    }
}
