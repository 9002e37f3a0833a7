mod app;
mod color;
mod ui;

use app::CatalogBrowserApp;
use catalog_browser::config::Config;
use clap::Parser;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();
    let config = Config::parse();
    log::info!("Starting with {config:?}");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Dataset Catalog Browser",
        options,
        Box::new(|_cc| Ok(Box::new(CatalogBrowserApp::new(config)))),
    )
}
