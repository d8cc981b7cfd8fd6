mod app;
mod color;
mod config;
mod data;
mod state;
mod ui;

use std::path::PathBuf;

use app::WindViewerApp;
use config::ViewerConfig;
use eframe::egui;
use state::AppState;

fn main() -> eframe::Result {
    env_logger::init();

    let mut config = ViewerConfig::discover();
    if let Some(dir) = std::env::args_os().nth(1) {
        config.data_dir = PathBuf::from(dir);
    }

    let mut state = AppState::new(config);
    state.refresh();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "GFS Wind Viewer",
        options,
        Box::new(|_cc| Ok(Box::new(WindViewerApp::new(state)))),
    )
}
