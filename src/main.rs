mod app;
mod color;
mod config;
mod ui;

use app::DashboardApp;
use clap::Parser;
use eframe::egui;
use health_dashboard::state::AppState;

fn main() -> eframe::Result {
    env_logger::init();
    let config = config::Config::parse();

    // A missing file is reported in the window instead of the charts.
    let mut state = AppState::new(&config.data);
    state.load();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Health Data Visualization Dashboard",
        options,
        Box::new(move |_cc| Ok(Box::new(DashboardApp::new(state)))),
    )
}
