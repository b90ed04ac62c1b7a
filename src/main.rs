mod app;
mod color;
mod data;
mod export;
mod pipeline;
mod state;
mod ui;

use app::RustyTrendsApp;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "Rusty Trends – Time-Series Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(RustyTrendsApp::default()))),
    )
}
