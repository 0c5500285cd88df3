#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod api;
mod config;
mod feed;
mod gui;

use eframe::egui;
use gui::AirdropHubApp;

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1120.0, 700.0])
            .with_min_inner_size([820.0, 560.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Airdrop Hub",
        options,
        Box::new(|cc| Ok(Box::new(AirdropHubApp::new(cc)))),
    )
}
