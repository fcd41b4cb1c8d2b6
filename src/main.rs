#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use eframe::egui;

mod app;
mod error;
mod modules;
mod style;

const WINDOW_TITLE: &str = "Batch Image Converter";

fn window_size() -> [f32; 2] {
    if cfg!(target_os = "macos") {
        [580.0, 520.0]
    } else {
        [540.0, 480.0]
    }
}

fn init_tracing() {
    let level = if cfg!(debug_assertions) {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_thread_names(true)
        .with_writer(std::io::stdout)
        .compact()
        .init();
}

fn main() -> eframe::Result<()> {
    init_tracing();
    tracing::info!("=== {} starting ===", WINDOW_TITLE);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(window_size())
            .with_resizable(false)
            .with_maximize_button(false)
            .with_title(WINDOW_TITLE),
        ..Default::default()
    };

    eframe::run_native(
        WINDOW_TITLE,
        options,
        Box::new(|cc| Ok(Box::new(app::ConverterApp::new(cc)))),
    )
}
