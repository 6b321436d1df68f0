#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod cli;
mod config;
mod error;
mod interaction;
mod io;
mod layout;
mod model;
mod state;
mod store;
mod ui;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::app::TimelineApp;
use crate::cli::Cli;
use crate::config::TimelineConfig;

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(TimelineConfig::default_path);
    let mut config = TimelineConfig::load_or_default(&config_path);
    if let Some(latency_ms) = cli.latency_ms {
        config.store_latency_ms = latency_ms;
    }

    let today = chrono::Local::now().date_naive();
    let project = match &cli.project {
        Some(path) => match io::load_project(path) {
            Ok(project) => project,
            Err(err) => {
                tracing::error!("{err}; opening the sample project instead");
                TimelineApp::sample_project(today)
            }
        },
        None => TimelineApp::sample_project(today),
    };
    tracing::info!(project = %project.name, latency_ms = config.store_latency_ms, "starting");

    let title = format!("Portfolio Timeline: {}", project.name);
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([800.0, 400.0])
            .with_title(title),
        ..Default::default()
    };

    eframe::run_native(
        "Portfolio Timeline",
        options,
        Box::new(move |_cc| Ok(Box::new(TimelineApp::new(project, cli.project, config)))),
    )
}
