mod backend_bridge;
mod controller;
mod ui;

use anyhow::anyhow;
use clap::Parser;
use crossbeam_channel::bounded;
use eframe::egui;
use tracing_subscriber::EnvFilter;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::ui::{RagDesktopApp, StartupConfig};

#[derive(Parser, Debug)]
struct Args {
    /// Backend base URL; overrides `rag_client.toml` and the environment.
    #[arg(long)]
    api_base: Option<String>,
    /// Used when `RUST_LOG` is unset.
    #[arg(long, default_value = "info")]
    log_filter: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_filter)),
        )
        .init();

    let mut settings = client_core::load_settings();
    if let Some(api_base) = args.api_base {
        settings.api_base = api_base;
    }
    tracing::info!(api_base = %settings.api_base, strict_drop_filter = settings.strict_drop_filter, "starting");

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(settings.command_queue_depth);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(256);
    backend_bridge::runtime::launch(settings.api_base.clone(), cmd_rx, ui_tx);

    let startup = StartupConfig {
        api_base: settings.api_base,
        strict_drop_filter: settings.strict_drop_filter,
    };
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("RAG Desktop")
            .with_inner_size([960.0, 760.0])
            .with_min_inner_size([640.0, 480.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "RAG Desktop",
        options,
        Box::new(|_cc| Ok(Box::new(RagDesktopApp::new(cmd_tx, ui_rx, startup)))),
    )
    .map_err(|err| anyhow!("failed to run desktop window: {err}"))
}
