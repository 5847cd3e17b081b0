use std::{path::PathBuf, sync::Arc};

mod backend_bridge;
mod controller;
mod media;
mod ui;

use anyhow::Context;
use clap::Parser;
use crossbeam_channel::bounded;
use eframe::egui;
use review_client::{
    config::{load_settings, load_settings_from},
    ConsoleSettings, HttpRecordsApi, RecordsApi,
};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::media::{player::AudioCommand, WorkerAudioBackend};
use crate::ui::app::{PersistedConsoleSettings, ReviewConsoleApp, SETTINGS_STORAGE_KEY};

#[derive(Debug, Parser)]
#[command(
    name = "review_gui",
    about = "Desktop console for reviewing transcribed audio records"
)]
struct Args {
    /// Backend base URL, e.g. http://127.0.0.1:8000
    #[arg(long)]
    backend_url: Option<String>,
    /// Records per page
    #[arg(long)]
    page_size: Option<u32>,
    /// Settings file to read instead of ./review.toml
    #[arg(long)]
    config: Option<PathBuf>,
}

fn resolve_settings(args: &Args) -> anyhow::Result<ConsoleSettings> {
    let mut settings = match &args.config {
        Some(path) => load_settings_from(path)
            .with_context(|| format!("failed to load settings from '{}'", path.display()))?,
        None => load_settings(),
    };
    if let Some(url) = &args.backend_url {
        settings.backend_url = url.clone();
    }
    if let Some(page_size) = args.page_size {
        settings.page_size = page_size;
    }
    settings.validated().context("invalid console settings")
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let args = Args::parse();
    let settings = resolve_settings(&args)?;
    tracing::info!(
        backend_url = %settings.backend_url,
        page_size = settings.page_size,
        "starting review console"
    );

    let api: Arc<dyn RecordsApi> = Arc::new(HttpRecordsApi::from_settings(&settings));
    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (audio_tx, audio_rx) = bounded::<AudioCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    backend_bridge::runtime::launch(Arc::clone(&api), cmd_rx, ui_tx.clone());
    media::player::spawn_audio_worker(Arc::clone(&api), settings.volume, audio_rx, ui_tx);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Transcript Review Console")
            .with_inner_size([1100.0, 760.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Transcript Review Console",
        options,
        Box::new(move |cc| {
            let persisted_settings = cc.storage.and_then(|storage| {
                storage
                    .get_string(SETTINGS_STORAGE_KEY)
                    .and_then(|text| serde_json::from_str::<PersistedConsoleSettings>(&text).ok())
            });
            Ok(Box::new(ReviewConsoleApp::new(
                &settings,
                cmd_tx,
                ui_rx,
                WorkerAudioBackend::new(audio_tx),
                persisted_settings,
            )))
        }),
    )
    .map_err(|err| anyhow::anyhow!("console window failed: {err}"))
}
