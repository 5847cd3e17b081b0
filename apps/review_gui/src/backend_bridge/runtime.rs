//! Runtime bridge between UI command queue and backend event intake.

use std::{sync::Arc, thread};

use crossbeam_channel::{Receiver, Sender};
use review_client::{session::perform_write, RecordsApi};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

/// Starts the backend worker thread. Every command runs as its own task so
/// slow requests never hold up later ones; ordering is restored by the
/// list controller's load generations.
pub fn launch(api: Arc<dyn RecordsApi>, cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };
        tracing::info!("backend worker ready");
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker ready".to_string()));

        for cmd in cmd_rx.iter() {
            let api = Arc::clone(&api);
            let ui_tx = ui_tx.clone();
            runtime.spawn(async move {
                let name = cmd.name();
                let event = run_command(api.as_ref(), cmd).await;
                if ui_tx.try_send(event).is_err() {
                    tracing::warn!(command = name, "ui event queue unavailable; result dropped");
                }
            });
        }
        tracing::info!("backend command queue closed; worker exiting");
    });
}

pub async fn run_command(api: &dyn RecordsApi, cmd: BackendCommand) -> UiEvent {
    match cmd {
        BackendCommand::LoadPage { ticket } => {
            tracing::info!(
                page = ticket.query.page,
                generation = ticket.generation,
                "backend: load_page"
            );
            let result = api.fetch_page(ticket.query).await;
            UiEvent::PageLoaded { ticket, result }
        }
        BackendCommand::Write { write } => {
            tracing::info!(record_id = write.id().0, op = write.label(), "backend: write");
            let result = perform_write(api, &write).await;
            UiEvent::WriteFinished { write, result }
        }
        BackendCommand::ExportCsv { dest } => {
            tracing::info!(dest = %dest.display(), "backend: export_csv");
            let result = api.export_csv(&dest).await;
            UiEvent::ExportFinished { dest, result }
        }
    }
}
