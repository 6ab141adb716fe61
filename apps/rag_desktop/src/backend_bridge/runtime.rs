//! Runtime bridge between UI command queue and backend event intake.

use std::thread;

use client_core::{FileUpload, QaBackend, TransferClient};
use crossbeam_channel::{Receiver, Sender};
use tracing::{info, warn};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};
use crate::controller::session::{FileSource, SelectedFile};

pub fn launch(api_base: String, cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
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

        let client = match TransferClient::new(&api_base) {
            Ok(client) => client,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_transfer(
                    UiErrorContext::BackendStartup,
                    &err,
                )));
                tracing::error!("backend worker startup failure: {err}");
                return;
            }
        };

        let _ = ui_tx.try_send(UiEvent::Info(format!(
            "Ready - backend {}",
            client.base_url()
        )));
        runtime.block_on(serve_commands(&client, cmd_rx, ui_tx));
        info!("backend worker stopped");
    });
}

/// Executes queued commands one at a time until either queue closes.
///
/// Completions are delivered with a blocking send: every issued operation must report back
/// exactly once or the UI would stay busy.
pub async fn serve_commands<B: QaBackend + ?Sized>(
    backend: &B,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) {
    while let Ok(cmd) = cmd_rx.recv() {
        let event = execute_command(backend, cmd).await;
        if ui_tx.send(event).is_err() {
            warn!("ui event queue closed; dropping backend worker");
            break;
        }
    }
}

pub async fn execute_command<B: QaBackend + ?Sized>(backend: &B, cmd: BackendCommand) -> UiEvent {
    match cmd {
        BackendCommand::Ingest { id, files } => {
            info!(operation_id = %id, files = files.len(), "ingest: starting");
            let uploads = match load_uploads(files).await {
                Ok(uploads) => uploads,
                Err(message) => {
                    warn!(operation_id = %id, "ingest: {message}");
                    return UiEvent::OperationFailed {
                        id,
                        error: UiError::from_message(UiErrorContext::Ingest, message),
                    };
                }
            };
            match backend.ingest(uploads).await {
                Ok(response) => {
                    info!(
                        operation_id = %id,
                        documents = response.ingested.len(),
                        chunks = response.chunks,
                        "ingest: completed"
                    );
                    UiEvent::IngestCompleted { id, response }
                }
                Err(err) => {
                    warn!(operation_id = %id, status = ?err.status(), "ingest: failed: {err}");
                    UiEvent::OperationFailed {
                        id,
                        error: UiError::from_transfer(UiErrorContext::Ingest, &err),
                    }
                }
            }
        }
        BackendCommand::Query { id, request } => {
            info!(operation_id = %id, mode = request.mode.label(), "query: starting");
            match backend.query(&request).await {
                Ok(response) => {
                    if response.answer.is_none() && response.error.is_some() {
                        info!(operation_id = %id, "query: backend declined to answer");
                    }
                    UiEvent::QueryCompleted { id, response }
                }
                Err(err) => {
                    warn!(operation_id = %id, status = ?err.status(), "query: failed: {err}");
                    UiEvent::OperationFailed {
                        id,
                        error: UiError::from_transfer(UiErrorContext::Query, &err),
                    }
                }
            }
        }
    }
}

async fn load_uploads(files: Vec<SelectedFile>) -> Result<Vec<FileUpload>, String> {
    let mut uploads = Vec::with_capacity(files.len());
    for file in files {
        let bytes = match file.source {
            FileSource::Memory(bytes) => bytes.to_vec(),
            FileSource::Path(path) => tokio::fs::read(&path)
                .await
                .map_err(|err| format!("failed to read {}: {err}", path.display()))?,
        };
        uploads.push(FileUpload {
            filename: file.filename,
            media_type: file.media_type,
            bytes,
        });
    }
    Ok(uploads)
}

#[cfg(test)]
#[path = "tests/runtime_tests.rs"]
mod tests;
