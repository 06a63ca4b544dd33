//! Backend worker: owns the tokio runtime and the workflow client, drains the
//! UI command queue sequentially, and forwards workflow snapshots back to the
//! UI thread.

use std::path::PathBuf;
use std::thread;

use client_core::{CandidateFile, MergeClient, WorkflowEvent};
use crossbeam_channel::{Receiver, Sender};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

pub fn spawn_backend_thread(
    server_url: String,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) {
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

        runtime.block_on(async move {
            let client = match MergeClient::new(&server_url) {
                Ok(client) => client,
                Err(err) => {
                    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_workflow(
                        UiErrorContext::BackendStartup,
                        &err,
                    )));
                    tracing::error!("rejected server url '{server_url}': {err}");
                    return;
                }
            };

            // Snapshots reach the UI through this one path only, so every
            // mutation renders the same way regardless of which command
            // caused it.
            let mut workflow_events = client.subscribe_events();
            let event_tx = ui_tx.clone();
            tokio::spawn(async move {
                while let Ok(event) = workflow_events.recv().await {
                    let WorkflowEvent::StateChanged(snapshot) = event;
                    if event_tx.try_send(UiEvent::StateChanged(snapshot)).is_err() {
                        break;
                    }
                }
            });

            let _ = ui_tx.try_send(UiEvent::Info("Backend worker ready".to_string()));

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    BackendCommand::UploadFiles { paths } => {
                        let candidates = match read_candidates(paths).await {
                            Ok(candidates) => candidates,
                            Err(message) => {
                                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                                    UiErrorContext::Upload,
                                    message,
                                )));
                                continue;
                            }
                        };
                        if let Err(err) = client.upload(candidates).await {
                            let _ = ui_tx.try_send(UiEvent::Error(UiError::from_workflow(
                                UiErrorContext::Upload,
                                &err,
                            )));
                        }
                    }
                    BackendCommand::Reorder { order } => {
                        client.reorder(&order).await;
                    }
                    BackendCommand::RemoveFile { temp_name } => {
                        client.remove(&temp_name).await;
                    }
                    BackendCommand::Merge { compress } => {
                        if let Err(err) = client.merge(compress).await {
                            let _ = ui_tx.try_send(UiEvent::Error(UiError::from_workflow(
                                UiErrorContext::Merge,
                                &err,
                            )));
                        }
                    }
                    BackendCommand::DownloadMerged => {
                        match client.download_merged().await {
                            Ok(bytes) => {
                                let _ = ui_tx.try_send(save_merged_document(bytes).await);
                            }
                            Err(err) => {
                                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_workflow(
                                    UiErrorContext::Download,
                                    &err,
                                )));
                            }
                        }
                    }
                    BackendCommand::Clear => {
                        client.clear().await;
                    }
                }
            }
        });
    });
}

async fn read_candidates(paths: Vec<PathBuf>) -> Result<Vec<CandidateFile>, String> {
    let mut candidates = Vec::with_capacity(paths.len());
    for path in paths {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let media_type = mime_guess::from_path(&path)
            .first_raw()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|err| format!("could not read {file_name}: {err}"))?;
        candidates.push(CandidateFile {
            file_name,
            media_type,
            bytes,
        });
    }
    Ok(candidates)
}

/// Ask where to save and write the bytes. A cancelled dialog is not an error.
async fn save_merged_document(bytes: Vec<u8>) -> UiEvent {
    let Some(target) = rfd::FileDialog::new()
        .set_file_name("merged_document.pdf")
        .save_file()
    else {
        return UiEvent::Info("Download cancelled".to_string());
    };
    match tokio::fs::write(&target, &bytes).await {
        Ok(()) => UiEvent::Info(format!("Saved merged document to {}", target.display())),
        Err(err) => UiEvent::Error(UiError::from_message(
            UiErrorContext::Download,
            format!("could not save {}: {err}", target.display()),
        )),
    }
}
