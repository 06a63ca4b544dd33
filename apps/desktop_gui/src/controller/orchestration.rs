//! Command orchestration helpers from UI actions to backend command queue.

use crossbeam_channel::{Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;

/// Returns whether the command was queued; callers that flipped on a busy
/// indicator must revert it when this fails, since no backend event will
/// arrive to do so.
pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
    status: &mut String,
) -> bool {
    let cmd_name = match &cmd {
        BackendCommand::UploadFiles { .. } => "upload_files",
        BackendCommand::Reorder { .. } => "reorder",
        BackendCommand::RemoveFile { .. } => "remove_file",
        BackendCommand::Merge { .. } => "merge",
        BackendCommand::DownloadMerged => "download_merged",
        BackendCommand::Clear => "clear",
    };

    match cmd_tx.try_send(cmd) {
        Ok(()) => {
            tracing::debug!(command = cmd_name, "queued ui->backend command");
            true
        }
        Err(TrySendError::Full(_)) => {
            *status = "UI command queue is full; please retry".to_string();
            false
        }
        Err(TrySendError::Disconnected(_)) => {
            *status = "Backend command processor disconnected (possible startup/runtime failure); restart the app"
                .to_string();
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;

    #[test]
    fn reports_a_full_queue_without_panicking() {
        let (cmd_tx, _cmd_rx) = bounded::<BackendCommand>(0);
        let mut status = String::new();
        assert!(!dispatch_backend_command(
            &cmd_tx,
            BackendCommand::Clear,
            &mut status
        ));
        assert_eq!(status, "UI command queue is full; please retry");
    }

    #[test]
    fn reports_a_disconnected_backend() {
        let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(4);
        drop(cmd_rx);
        let mut status = String::new();
        assert!(!dispatch_backend_command(
            &cmd_tx,
            BackendCommand::Clear,
            &mut status
        ));
        assert!(status.contains("disconnected"));
    }
}
