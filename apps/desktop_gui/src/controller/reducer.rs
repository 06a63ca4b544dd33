//! Pure view-state transitions. The UI renders exclusively from `ViewState`;
//! backend events flow in through `apply_event` and nothing else mutates the
//! workflow snapshot.

use std::time::{Duration, Instant};

use client_core::WorkflowSnapshot;

use crate::controller::events::UiEvent;

pub const NOTICE_DISPLAY_TIME: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusyKind {
    Uploading,
    Merging,
    MergingCompressed,
}

impl BusyKind {
    pub fn title(self) -> &'static str {
        match self {
            BusyKind::Uploading => "Uploading files...",
            BusyKind::Merging => "Merging PDFs...",
            BusyKind::MergingCompressed => "Merging & compressing PDFs...",
        }
    }
}

/// A transient error toast. Dismissed by `prune_notice` once it has been on
/// screen for `NOTICE_DISPLAY_TIME`.
#[derive(Debug, Clone)]
pub struct Notice {
    pub message: String,
    pub shown_at: Instant,
}

#[derive(Debug, Clone)]
pub struct ViewState {
    pub snapshot: WorkflowSnapshot,
    pub busy: Option<BusyKind>,
    pub notice: Option<Notice>,
    pub status: String,
}

impl ViewState {
    pub fn new() -> Self {
        Self {
            snapshot: WorkflowSnapshot::empty(),
            busy: None,
            notice: None,
            status: "Starting backend worker...".to_string(),
        }
    }

    /// Called by the UI right after queueing a long-running command. The
    /// matching `StateChanged` or `Error` event clears it again.
    pub fn begin(&mut self, kind: BusyKind) {
        self.busy = Some(kind);
    }

    pub fn apply_event(&mut self, event: UiEvent, now: Instant) {
        match event {
            UiEvent::StateChanged(snapshot) => {
                self.busy = None;
                self.snapshot = snapshot;
            }
            UiEvent::Info(message) => {
                self.status = message;
            }
            UiEvent::Error(err) => {
                self.busy = None;
                self.notice = Some(Notice {
                    message: err.message().to_string(),
                    shown_at: now,
                });
            }
        }
    }

    pub fn prune_notice(&mut self, now: Instant) {
        if let Some(notice) = &self.notice {
            if now.duration_since(notice.shown_at) >= NOTICE_DISPLAY_TIME {
                self.notice = None;
            }
        }
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::events::{UiError, UiErrorContext};
    use client_core::{MergeOutcome, WorkflowStage};
    use shared::protocol::FileDescriptor;

    fn descriptor(temp_name: &str, original_name: &str) -> FileDescriptor {
        FileDescriptor {
            temp_name: temp_name.into(),
            original_name: original_name.to_string(),
        }
    }

    #[test]
    fn state_change_replaces_the_snapshot_and_clears_busy() {
        let mut view = ViewState::new();
        view.begin(BusyKind::Uploading);

        let snapshot = WorkflowSnapshot {
            files: vec![descriptor("t1", "a.pdf"), descriptor("t2", "b.pdf")],
            merge: None,
        };
        view.apply_event(UiEvent::StateChanged(snapshot.clone()), Instant::now());

        assert!(view.busy.is_none());
        assert_eq!(view.snapshot, snapshot);
        assert_eq!(view.snapshot.stage(), WorkflowStage::FilesReady);
    }

    #[test]
    fn errors_clear_busy_and_raise_a_notice() {
        let mut view = ViewState::new();
        view.begin(BusyKind::Merging);

        view.apply_event(
            UiEvent::Error(UiError::from_message(
                UiErrorContext::Merge,
                "Merge failed: corrupt page tree",
            )),
            Instant::now(),
        );

        assert!(view.busy.is_none());
        let notice = view.notice.as_ref().expect("notice");
        assert_eq!(notice.message, "Merge failed: corrupt page tree");
    }

    #[test]
    fn notices_survive_until_the_display_window_elapses() {
        let mut view = ViewState::new();
        let shown_at = Instant::now();
        view.apply_event(
            UiEvent::Error(UiError::from_message(UiErrorContext::Upload, "boom")),
            shown_at,
        );

        view.prune_notice(shown_at + NOTICE_DISPLAY_TIME - Duration::from_millis(1));
        assert!(view.notice.is_some());

        view.prune_notice(shown_at + NOTICE_DISPLAY_TIME);
        assert!(view.notice.is_none());
    }

    #[test]
    fn info_updates_status_without_touching_busy_or_snapshot() {
        let mut view = ViewState::new();
        view.begin(BusyKind::MergingCompressed);

        view.apply_event(
            UiEvent::Info("Backend worker ready".to_string()),
            Instant::now(),
        );

        assert_eq!(view.busy, Some(BusyKind::MergingCompressed));
        assert_eq!(view.status, "Backend worker ready");
    }

    #[test]
    fn merge_outcome_in_the_snapshot_moves_the_view_to_merge_ready() {
        let mut view = ViewState::new();
        let snapshot = WorkflowSnapshot {
            files: vec![descriptor("t1", "a.pdf"), descriptor("t2", "b.pdf")],
            merge: Some(MergeOutcome {
                merged_file: "merged_out.pdf".into(),
                file_size: Some(2 * 1024 * 1024),
                page_count: Some(12),
                compressed: true,
            }),
        };
        view.apply_event(UiEvent::StateChanged(snapshot), Instant::now());

        assert_eq!(view.snapshot.stage(), WorkflowStage::MergeReady);
    }
}
