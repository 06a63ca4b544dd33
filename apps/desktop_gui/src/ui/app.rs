use std::path::PathBuf;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use eframe::egui;

use client_core::{MergeOutcome, WorkflowStage};
use shared::domain::{TempName, MIN_MERGE_FILES};
use shared::protocol::FileDescriptor;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::controller::orchestration::dispatch_backend_command;
use crate::controller::reducer::{BusyKind, ViewState};

pub struct MergeDeskApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    view: ViewState,
}

impl MergeDeskApp {
    pub fn new(cmd_tx: Sender<BackendCommand>, ui_rx: Receiver<UiEvent>) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            view: ViewState::new(),
        }
    }

    fn process_ui_events(&mut self) {
        let now = Instant::now();
        while let Ok(event) = self.ui_rx.try_recv() {
            self.view.apply_event(event, now);
        }
        self.view.prune_notice(now);
    }

    fn dispatch(&mut self, cmd: BackendCommand) {
        if !dispatch_backend_command(&self.cmd_tx, cmd, &mut self.view.status) {
            // nothing was queued, so no event will clear the overlay
            self.view.busy = None;
        }
    }

    fn submit_paths(&mut self, paths: Vec<PathBuf>) {
        if paths.is_empty() {
            return;
        }
        self.view.begin(BusyKind::Uploading);
        self.dispatch(BackendCommand::UploadFiles { paths });
    }

    fn pick_files(&mut self) {
        let Some(paths) = rfd::FileDialog::new()
            .add_filter("PDF documents", &["pdf"])
            .pick_files()
        else {
            return;
        };
        self.submit_paths(paths);
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        if self.view.busy.is_some() {
            return;
        }
        let dropped: Vec<PathBuf> = ctx.input(|input| {
            input
                .raw
                .dropped_files
                .iter()
                .filter_map(|file| file.path.clone())
                .collect()
        });
        if !dropped.is_empty() {
            self.submit_paths(dropped);
        }
    }

    fn upload_panel(&mut self, ui: &mut egui::Ui) {
        let hovering_files = ui.ctx().input(|input| !input.raw.hovered_files.is_empty());
        egui::Frame::group(ui.style())
            .inner_margin(egui::Margin::same(24))
            .show(ui, |ui| {
                ui.vertical_centered(|ui| {
                    if hovering_files {
                        ui.label("Release to upload");
                    } else {
                        ui.label("Drop PDF files here");
                        ui.label(format!(
                            "or select at least {MIN_MERGE_FILES} PDFs to merge (20MB each at most)"
                        ));
                    }
                    ui.add_space(8.0);
                    if ui.button("Select PDF files").clicked() {
                        self.pick_files();
                    }
                });
            });
    }

    /// One row per uploaded file, in display order. Rows drag onto each other
    /// to reorder; the full row order goes to the backend on every drop so
    /// the canonical list always matches what the user sees.
    fn file_list_panel(&mut self, ui: &mut egui::Ui) {
        let files = self.view.snapshot.files.clone();
        ui.label(format!("{} files selected", files.len()));
        ui.add_space(4.0);

        let mut moved: Option<(usize, usize)> = None;
        let mut removed: Option<TempName> = None;
        for (index, descriptor) in files.iter().enumerate() {
            let row_id = egui::Id::new(("file_row", descriptor.temp_name.as_str()));
            let frame = egui::Frame::group(ui.style());
            let (_, payload) = ui.dnd_drop_zone::<usize, ()>(frame, |ui| {
                ui.horizontal(|ui| {
                    ui.dnd_drag_source(row_id, index, |ui| {
                        ui.label(egui::RichText::new("::").strong());
                    });
                    ui.label(format!("{}.", index + 1));
                    ui.label("📄");
                    ui.label(&descriptor.original_name);
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.small_button("✕").clicked() {
                            removed = Some(descriptor.temp_name.clone());
                        }
                    });
                });
            });
            if let Some(from) = payload {
                if *from != index {
                    moved = Some((*from, index));
                }
            }
        }

        if let Some((from, to)) = moved {
            if let Some(order) = moved_order(&files, from, to) {
                self.dispatch(BackendCommand::Reorder { order });
            }
        }
        if let Some(temp_name) = removed {
            self.dispatch(BackendCommand::RemoveFile { temp_name });
        }
    }

    fn actions_panel(&mut self, ui: &mut egui::Ui) {
        let can_merge = self.view.snapshot.files.len() >= MIN_MERGE_FILES;
        ui.horizontal(|ui| {
            if ui
                .add_enabled(can_merge, egui::Button::new("Merge PDFs"))
                .clicked()
            {
                self.view.begin(BusyKind::Merging);
                self.dispatch(BackendCommand::Merge { compress: false });
            }
            if ui
                .add_enabled(can_merge, egui::Button::new("Merge & compress"))
                .clicked()
            {
                self.view.begin(BusyKind::MergingCompressed);
                self.dispatch(BackendCommand::Merge { compress: true });
            }
            if ui.button("Clear all").clicked() {
                self.dispatch(BackendCommand::Clear);
            }
        });
    }

    fn ready_panel(&mut self, ui: &mut egui::Ui, outcome: &MergeOutcome) {
        ui.heading("Merge complete");
        if let Some(size) = outcome.file_size {
            ui.label(format!("File size: {}", human_readable_bytes(size)));
        }
        if let Some(pages) = outcome.page_count {
            ui.label(format!("Pages: {pages}"));
        }
        if outcome.compressed {
            ui.label("Compression applied");
        }
        ui.add_space(8.0);
        ui.horizontal(|ui| {
            if ui.button("Download merged PDF").clicked() {
                self.dispatch(BackendCommand::DownloadMerged);
            }
            if ui.button("Start new merge").clicked() {
                self.dispatch(BackendCommand::Clear);
            }
        });
    }

    fn busy_overlay(&self, ctx: &egui::Context) {
        let Some(busy) = self.view.busy else {
            return;
        };
        let screen = ctx.screen_rect();
        egui::Area::new(egui::Id::new("busy_overlay"))
            .order(egui::Order::Foreground)
            .fixed_pos(screen.min)
            .show(ctx, |ui| {
                ui.painter().rect_filled(
                    screen,
                    egui::CornerRadius::ZERO,
                    egui::Color32::from_black_alpha(160),
                );
                // swallow pointer input while a request is in flight
                ui.allocate_rect(screen, egui::Sense::click());
            });
        egui::Area::new(egui::Id::new("busy_overlay_content"))
            .order(egui::Order::Foreground)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.add(egui::Spinner::new().size(40.0));
                    ui.add_space(12.0);
                    ui.label(
                        egui::RichText::new(busy.title())
                            .size(18.0)
                            .color(egui::Color32::WHITE),
                    );
                });
            });
    }

    fn notice_toast(&self, ctx: &egui::Context) {
        let Some(notice) = &self.view.notice else {
            return;
        };
        egui::Area::new(egui::Id::new("error_toast"))
            .order(egui::Order::Foreground)
            .anchor(egui::Align2::RIGHT_TOP, egui::vec2(-16.0, 16.0))
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style())
                    .fill(egui::Color32::from_rgb(0xb3, 0x26, 0x1e))
                    .show(ui, |ui| {
                        ui.set_max_width(360.0);
                        ui.label(egui::RichText::new(&notice.message).color(egui::Color32::WHITE));
                    });
            });
    }
}

impl eframe::App for MergeDeskApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();
        self.handle_dropped_files(ctx);

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.label(&self.view.status);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let busy = self.view.busy.is_some();
            ui.add_enabled_ui(!busy, |ui| {
                ui.heading("PDF Merger");
                ui.add_space(8.0);
                self.upload_panel(ui);
                ui.add_space(12.0);

                match self.view.snapshot.stage() {
                    WorkflowStage::Empty => {}
                    WorkflowStage::FilesReady => {
                        self.file_list_panel(ui);
                        ui.add_space(8.0);
                        self.actions_panel(ui);
                    }
                    // The file list stays hidden behind the result; the only
                    // ways out are Download, Start new merge, or a fresh
                    // upload.
                    WorkflowStage::MergeReady => {
                        if let Some(outcome) = self.view.snapshot.merge.clone() {
                            self.ready_panel(ui, &outcome);
                        }
                    }
                }
            });
        });

        self.busy_overlay(ctx);
        self.notice_toast(ctx);

        if self.view.busy.is_some() || self.view.notice.is_some() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}

/// New display order after dragging row `from` onto row `to`. Returns `None`
/// when the drag payload refers to a row that no longer exists.
fn moved_order(files: &[FileDescriptor], from: usize, to: usize) -> Option<Vec<TempName>> {
    if from >= files.len() || to >= files.len() {
        return None;
    }
    let mut order: Vec<TempName> = files
        .iter()
        .map(|descriptor| descriptor.temp_name.clone())
        .collect();
    let handle = order.remove(from);
    order.insert(to, handle);
    Some(order)
}

fn human_readable_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes < KB {
        return format!("{bytes} B");
    }
    if bytes < MB {
        return format_scaled_unit(bytes, KB, "KB");
    }
    if bytes < GB {
        return format_scaled_unit(bytes, MB, "MB");
    }
    format_scaled_unit(bytes, GB, "GB")
}

fn format_scaled_unit(bytes: u64, unit_size: u64, unit_label: &str) -> String {
    let value = bytes as f64 / unit_size as f64;
    format!("{value:.2} {unit_label}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(temp_name: &str, original_name: &str) -> FileDescriptor {
        FileDescriptor {
            temp_name: temp_name.into(),
            original_name: original_name.to_string(),
        }
    }

    #[test]
    fn formats_merged_document_sizes_with_two_decimals() {
        assert_eq!(human_readable_bytes(0), "0 B");
        assert_eq!(human_readable_bytes(1023), "1023 B");
        assert_eq!(human_readable_bytes(1024), "1.00 KB");
        assert_eq!(human_readable_bytes(1536), "1.50 KB");
        assert_eq!(human_readable_bytes(2 * 1024 * 1024), "2.00 MB");
        assert_eq!(human_readable_bytes(3 * 1024 * 1024 * 1024), "3.00 GB");
    }

    #[test]
    fn dragging_a_row_down_shifts_the_rows_between() {
        let files = vec![
            descriptor("a", "a.pdf"),
            descriptor("b", "b.pdf"),
            descriptor("c", "c.pdf"),
        ];
        let order = moved_order(&files, 0, 2).expect("order");
        assert_eq!(
            order,
            vec![TempName::from("b"), TempName::from("c"), TempName::from("a")]
        );
    }

    #[test]
    fn dragging_a_row_up_shifts_the_rows_between() {
        let files = vec![
            descriptor("a", "a.pdf"),
            descriptor("b", "b.pdf"),
            descriptor("c", "c.pdf"),
        ];
        let order = moved_order(&files, 2, 0).expect("order");
        assert_eq!(
            order,
            vec![TempName::from("c"), TempName::from("a"), TempName::from("b")]
        );
    }

    #[test]
    fn stale_drag_payloads_are_ignored() {
        let files = vec![descriptor("a", "a.pdf"), descriptor("b", "b.pdf")];
        assert!(moved_order(&files, 5, 0).is_none());
    }

    #[test]
    fn failed_dispatch_takes_the_busy_overlay_down_again() {
        let (cmd_tx, cmd_rx) = crossbeam_channel::bounded(0);
        let (_ui_tx, ui_rx) = crossbeam_channel::bounded(8);
        let mut app = MergeDeskApp::new(cmd_tx, ui_rx);

        // full queue
        app.submit_paths(vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")]);
        assert!(app.view.busy.is_none());

        // disconnected backend
        drop(cmd_rx);
        app.submit_paths(vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")]);
        assert!(app.view.busy.is_none());
    }
}
