use std::path::PathBuf;

use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use review_client::{
    ClientError, ConsoleSettings, ListController, LoadOutcome, LoadTicket, PendingWrite,
    PlayerEvent, WidgetBoard,
};
use serde::{Deserialize, Serialize};
use shared::domain::RecordId;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::{
    events::{err_label, UiError, UiErrorContext, UiEvent},
    orchestration::dispatch_backend_command,
};
use crate::media::WorkerAudioBackend;
use crate::ui::record_card::{show_record_card, CardAction};

pub const SETTINGS_STORAGE_KEY: &str = "review_gui.settings";
const DEFAULT_EXPORT_FILE_NAME: &str = "records.csv";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedConsoleSettings {
    pub export_dir: Option<PathBuf>,
    pub volume: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusBannerSeverity {
    Error,
}

#[derive(Debug, Clone)]
struct StatusBanner {
    severity: StatusBannerSeverity,
    message: String,
}

pub struct ReviewConsoleApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    audio: WorkerAudioBackend,
    backend_url: String,
    list: ListController,
    board: WidgetBoard,
    status: String,
    status_banner: Option<StatusBanner>,
    export_dir: Option<PathBuf>,
    export_in_flight: bool,
    volume: f32,
}

impl ReviewConsoleApp {
    pub fn new(
        settings: &ConsoleSettings,
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        audio: WorkerAudioBackend,
        persisted_settings: Option<PersistedConsoleSettings>,
    ) -> Self {
        let persisted = persisted_settings.unwrap_or_default();
        let volume = persisted
            .volume
            .filter(|v| v.is_finite())
            .map(|v| v.clamp(0.0, 1.0))
            .unwrap_or(settings.volume);
        if persisted.volume.is_some() {
            audio.set_volume(volume);
        }

        let mut app = Self {
            cmd_tx,
            ui_rx,
            audio,
            backend_url: settings.backend_url.clone(),
            list: ListController::new(settings.page_size),
            board: WidgetBoard::new(),
            status: "Loading records".to_string(),
            status_banner: None,
            export_dir: persisted.export_dir.or_else(default_export_dir),
            export_in_flight: false,
            volume,
        };
        let ticket = app.list.begin_load(1);
        app.dispatch_load(ticket);
        app
    }

    fn dispatch_load(&mut self, ticket: LoadTicket) {
        if !dispatch_backend_command(
            &self.cmd_tx,
            BackendCommand::LoadPage { ticket },
            &mut self.status,
        ) {
            let err = ClientError::Unavailable(self.status.clone());
            self.list.finish_load(ticket, Err(err));
        }
    }

    fn dispatch_write(&mut self, write: PendingWrite) {
        if !dispatch_backend_command(
            &self.cmd_tx,
            BackendCommand::Write {
                write: write.clone(),
            },
            &mut self.status,
        ) {
            let err = ClientError::Unavailable(self.status.clone());
            self.list.finish_write(write, &Err(err));
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => {
                    self.status = message;
                }
                UiEvent::Error(err) => self.show_error(err),
                UiEvent::PageLoaded { ticket, result } => {
                    match self.list.finish_load(ticket, result) {
                        LoadOutcome::Applied => {
                            self.board.reconcile(self.list.page());
                            self.status = format!(
                                "Page {} of {} ({} records)",
                                self.list.current_page(),
                                self.list.total_pages(),
                                self.list.page().total_records
                            );
                        }
                        LoadOutcome::Failed => {
                            self.status = format!("Failed to load page {}", ticket.query.page);
                        }
                        LoadOutcome::Stale => {}
                    }
                }
                UiEvent::WriteFinished { write, result } => {
                    let label = write.label();
                    let id = write.id();
                    if let Err(err) = &result {
                        self.status = format!("Record {id}: {label} failed: {err}");
                    }
                    if let Some(ticket) = self.list.finish_write(write, &result) {
                        self.status = format!("Record {id}: {label} done; refreshing");
                        self.dispatch_load(ticket);
                    }
                }
                UiEvent::ExportFinished { dest, result } => {
                    self.export_in_flight = false;
                    match result {
                        Ok(bytes) => {
                            self.status =
                                format!("Exported {bytes} bytes to {}", dest.display());
                        }
                        Err(err) => {
                            self.show_error(UiError::from_client_error(UiErrorContext::Export, &err))
                        }
                    }
                }
                UiEvent::Player { id, event } => self.on_player_event(id, event),
            }
        }
    }

    fn on_player_event(&mut self, id: RecordId, event: PlayerEvent) {
        if let PlayerEvent::Failed(reason) = &event {
            self.show_error(UiError::from_message(
                UiErrorContext::Playback,
                format!("record {id}: audio {reason}"),
            ));
        }
        if !self.board.dispatch_player_event(id, event) {
            tracing::debug!(record_id = id.0, "player event for unlisted record dropped");
        }
    }

    fn show_error(&mut self, err: UiError) {
        tracing::warn!(context = ?err.context(), category = ?err.category(), "{}", err.message());
        self.status = format!("{} error: {}", err_label(err.category()), err.message());
        if err.wants_banner() {
            self.status_banner = Some(StatusBanner {
                severity: StatusBannerSeverity::Error,
                message: self.status.clone(),
            });
        }
    }

    fn apply_card_action(&mut self, id: RecordId, action: CardAction) {
        let Some(widget) = self.board.get_mut(id) else {
            return;
        };
        match action {
            CardAction::Edit => {
                widget.begin_edit();
            }
            CardAction::Save => {
                if let Some(request) = widget.save() {
                    let write = self.list.begin_write(request);
                    self.dispatch_write(write);
                }
            }
            CardAction::Delete => {
                let request = widget.delete();
                let write = self.list.begin_write(request);
                self.dispatch_write(write);
            }
            CardAction::TogglePlayback => widget.toggle_playback(&self.audio),
            CardAction::Retry => {
                if let Some(write) = self.list.retry(id) {
                    self.dispatch_write(write);
                }
            }
            CardAction::Dismiss => self.list.dismiss(id),
        }
    }

    fn start_export(&mut self) {
        let mut dialog = rfd::FileDialog::new()
            .set_title("Export records as CSV")
            .set_file_name(DEFAULT_EXPORT_FILE_NAME)
            .add_filter("CSV", &["csv"]);
        if let Some(dir) = &self.export_dir {
            dialog = dialog.set_directory(dir);
        }
        let Some(dest) = dialog.save_file() else {
            return;
        };

        self.export_dir = dest.parent().map(PathBuf::from);
        if dispatch_backend_command(
            &self.cmd_tx,
            BackendCommand::ExportCsv { dest: dest.clone() },
            &mut self.status,
        ) {
            self.export_in_flight = true;
            self.status = format!("Exporting to {}", dest.display());
        }
    }

    fn show_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Transcript Review");
                ui.weak(self.backend_url.as_str());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let export = ui.add_enabled(
                        !self.export_in_flight,
                        egui::Button::new("⬇ Export CSV"),
                    );
                    if export.clicked() {
                        self.start_export();
                    }
                    if ui
                        .add(egui::Slider::new(&mut self.volume, 0.0..=1.0).text("Volume"))
                        .changed()
                    {
                        self.audio.set_volume(self.volume);
                    }
                });
            });
        });
    }

    fn show_pagination(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("pagination").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui
                    .add_enabled(self.list.can_go_prev(), egui::Button::new("◀ Prev"))
                    .clicked()
                {
                    if let Some(ticket) = self.list.prev_page() {
                        self.dispatch_load(ticket);
                    }
                }
                ui.label(format!(
                    "Page {} / {}",
                    self.list.current_page(),
                    self.list.total_pages()
                ));
                if ui
                    .add_enabled(self.list.can_go_next(), egui::Button::new("Next ▶"))
                    .clicked()
                {
                    if let Some(ticket) = self.list.next_page() {
                        self.dispatch_load(ticket);
                    }
                }
                if ui.button("⟳").on_hover_text("Reload page").clicked() {
                    let ticket = self.list.reload();
                    self.dispatch_load(ticket);
                }
                if self.list.is_loading() {
                    ui.spinner();
                }
                ui.separator();
                ui.label(self.status.as_str());
            });
        });
    }

    fn show_status_banner(&mut self, ui: &mut egui::Ui) {
        if let Some(banner) = self.status_banner.clone() {
            let (fill, stroke) = match banner.severity {
                StatusBannerSeverity::Error => (
                    egui::Color32::from_rgb(111, 53, 53),
                    egui::Stroke::new(1.0, egui::Color32::from_rgb(175, 96, 96)),
                ),
            };

            egui::Frame::NONE
                .fill(fill)
                .stroke(stroke)
                .corner_radius(8.0)
                .inner_margin(egui::Margin::symmetric(10, 8))
                .show(ui, |ui| {
                    ui.horizontal(|ui| {
                        ui.colored_label(egui::Color32::WHITE, banner.message.as_str());
                        if ui.small_button("Dismiss").clicked() {
                            self.status_banner = None;
                        }
                    });
                });
            ui.add_space(6.0);
        }
    }

    fn show_records(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            self.show_status_banner(ui);

            if self.board.is_empty() {
                ui.centered_and_justified(|ui| {
                    ui.weak(if self.list.is_loading() {
                        "Loading…"
                    } else {
                        "No records on this page"
                    });
                });
                return;
            }

            let mut actions = Vec::new();
            egui::ScrollArea::vertical().show(ui, |ui| {
                for id in self.board.ids().to_vec() {
                    let status = self.list.write_status(id);
                    if let Some(widget) = self.board.get_mut(id) {
                        if let Some(action) = show_record_card(ui, widget, status) {
                            actions.push((id, action));
                        }
                    }
                    ui.add_space(4.0);
                }
            });
            for (id, action) in actions {
                self.apply_card_action(id, action);
            }
        });
    }

    fn any_playback_active(&self) -> bool {
        self.board
            .iter()
            .any(|widget| widget.playback().is_requested_on())
    }
}

fn default_export_dir() -> Option<PathBuf> {
    dirs::download_dir().or_else(dirs::home_dir)
}

impl eframe::App for ReviewConsoleApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();

        self.show_top_bar(ctx);
        self.show_pagination(ctx);
        self.show_records(ctx);

        if self.list.is_loading() || self.export_in_flight || self.any_playback_active() {
            ctx.request_repaint_after(std::time::Duration::from_millis(33));
        } else {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        let settings = PersistedConsoleSettings {
            export_dir: self.export_dir.clone(),
            volume: Some(self.volume),
        };
        if let Ok(serialized) = serde_json::to_string(&settings) {
            storage.set_string(SETTINGS_STORAGE_KEY, serialized);
        }
    }
}
