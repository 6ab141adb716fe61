use std::time::Duration;

use arboard::Clipboard;
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::controller::orchestration;
use crate::controller::reducer::{self, accept_dropped_files, apply_event};
use crate::controller::session::{
    FlightState, Notice, NoticeKind, RetrievalConfig, SelectedFile, SessionState,
};
use crate::ui::panels::{self, PanelAction};

#[derive(Debug, Clone)]
pub struct StartupConfig {
    pub api_base: String,
    pub strict_drop_filter: bool,
}

/// Text buffers behind the numeric inputs; the session always holds the parsed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct RetrievalDrafts {
    pub top_k: String,
    pub evidence_threshold: String,
    pub evidence_top_k: String,
    pub temperature: String,
}

impl RetrievalDrafts {
    pub fn from_config(config: &RetrievalConfig) -> Self {
        Self {
            top_k: config.top_k.to_string(),
            evidence_threshold: config.evidence_threshold.to_string(),
            evidence_top_k: config.evidence_top_k.to_string(),
            temperature: config.temperature.to_string(),
        }
    }
}

pub struct RagDesktopApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    pub(super) startup: StartupConfig,
    pub(super) session: SessionState,
    pub(super) drafts: RetrievalDrafts,
    pub(super) status: String,
    pub(super) notice: Option<Notice>,
    pub(super) last_drop_discarded: usize,
}

impl RagDesktopApp {
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        startup: StartupConfig,
    ) -> Self {
        let session = SessionState::default();
        let drafts = RetrievalDrafts::from_config(&session.retrieval);
        Self {
            cmd_tx,
            ui_rx,
            startup,
            session,
            drafts,
            status: "Starting backend worker".to_string(),
            notice: None,
            last_drop_discarded: 0,
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            if let Some(notice) = apply_event(&mut self.session, event, &mut self.status) {
                self.notice = Some(notice);
            }
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        if dropped.is_empty() {
            return;
        }
        let files: Vec<SelectedFile> = dropped
            .into_iter()
            .filter_map(|file| SelectedFile::dropped(&file.name, &file.mime, file.path, file.bytes))
            .collect();
        self.last_drop_discarded =
            accept_dropped_files(&mut self.session, files, self.startup.strict_drop_filter);
        self.status = match self.last_drop_discarded {
            0 => format!("Selected {} file(s)", self.session.selected_files.len()),
            discarded => format!(
                "Selected {} file(s), ignored {discarded} non-PDF",
                self.session.selected_files.len()
            ),
        };
    }

    fn pick_files(&mut self) {
        if let Some(paths) = rfd::FileDialog::new()
            .add_filter("PDF documents", &["pdf"])
            .pick_files()
        {
            self.last_drop_discarded = 0;
            self.session
                .set_selected_files(paths.into_iter().map(SelectedFile::from_path).collect());
        }
    }

    fn try_ingest(&mut self) {
        if let Some(notice) =
            orchestration::submit(&self.cmd_tx, &mut self.session, reducer::begin_ingest)
        {
            self.notice = Some(notice);
        }
    }

    fn try_query(&mut self) {
        if let Some(notice) =
            orchestration::submit(&self.cmd_tx, &mut self.session, reducer::begin_query)
        {
            self.notice = Some(notice);
        }
    }

    fn copy_answer(&mut self) {
        let Some(result) = &self.session.last_result else {
            return;
        };
        match Clipboard::new().and_then(|mut clipboard| clipboard.set_text(result.answer.clone())) {
            Ok(()) => self.status = "Answer copied to clipboard".to_string(),
            Err(err) => self.status = format!("Clipboard unavailable: {err}"),
        }
    }

    fn handle_action(&mut self, action: PanelAction) {
        match action {
            PanelAction::PickFiles => self.pick_files(),
            PanelAction::ClearFiles => {
                self.last_drop_discarded = 0;
                self.session.set_selected_files(Vec::new());
            }
            PanelAction::Ingest => self.try_ingest(),
            PanelAction::Ask => self.try_query(),
            PanelAction::CopyAnswer => self.copy_answer(),
        }
    }

    fn status_line(&self) -> String {
        match self.session.flight {
            FlightState::Idle => self.status.clone(),
            FlightState::IngestInFlight { files, .. } => {
                format!("Ingesting {files} file(s)...")
            }
            FlightState::QueryInFlight { .. } => "Waiting for answer...".to_string(),
        }
    }

    fn show_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if self.session.is_busy() {
                    ui.spinner();
                }
                ui.label(self.status_line());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.small(egui::RichText::new(&self.startup.api_base).weak());
                });
            });
        });
    }

    fn show_notice(&mut self, ctx: &egui::Context) {
        let Some(notice) = self.notice.clone() else {
            return;
        };
        let mut dismissed = false;
        egui::Window::new(notice.title.as_str())
            .id(egui::Id::new("notice_window"))
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                let color = match notice.kind {
                    NoticeKind::Confirmation => ui.visuals().text_color(),
                    NoticeKind::Failure => ui.visuals().error_fg_color,
                };
                ui.add(egui::Label::new(egui::RichText::new(&notice.message).color(color)).selectable(true));
                ui.add_space(8.0);
                if ui.button("OK").clicked() || ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    dismissed = true;
                }
            });
        if dismissed {
            self.notice = None;
        }
    }
}

impl eframe::App for RagDesktopApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();
        // Drops are delivered for one frame only, so take them even behind a notice.
        self.handle_dropped_files(ctx);

        self.show_status_bar(ctx);

        let mut actions = Vec::new();
        let drop_hover = ctx.input(|i| !i.raw.hovered_files.is_empty());
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_enabled_ui(self.notice.is_none(), |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    ui.heading("RAG Desktop");
                    ui.label(
                        egui::RichText::new(
                            "Upload PDFs and ask questions. Tune retrieval below.",
                        )
                        .weak(),
                    );
                    ui.add_space(12.0);
                    panels::show_upload_section(self, ui, drop_hover, &mut actions);
                    ui.add_space(12.0);
                    panels::show_ask_section(self, ui, &mut actions);
                    ui.add_space(12.0);
                    panels::show_result_section(self, ui, &mut actions);
                });
            });
        });

        for action in actions {
            self.handle_action(action);
        }
        self.show_notice(ctx);

        if self.session.is_busy() {
            ctx.request_repaint_after(Duration::from_millis(50));
        } else {
            ctx.request_repaint_after(Duration::from_millis(250));
        }
    }
}
