//! Upload, ask and result sections of the main window.

use eframe::egui;
use serde_json::{Map, Value};
use shared::{domain::QueryMode, protocol::Citation};

use crate::ui::app::RagDesktopApp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    PickFiles,
    ClearFiles,
    Ingest,
    Ask,
    CopyAnswer,
}

fn section_frame(ui: &mut egui::Ui, title: &str, add: impl FnOnce(&mut egui::Ui)) {
    egui::Frame::group(ui.style())
        .inner_margin(egui::Margin::same(12))
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.label(egui::RichText::new(title).strong().size(16.0));
            ui.add_space(6.0);
            add(ui);
        });
}

pub fn show_upload_section(
    app: &mut RagDesktopApp,
    ui: &mut egui::Ui,
    drop_hover: bool,
    actions: &mut Vec<PanelAction>,
) {
    section_frame(ui, "Upload PDFs", |ui| {
        let stroke = if drop_hover {
            ui.visuals().selection.stroke
        } else {
            ui.visuals().widgets.noninteractive.bg_stroke
        };
        egui::Frame::new()
            .stroke(stroke)
            .corner_radius(8.0)
            .inner_margin(egui::Margin::same(20))
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.vertical_centered(|ui| {
                    let hint = if app.startup.strict_drop_filter {
                        "Drag & drop PDF files here"
                    } else {
                        "Drag & drop files here"
                    };
                    ui.label(egui::RichText::new(hint).weak());
                });
            });

        if app.last_drop_discarded > 0 {
            ui.small(
                egui::RichText::new(format!(
                    "Ignored {} non-PDF file(s) from the drop",
                    app.last_drop_discarded
                ))
                .color(ui.visuals().warn_fg_color),
            );
        }

        ui.add_space(6.0);
        ui.horizontal(|ui| {
            if ui.button("Choose files...").clicked() {
                actions.push(PanelAction::PickFiles);
            }
            if ui
                .add_enabled(
                    !app.session.selected_files.is_empty(),
                    egui::Button::new("Clear"),
                )
                .clicked()
            {
                actions.push(PanelAction::ClearFiles);
            }
            if ui
                .add_enabled(app.session.can_ingest(), egui::Button::new("Ingest"))
                .clicked()
            {
                actions.push(PanelAction::Ingest);
            }
        });

        if app.session.selected_files.is_empty() {
            ui.small(egui::RichText::new("No files selected").weak());
        } else {
            for file in &app.session.selected_files {
                ui.small(format!("{} ({})", file.filename, file.media_type));
            }
        }
    });
}

fn numeric_field(ui: &mut egui::Ui, label: &str, draft: &mut String) -> egui::Response {
    ui.vertical(|ui| {
        ui.label(egui::RichText::new(label).small().strong());
        ui.add(egui::TextEdit::singleline(draft).desired_width(110.0))
    })
    .inner
}

pub fn show_ask_section(app: &mut RagDesktopApp, ui: &mut egui::Ui, actions: &mut Vec<PanelAction>) {
    section_frame(ui, "Ask", |ui| {
        ui.horizontal(|ui| {
            let mut mode = app.session.retrieval.mode;
            let send_width = 80.0;
            let query_response = ui.add(
                egui::TextEdit::singleline(&mut app.session.query_text)
                    .hint_text("Ask a question")
                    .desired_width((ui.available_width() - send_width - 110.0).max(120.0)),
            );
            egui::ComboBox::from_id_salt("query_mode")
                .selected_text(mode.label())
                .width(90.0)
                .show_ui(ui, |ui| {
                    for candidate in QueryMode::ALL {
                        ui.selectable_value(&mut mode, candidate, candidate.label());
                    }
                });
            if mode != app.session.retrieval.mode {
                app.session.set_mode(mode);
            }

            let submitted_with_enter = query_response.lost_focus()
                && ui.input(|i| i.key_pressed(egui::Key::Enter));
            let send_clicked = ui
                .add_enabled(!app.session.is_busy(), egui::Button::new("Send"))
                .clicked();
            if send_clicked || submitted_with_enter {
                actions.push(PanelAction::Ask);
            }
        });

        ui.add_space(8.0);
        ui.horizontal_wrapped(|ui| {
            let response = numeric_field(ui, "top_k", &mut app.drafts.top_k);
            if response.changed() {
                app.session.set_top_k_text(&app.drafts.top_k);
            }
            if response.lost_focus() {
                app.drafts.top_k = app.session.retrieval.top_k.to_string();
            }

            ui.vertical(|ui| {
                ui.label(egui::RichText::new("semantic").small().strong());
                let mut semantic = app.session.retrieval.semantic;
                if ui.checkbox(&mut semantic, "").changed() {
                    app.session.set_semantic(semantic);
                }
            });

            ui.vertical(|ui| {
                ui.label(egui::RichText::new("use_rrf").small().strong());
                let mut use_rrf = app.session.retrieval.use_rrf;
                if ui.checkbox(&mut use_rrf, "").changed() {
                    app.session.set_use_rrf(use_rrf);
                }
            });

            let response = numeric_field(ui, "threshold", &mut app.drafts.evidence_threshold);
            if response.changed() {
                app.session
                    .set_evidence_threshold_text(&app.drafts.evidence_threshold);
            }
            if response.lost_focus() {
                app.drafts.evidence_threshold = app.session.retrieval.evidence_threshold.to_string();
            }

            let response = numeric_field(ui, "evidence_topk", &mut app.drafts.evidence_top_k);
            if response.changed() {
                app.session.set_evidence_top_k_text(&app.drafts.evidence_top_k);
            }
            if response.lost_focus() {
                app.drafts.evidence_top_k = app.session.retrieval.evidence_top_k.to_string();
            }

            let response = numeric_field(ui, "temperature", &mut app.drafts.temperature);
            if response.changed() {
                app.session.set_temperature_text(&app.drafts.temperature);
            }
            if response.lost_focus() {
                app.drafts.temperature = app.session.retrieval.temperature.to_string();
            }
        });
    });
}

pub fn show_result_section(
    app: &mut RagDesktopApp,
    ui: &mut egui::Ui,
    actions: &mut Vec<PanelAction>,
) {
    section_frame(ui, "Answer", |ui| {
        let Some(result) = &app.session.last_result else {
            ui.label(egui::RichText::new("No answer yet").weak());
            return;
        };

        ui.horizontal(|ui| {
            ui.small(
                egui::RichText::new(format!("received {}", result.received_at.format("%H:%M:%S")))
                    .weak(),
            );
            if ui.small_button("Copy answer").clicked() {
                actions.push(PanelAction::CopyAnswer);
            }
        });
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.add(egui::Label::new(result.answer.as_str()).selectable(true));
        });
        if let Some(reason) = &result.reason {
            ui.small(egui::RichText::new(format!("reason: {reason}")).italics());
        }

        ui.add_space(8.0);
        ui.label(egui::RichText::new("Citations").strong());
        if result.citations.is_empty() {
            ui.small(egui::RichText::new("none").weak());
        }
        for citation in &result.citations {
            ui.label(format!("\u{2022} {}", format_citation(citation)));
        }

        ui.add_space(8.0);
        ui.label(egui::RichText::new("Meta").strong());
        ui.add(egui::Label::new(egui::RichText::new(format_meta(&result.meta)).monospace()).selectable(true));
    });
}

pub fn format_citation(citation: &Citation) -> String {
    let score = citation
        .score
        .map(|score| format!("{score:.3}"))
        .unwrap_or_default();
    format!(
        "{} - pgs {} - {} - score {}",
        citation.doc_id, citation.pages, citation.heading, score
    )
    .trim_end()
    .to_string()
}

pub fn format_meta(meta: &Map<String, Value>) -> String {
    serde_json::to_string_pretty(meta).unwrap_or_else(|_| "{}".to_string())
}
