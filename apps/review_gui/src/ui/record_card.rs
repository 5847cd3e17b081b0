//! One record row: id, correctness flag, transcript text, playback toggle,
//! and the controls for editing, saving, and deleting.

use eframe::egui;
use review_client::{PendingWrite, RecordWidget, WriteStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardAction {
    Edit,
    Save,
    Delete,
    TogglePlayback,
    Retry,
    Dismiss,
}

/// Draws the card. Text and checkbox edits land in the widget's draft
/// directly; everything that needs the controller is returned as an action.
pub fn show_record_card(
    ui: &mut egui::Ui,
    widget: &mut RecordWidget,
    write_status: Option<&WriteStatus>,
) -> Option<CardAction> {
    let mut action = None;
    let busy = matches!(write_status, Some(WriteStatus::InFlight(_)));

    egui::Frame::group(ui.style())
        .corner_radius(6.0)
        .inner_margin(egui::Margin::symmetric(10, 8))
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.horizontal(|ui| {
                if ui
                    .add_enabled(!busy, egui::Button::new("🗑"))
                    .on_hover_text("Delete record")
                    .clicked()
                {
                    action = Some(CardAction::Delete);
                }
                ui.monospace(format!("#{}", widget.id()));

                let mut is_correct = widget.draft().is_correct;
                if ui.checkbox(&mut is_correct, "Is Correct").changed() {
                    widget.set_correct(is_correct);
                }

                if widget.shows_edit_control() && ui.button("✏ Edit").clicked() {
                    action = Some(CardAction::Edit);
                }
                if widget.shows_save_control()
                    && ui.add_enabled(!busy, egui::Button::new("💾 Save")).clicked()
                {
                    action = Some(CardAction::Save);
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let icon = if widget.playback().is_requested_on() {
                        "⏸"
                    } else {
                        "▶"
                    };
                    if ui
                        .button(icon)
                        .on_hover_text(widget.record().audio_ref.as_str())
                        .clicked()
                    {
                        action = Some(CardAction::TogglePlayback);
                    }
                    if let Some(reason) = widget.playback().last_error() {
                        ui.colored_label(ui.visuals().error_fg_color, "audio unavailable")
                            .on_hover_text(reason);
                    }
                });
            });

            if widget.is_editing() {
                let mut text = widget.draft().text.clone();
                let response = ui.add(
                    egui::TextEdit::multiline(&mut text)
                        .desired_rows(3)
                        .desired_width(f32::INFINITY),
                );
                if response.changed() {
                    widget.set_text(text);
                }
            } else {
                ui.label(widget.draft().text.as_str());
            }

            match write_status {
                Some(WriteStatus::InFlight(write)) => {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.weak(in_flight_label(write));
                    });
                }
                Some(WriteStatus::Failed { write, reason }) => {
                    ui.horizontal_wrapped(|ui| {
                        ui.colored_label(
                            ui.visuals().error_fg_color,
                            format!("{} failed: {reason}", write.label()),
                        );
                        if ui.small_button("Retry").clicked() {
                            action = Some(CardAction::Retry);
                        }
                        if ui.small_button("Dismiss").clicked() {
                            action = Some(CardAction::Dismiss);
                        }
                    });
                }
                None => {}
            }
        });

    action
}

fn in_flight_label(write: &PendingWrite) -> &'static str {
    match write {
        PendingWrite::Save { .. } => "Saving…",
        PendingWrite::Delete { .. } => "Deleting…",
    }
}
