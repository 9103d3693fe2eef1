//! Message list component
//!
//! Displays the conversation with per-message speech toggles, uploaded-file
//! headers, and source-attachment cards.

use crate::messages::{Message, UploadedFile};
use crate::ui::components::SourcePanel;
use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, Align, Color32, RichText, Vec2};

/// Message list component
pub struct MessageList<'a> {
    state: &'a mut AppState,
    theme: &'a Theme,
}

impl<'a> MessageList<'a> {
    pub fn new(state: &'a mut AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(mut self, ui: &mut egui::Ui) {
        let messages = self.state.messages.get_all();

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                ui.vertical(|ui| {
                    ui.add_space(self.theme.spacing);

                    if messages.is_empty() {
                        self.show_empty_state(ui);
                    } else {
                        for message in &messages {
                            self.show_message(ui, message);
                            ui.add_space(self.theme.spacing_sm);
                        }
                    }

                    ui.add_space(self.theme.spacing);
                });
            });
    }

    fn show_empty_state(&self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(100.0);

            ui.label(
                RichText::new("No messages yet")
                    .size(24.0)
                    .color(self.theme.text_primary),
            );

            ui.add_space(self.theme.spacing);

            ui.label(
                RichText::new("Ask a question to start the conversation.")
                    .size(14.0)
                    .color(self.theme.text_muted),
            );
        });
    }

    fn show_message(&mut self, ui: &mut egui::Ui, message: &Message) {
        let is_user = message.is_user();
        let bubble_color = if is_user {
            self.theme.user_bubble
        } else {
            self.theme.bot_bubble
        };
        let text_color = if is_user {
            Color32::WHITE
        } else {
            self.theme.text_primary
        };

        // Align messages based on sender
        let align = if is_user { Align::RIGHT } else { Align::LEFT };

        ui.with_layout(egui::Layout::top_down(align), |ui| {
            // Sender label with avatar glyph
            ui.label(
                RichText::new(if is_user { "You 👤" } else { "🤖 Assistant" })
                    .size(12.0)
                    .color(self.theme.text_muted),
            );

            ui.add_space(2.0);

            // Message bubble
            let max_width = ui.available_width() * 0.75;

            egui::Frame::none()
                .fill(bubble_color)
                .rounding(self.theme.bubble_rounding)
                .inner_margin(egui::Margin::symmetric(12.0, 8.0))
                .show(ui, |ui| {
                    ui.set_max_width(max_width);

                    if let Some(file) = &message.file {
                        self.show_file_header(ui, file, text_color);
                        ui.separator();
                    }

                    if message.is_loading {
                        self.show_loading_indicator(ui);
                    } else {
                        ui.horizontal(|ui| {
                            ui.label(RichText::new(&message.content).color(text_color));

                            if message.wants_speech() {
                                self.show_speaker_button(ui, message);
                            }
                        });
                    }
                });

            // Source attachments below the bubble, bot replies only
            if !is_user && !message.sources.is_empty() {
                ui.add_space(4.0);
                SourcePanel::new(self.state, self.theme).show(ui, message);
            }

            // Timestamp
            let time_str = message.timestamp.format("%H:%M").to_string();
            ui.label(
                RichText::new(time_str)
                    .size(10.0)
                    .color(self.theme.text_muted),
            );
        });
    }

    fn show_file_header(&self, ui: &mut egui::Ui, file: &UploadedFile, text_color: Color32) {
        ui.horizontal(|ui| {
            ui.label(RichText::new("📎").size(16.0));
            ui.vertical(|ui| {
                ui.label(RichText::new(&file.name).color(text_color).strong());
                ui.label(
                    RichText::new(format!("{:.1} KB", file.size_kb()))
                        .size(11.0)
                        .color(text_color.gamma_multiply(0.7)),
                );
            });
            ui.label(
                RichText::new(file.badge_label())
                    .size(10.0)
                    .color(text_color.gamma_multiply(0.8)),
            );
        });
    }

    /// Pulsing dots while the reply is still being produced.
    fn show_loading_indicator(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            for i in 0..3 {
                let t = ui.ctx().input(|input| input.time);
                let alpha = ((t * 3.0 + i as f64 * 0.5).sin() * 0.5 + 0.5) as f32;
                ui.label(
                    RichText::new("●")
                        .size(10.0)
                        .color(self.theme.text_muted.gamma_multiply(alpha)),
                );
            }
        });
        ui.ctx().request_repaint();
    }

    fn show_speaker_button(&mut self, ui: &mut egui::Ui, message: &Message) {
        let playing = self.state.is_speaking(message.id);
        let (icon, tooltip, color) = if playing {
            ("🔊", "Stop", self.theme.speaking)
        } else {
            ("🔈", "Listen", self.theme.text_muted)
        };

        let button = egui::Button::new(RichText::new(icon).size(14.0).color(color))
            .min_size(Vec2::splat(24.0))
            .frame(false);

        if ui.add(button).on_hover_text(tooltip).clicked() {
            self.state.toggle_speech(message);
        }

        if playing {
            ui.ctx().request_repaint();
        }
    }
}
