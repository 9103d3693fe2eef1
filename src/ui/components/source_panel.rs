//! Source attachment cards
//!
//! One card per cited document: display name, page locator, file-type
//! badge, and the single action the resolver picked for it.

use crate::messages::{Message, SourceDocument};
use crate::sources::SourceAction;
use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, RichText, Vec2};

const EXCERPT_CHARS: usize = 120;

/// Source list component
pub struct SourcePanel<'a> {
    state: &'a mut AppState,
    theme: &'a Theme,
}

impl<'a> SourcePanel<'a> {
    pub fn new(state: &'a mut AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(mut self, ui: &mut egui::Ui, message: &Message) {
        ui.label(
            RichText::new(format!("📚 Sources ({})", message.sources.len()))
                .size(11.0)
                .color(self.theme.text_muted)
                .strong(),
        );

        for source in &message.sources {
            ui.add_space(2.0);
            self.show_source_card(ui, source);
        }
    }

    fn show_source_card(&mut self, ui: &mut egui::Ui, source: &SourceDocument) {
        let action = self.state.resolver().resolve(source);

        egui::Frame::none()
            .fill(self.theme.bg_secondary)
            .rounding(self.theme.card_rounding)
            .inner_margin(self.theme.spacing_sm)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label(RichText::new("📄").size(14.0));

                    ui.vertical(|ui| {
                        ui.horizontal(|ui| {
                            ui.label(
                                RichText::new(source.display_name())
                                    .size(12.0)
                                    .color(self.theme.text_secondary)
                                    .strong(),
                            );

                            if let Some(page) = source.page {
                                self.show_badge(ui, &format!("Page {}", page));
                            }

                            // Type badge for everything except PDFs
                            if source.file_extension().as_deref() != Some("pdf") {
                                self.show_badge(ui, &source.badge_label());
                            }
                        });

                        if !source.excerpt.is_empty() {
                            ui.label(
                                RichText::new(truncate_excerpt(&source.excerpt, EXCERPT_CHARS))
                                    .size(11.0)
                                    .color(self.theme.text_muted),
                            );
                        }
                    });

                    if let Some(action) = action {
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            self.show_action_button(ui, action);
                        });
                    }
                });
            });
    }

    fn show_badge(&self, ui: &mut egui::Ui, text: &str) {
        egui::Frame::none()
            .fill(self.theme.bg_tertiary)
            .rounding(4.0)
            .inner_margin(egui::Margin::symmetric(4.0, 1.0))
            .show(ui, |ui| {
                ui.label(
                    RichText::new(text)
                        .size(9.0)
                        .color(self.theme.text_secondary),
                );
            });
    }

    fn show_action_button(&mut self, ui: &mut egui::Ui, action: SourceAction) {
        let (icon, tooltip) = match &action {
            SourceAction::OpenViewer { .. } => ("🔍", "Open in viewer"),
            SourceAction::OpenPreview { .. } => ("🔗", "View file"),
            SourceAction::Download { .. } => ("⬇", "Download file"),
        };

        let button = egui::Button::new(RichText::new(icon).size(12.0))
            .min_size(Vec2::splat(22.0))
            .rounding(self.theme.button_rounding);

        if ui.add(button).on_hover_text(tooltip).clicked() {
            self.state.dispatch(action);
        }
    }
}

fn truncate_excerpt(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{}...", truncated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_excerpt() {
        assert_eq!(truncate_excerpt("short", 120), "short");
    }

    #[test]
    fn test_truncate_long_excerpt() {
        let long = "x".repeat(200);
        let truncated = truncate_excerpt(&long, 120);
        assert_eq!(truncated.chars().count(), 123);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn test_truncate_is_char_safe() {
        let text = "ü".repeat(130);
        let truncated = truncate_excerpt(&text, 120);
        assert!(truncated.ends_with("..."));
    }
}
