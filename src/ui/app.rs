//! Main application struct and eframe integration
//!
//! This module contains the ReciteApp shell that hosts the message view.

use crate::ui::components::{InputBar, MessageList};
use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, CentralPanel, RichText, TopBottomPanel};

/// Main application shell around the chat view
pub struct ReciteApp {
    /// Application state
    state: AppState,
    /// Visual theme
    theme: Theme,
}

impl ReciteApp {
    /// Create the application with pre-built state (backends wired by the
    /// caller).
    pub fn new(cc: &eframe::CreationContext<'_>, state: AppState) -> Self {
        let theme = Theme::dark();
        theme.apply(&cc.egui_ctx);

        Self { state, theme }
    }

    /// Show the top header bar
    fn show_header(&mut self, ctx: &egui::Context) {
        TopBottomPanel::top("header")
            .frame(
                egui::Frame::none()
                    .fill(self.theme.bg_secondary)
                    .inner_margin(12.0),
            )
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        RichText::new("Recite")
                            .size(20.0)
                            .strong()
                            .color(self.theme.text_primary),
                    );

                    ui.label(
                        RichText::new("Document Chat")
                            .size(14.0)
                            .color(self.theme.text_muted),
                    );

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("🗑").on_hover_text("Clear Chat").clicked() {
                            self.state.clear_messages();
                        }

                        if let Some(error) = &self.state.last_error {
                            ui.label(
                                RichText::new(error).size(11.0).color(self.theme.error),
                            );
                        }
                    });
                });
            });
    }

    /// Show the bottom input area
    fn show_input_area(&mut self, ctx: &egui::Context) {
        TopBottomPanel::bottom("input_area")
            .frame(
                egui::Frame::none()
                    .fill(self.theme.bg_primary)
                    .inner_margin(self.theme.spacing),
            )
            .show(ctx, |ui| {
                InputBar::new(&mut self.state, &self.theme).show(ui);
            });
    }

    /// Show the main content area (message list)
    fn show_content(&mut self, ctx: &egui::Context) {
        CentralPanel::default()
            .frame(egui::Frame::none().fill(self.theme.bg_primary))
            .show(ctx, |ui| {
                MessageList::new(&mut self.state, &self.theme).show(ui);
            });
    }
}

impl eframe::App for ReciteApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Backend events first so this frame draws settled playback state
        self.state.poll_events();
        self.state.prune_controllers();

        self.show_header(ctx);
        self.show_input_area(ctx);
        self.show_content(ctx);

        // Keep animating while audio is live
        if self.state.any_speaking() {
            ctx.request_repaint();
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.state.shutdown();
    }
}
