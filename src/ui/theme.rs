//! Theme and styling for the chat view
//!
//! This module provides colors and visual styling for the message widgets.

use egui::{Color32, Rounding, Visuals};

/// Application theme configuration
#[derive(Clone, Debug)]
pub struct Theme {
    /// Primary accent color
    pub primary: Color32,
    /// Error color (red)
    pub error: Color32,

    /// Background colors
    pub bg_primary: Color32,
    pub bg_secondary: Color32,
    pub bg_tertiary: Color32,

    /// Text colors
    pub text_primary: Color32,
    pub text_secondary: Color32,
    pub text_muted: Color32,

    /// Message bubble fills
    pub user_bubble: Color32,
    pub bot_bubble: Color32,

    /// Speaker icon while playback is live
    pub speaking: Color32,

    /// Border radius for buttons
    pub button_rounding: Rounding,
    /// Border radius for cards/panels
    pub card_rounding: Rounding,
    /// Border radius for message bubbles
    pub bubble_rounding: Rounding,

    /// Standard spacing
    pub spacing: f32,
    /// Large spacing
    pub spacing_lg: f32,
    /// Small spacing
    pub spacing_sm: f32,

    dark: bool,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    /// Create a dark theme
    pub fn dark() -> Self {
        Self {
            primary: Color32::from_rgb(37, 99, 235),  // Blue
            error: Color32::from_rgb(239, 68, 68),    // Red

            bg_primary: Color32::from_rgb(15, 23, 42),   // Dark slate
            bg_secondary: Color32::from_rgb(30, 41, 59), // Lighter slate
            bg_tertiary: Color32::from_rgb(51, 65, 85),  // Even lighter

            text_primary: Color32::from_rgb(248, 250, 252),   // Almost white
            text_secondary: Color32::from_rgb(203, 213, 225), // Light gray
            text_muted: Color32::from_rgb(148, 163, 184),     // Medium gray

            user_bubble: Color32::from_rgb(37, 99, 235), // Blue
            bot_bubble: Color32::from_rgb(30, 41, 59),   // Slate

            speaking: Color32::from_rgb(96, 165, 250), // Light blue

            button_rounding: Rounding::same(8.0),
            card_rounding: Rounding::same(12.0),
            bubble_rounding: Rounding::same(10.0),

            spacing: 16.0,
            spacing_lg: 24.0,
            spacing_sm: 8.0,

            dark: true,
        }
    }

    /// Create a light theme
    pub fn light() -> Self {
        Self {
            primary: Color32::from_rgb(37, 99, 235),
            error: Color32::from_rgb(220, 38, 38),

            bg_primary: Color32::from_rgb(255, 255, 255),
            bg_secondary: Color32::from_rgb(241, 245, 249),
            bg_tertiary: Color32::from_rgb(226, 232, 240),

            text_primary: Color32::from_rgb(15, 23, 42),
            text_secondary: Color32::from_rgb(51, 65, 85),
            text_muted: Color32::from_rgb(100, 116, 139),

            user_bubble: Color32::from_rgb(37, 99, 235),
            bot_bubble: Color32::from_rgb(241, 245, 249),

            speaking: Color32::from_rgb(29, 78, 216),

            button_rounding: Rounding::same(8.0),
            card_rounding: Rounding::same(12.0),
            bubble_rounding: Rounding::same(10.0),

            spacing: 16.0,
            spacing_lg: 24.0,
            spacing_sm: 8.0,

            dark: false,
        }
    }

    /// Apply the theme to the egui context
    pub fn apply(&self, ctx: &egui::Context) {
        let mut visuals = if self.dark {
            Visuals::dark()
        } else {
            Visuals::light()
        };
        visuals.panel_fill = self.bg_primary;
        visuals.window_fill = self.bg_primary;
        ctx.set_visuals(visuals);
    }
}
