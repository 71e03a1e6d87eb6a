// Centralized theme system for consistent UI styling
// All colors and styles are defined here - edit this file to change the look

use ratatui::style::Color;

/// App background - pure black for contrast
pub const BG_APP: Color = Color::Rgb(0, 0, 0);

/// Input field background
pub const BG_INPUT: Color = Color::Rgb(18, 18, 18);

/// Selected item background
pub const BG_SELECTED: Color = Color::Rgb(32, 32, 32);

/// Primary text - off-white for readability
pub const TEXT_PRIMARY: Color = Color::Rgb(220, 220, 220);

/// Secondary/muted text
pub const TEXT_MUTED: Color = Color::Rgb(128, 128, 128);

/// Dimmed text for hints, placeholders
pub const TEXT_DIM: Color = Color::Rgb(90, 90, 90);

/// Primary accent - muted blue (interactive elements, focus)
pub const ACCENT_PRIMARY: Color = Color::Rgb(86, 156, 214);

/// Success/positive - muted green
pub const ACCENT_SUCCESS: Color = Color::Rgb(106, 153, 85);

/// Warning - muted amber
pub const ACCENT_WARNING: Color = Color::Rgb(215, 153, 33);

/// Error - muted red
pub const ACCENT_ERROR: Color = Color::Rgb(204, 102, 102);

/// Inactive borders
pub const BORDER_INACTIVE: Color = Color::Rgb(60, 60, 60);

/// Active/focused borders
pub const BORDER_ACTIVE: Color = ACCENT_PRIMARY;

/// Palette for per-sender accents
const USER_PALETTE: [Color; 8] = [
    Color::Rgb(86, 156, 214),  // Blue
    Color::Rgb(106, 153, 85),  // Green
    Color::Rgb(169, 154, 203), // Purple
    Color::Rgb(206, 145, 120), // Orange
    Color::Rgb(180, 100, 140), // Pink
    Color::Rgb(78, 154, 154),  // Cyan
    Color::Rgb(180, 180, 120), // Yellow
    Color::Rgb(180, 100, 100), // Red
];

/// Get a deterministic color for a sender based on its node id
pub fn user_color(node_id: &str) -> Color {
    let hash: usize = node_id.bytes().map(|b| b as usize).sum();
    USER_PALETTE[hash % USER_PALETTE.len()]
}
