//! Color palette shared by every pane

use ratatui::style::Color;

pub struct Theme {
    pub fg: Color,
    pub primary: Color,   // Blue
    pub secondary: Color, // Orange
    pub comment: Color,   // Grey
    pub error: Color,     // Red
    pub number: Color,
    pub border_focused: Color,
    pub border_normal: Color,
    pub current_line_bg: Color,
    pub blocks: [Color; 6], // Cycled by pid in the heap map
}

pub const DEFAULT_THEME: Theme = Theme {
    fg: Color::Rgb(205, 214, 244),
    primary: Color::Rgb(137, 180, 250),   // Blue
    secondary: Color::Rgb(250, 179, 135), // Orange
    comment: Color::Rgb(108, 112, 134),
    error: Color::Rgb(243, 139, 168),
    number: Color::Rgb(250, 179, 135),         // Orange for numbers
    border_focused: Color::Rgb(249, 226, 175), // Yellow border for focus
    border_normal: Color::Rgb(108, 112, 134),  // Grey border for normal
    current_line_bg: Color::Rgb(50, 50, 70),   // Slightly lighter BG for status bar
    blocks: [
        Color::Rgb(137, 180, 250), // Blue
        Color::Rgb(166, 227, 161), // Green
        Color::Rgb(249, 226, 175), // Yellow
        Color::Rgb(245, 194, 231), // Pink
        Color::Rgb(148, 226, 213), // Teal
        Color::Rgb(250, 179, 135), // Orange
    ],
};

impl Theme {
    /// Color used for a pid in the heap map and block list
    pub fn block_color(&self, pid: u32) -> Color {
        self.blocks[pid as usize % self.blocks.len()]
    }
}
