use ratatui::style::{Color, Modifier, Style};

pub const BG: Color = Color::Rgb(15, 23, 42);
pub const SURFACE: Color = Color::Rgb(30, 41, 59);
pub const BORDER: Color = Color::Rgb(51, 65, 85);
pub const TEXT: Color = Color::Rgb(226, 232, 240);
pub const TEXT_DIM: Color = Color::Rgb(148, 163, 184);
pub const EMERALD: Color = Color::Rgb(52, 211, 153);
pub const CYAN: Color = Color::Rgb(34, 211, 238);
pub const RED: Color = Color::Rgb(248, 113, 113);

pub fn base() -> Style {
    Style::default().fg(TEXT).bg(BG)
}

pub fn surface() -> Style {
    Style::default().fg(TEXT).bg(SURFACE)
}

pub fn border() -> Style {
    Style::default().fg(BORDER)
}

pub fn dim() -> Style {
    Style::default().fg(TEXT_DIM)
}

pub fn accent() -> Style {
    Style::default().fg(EMERALD)
}

pub fn cyan() -> Style {
    Style::default().fg(CYAN)
}

pub fn red() -> Style {
    Style::default().fg(RED)
}

pub fn bold() -> Style {
    Style::default().fg(TEXT).add_modifier(Modifier::BOLD)
}

/// Inverted emerald tag, e.g. "NEXT".
pub fn badge() -> Style {
    Style::default()
        .fg(BG)
        .bg(EMERALD)
        .add_modifier(Modifier::BOLD)
}
