use chrono::{DateTime, FixedOffset};
use ratatui::{
    layout::{Alignment, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};

use crate::tui::theme;

/// Title, wall clock, and the Hijri/Gregorian/zone line.
pub fn render(
    frame: &mut Frame,
    area: Rect,
    hijri_str: &str,
    now: DateTime<FixedOffset>,
    zone: Option<&str>,
) {
    let gregorian_str = now.format("%A, %-d %B %Y").to_string();

    let title_line = Line::from(vec![
        Span::styled("  إفطار  ", theme::accent().add_modifier(Modifier::BOLD)),
        Span::styled("Iftar Time", theme::cyan().add_modifier(Modifier::BOLD)),
    ]);

    let date_line = Line::from(vec![
        Span::styled(hijri_str, theme::accent()),
        Span::styled("  ·  ", theme::dim()),
        Span::styled(gregorian_str, theme::dim()),
        Span::styled("  ·  ", theme::dim()),
        Span::styled(
            zone.unwrap_or("Locating...").to_uppercase(),
            theme::dim().add_modifier(Modifier::BOLD),
        ),
    ]);

    let clock_line = Line::from(Span::styled(
        now.format("%-I:%M:%S %p").to_string(),
        theme::bold(),
    ));

    let text = vec![title_line, clock_line, date_line];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::accent())
        .style(theme::base());

    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}
