use chrono::{DateTime, FixedOffset};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};
use tui_big_text::{BigText, PixelSize};

use crate::prayer_times::CountdownState;
use crate::tui::theme;
use crate::utils::format::{format_countdown, format_time_12h, meridiem, progress_bar};

/// Hero panel: "Time until Iftar" with a large HH:MM:SS clock.
pub fn render(
    frame: &mut Frame,
    area: Rect,
    state: Option<CountdownState>,
    iftar_at: Option<DateTime<FixedOffset>>,
    progress: Option<f64>,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border())
        .style(theme::surface());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // title
            Constraint::Length(4), // clock
            Constraint::Min(0),    // footer
        ])
        .split(inner);

    let title = match state {
        Some(s) if s.arrived => Line::from(Span::styled(
            "It is time to break your fast",
            theme::accent().add_modifier(Modifier::BOLD),
        )),
        _ => Line::from(vec![
            Span::styled("Time until ", theme::bold()),
            Span::styled("Iftar", theme::accent().add_modifier(Modifier::BOLD)),
        ]),
    };
    frame.render_widget(Paragraph::new(title).alignment(Alignment::Center), rows[0]);

    let clock = match state {
        Some(s) => format_countdown(&s),
        None => "--:--:--".to_string(),
    };
    let big = BigText::builder()
        .pixel_size(PixelSize::Quadrant)
        .style(theme::accent())
        .lines(vec![Line::from(clock)])
        .alignment(Alignment::Center)
        .build();
    frame.render_widget(big, rows[1]);

    let mut footer = Vec::new();
    if let Some(at) = iftar_at {
        let t = at.time();
        footer.push(Line::from(vec![
            Span::styled("Maghrib ", theme::dim()),
            Span::styled(format!("{} {}", format_time_12h(t), meridiem(t)), theme::bold()),
        ]));
    }
    if let Some(ratio) = progress {
        footer.push(Line::from(vec![
            Span::styled(progress_bar(ratio, 24), theme::accent()),
            Span::styled(
                format!("  FAST PROGRESS: {:.0}%", ratio * 100.0),
                theme::dim(),
            ),
        ]));
    }
    frame.render_widget(Paragraph::new(footer).alignment(Alignment::Center), rows[2]);
}
