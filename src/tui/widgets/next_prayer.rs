use chrono::{DateTime, FixedOffset};
use ratatui::{
    layout::{Alignment, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};

use crate::models::PrayerInstant;
use crate::tui::theme;
use crate::utils::format::{format_duration_secs, format_time_12h, meridiem};

pub fn render(
    frame: &mut Frame,
    area: Rect,
    next_prayer: Option<&PrayerInstant>,
    now: DateTime<FixedOffset>,
    loading: bool,
) {
    let block = Block::default()
        .title(Span::styled(" Next Prayer ", theme::accent()))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border())
        .style(theme::surface());

    let content: Vec<Line> = match next_prayer {
        None if loading => vec![
            Line::from(""),
            Line::from(Span::styled("  Loading prayer times...", theme::dim())),
        ],
        None => vec![
            Line::from(""),
            Line::from(Span::styled("  No data", theme::dim())),
        ],
        Some(next) => {
            let t = next.at.time();
            let secs = (next.at - now).num_seconds();
            vec![
                Line::from(""),
                Line::from(Span::styled(
                    format!("  {}", next.label().to_uppercase()),
                    theme::accent().add_modifier(Modifier::BOLD),
                )),
                Line::from(vec![
                    Span::styled("  at  ", theme::dim()),
                    Span::styled(format!("{} {}", format_time_12h(t), meridiem(t)), theme::bold()),
                ]),
                Line::from(""),
                Line::from(vec![
                    Span::styled("  in  ", theme::dim()),
                    Span::styled(
                        format_duration_secs(secs),
                        theme::cyan().add_modifier(Modifier::BOLD),
                    ),
                ]),
            ]
        }
    };

    let paragraph = Paragraph::new(content)
        .block(block)
        .alignment(Alignment::Left);

    frame.render_widget(paragraph, area);
}
