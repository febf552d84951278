use chrono::NaiveTime;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};

use crate::models::PrayerName;
use crate::tui::theme;
use crate::utils::format::{center, format_time_12h, meridiem};

const CARD_TEXT_WIDTH: usize = 12;

#[derive(Debug, Clone, PartialEq)]
pub struct PrayerCard {
    pub prayer: PrayerName,
    pub time: Option<NaiveTime>,
    pub is_next: bool,
    pub is_past: bool,
}

/// Six cards, three per row.
pub fn render(frame: &mut Frame, area: Rect, cards: &[PrayerCard]) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)])
        .split(area);

    for (row_idx, row_cards) in cards.chunks(3).enumerate().take(rows.len()) {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
            ])
            .split(rows[row_idx]);

        for (card, col) in row_cards.iter().zip(cols.iter()) {
            render_card(frame, *col, card);
        }
    }
}

fn render_card(frame: &mut Frame, area: Rect, card: &PrayerCard) {
    let name = card.prayer.display_name().to_uppercase();
    let title = if card.is_next {
        Line::from(vec![
            Span::styled(format!(" {} ", name), theme::accent().add_modifier(Modifier::BOLD)),
            Span::styled(" NEXT ", theme::badge()),
        ])
    } else {
        Line::from(Span::styled(format!(" {} ", name), theme::dim()))
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(if card.is_next { theme::accent() } else { theme::border() })
        .style(theme::surface());

    let (time_str, ampm) = match card.time {
        Some(t) => (format_time_12h(t), meridiem(t)),
        None => ("--:--".to_string(), ""),
    };
    let time_style = if card.is_next {
        theme::bold()
    } else if card.is_past {
        theme::dim()
    } else {
        theme::bold().remove_modifier(Modifier::BOLD)
    };

    let mut lines = vec![Line::from(vec![
        Span::styled(center(&time_str, CARD_TEXT_WIDTH - 3), time_style),
        Span::styled(ampm, theme::dim()),
    ])];

    if card.prayer == PrayerName::Maghrib && card.is_next {
        lines.push(Line::from(Span::styled(
            center("IFTAR TIME", CARD_TEXT_WIDTH),
            theme::accent(),
        )));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
