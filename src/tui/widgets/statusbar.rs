use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::tui::theme;

pub fn render(frame: &mut Frame, area: Rect, busy: Option<&str>) {
    let hints = [
        ("[r]", " refresh  "),
        ("[l]", " locate  "),
        ("[?]", " help  "),
        ("[Esc]", " quit"),
    ];

    let mut spans = Vec::new();
    if let Some(what) = busy {
        spans.push(Span::styled(format!("{}…   ", what), theme::cyan()));
    }
    for (key, label) in &hints {
        spans.push(Span::styled(*key, theme::accent()));
        spans.push(Span::styled(*label, theme::dim()));
    }

    let line = Line::from(spans);
    let paragraph = Paragraph::new(line).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}
