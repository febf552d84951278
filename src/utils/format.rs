use chrono::NaiveTime;
use unicode_width::UnicodeWidthStr;

use crate::prayer_times::CountdownState;

/// Format a duration in seconds to "Xh Ym" or "Ym" string
pub fn format_duration_secs(secs: i64) -> String {
    if secs <= 0 {
        return "now".to_string();
    }
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m", minutes)
    } else {
        "<1m".to_string()
    }
}

/// "HH:MM:SS", hours widen past 99
pub fn format_countdown(state: &CountdownState) -> String {
    format!("{:02}:{:02}:{:02}", state.hours, state.minutes, state.seconds)
}

/// "7:05" style 12-hour clock, no meridiem
pub fn format_time_12h(t: NaiveTime) -> String {
    t.format("%-I:%M").to_string()
}

pub fn meridiem(t: NaiveTime) -> &'static str {
    use chrono::Timelike;
    if t.hour() >= 12 { "PM" } else { "AM" }
}

/// Create a simple ASCII progress bar
pub fn progress_bar(ratio: f64, width: usize) -> String {
    let ratio = ratio.clamp(0.0, 1.0);
    let filled_count = (ratio * width as f64).round() as usize;
    let empty_count = width.saturating_sub(filled_count);
    format!("{}{}", "█".repeat(filled_count), "░".repeat(empty_count))
}

/// Pad `s` on both sides to `width` display columns.
pub fn center(s: &str, width: usize) -> String {
    let w = s.width();
    if w >= width {
        return s.to_string();
    }
    let left = (width - w) / 2;
    let right = width - w - left;
    format!("{}{}{}", " ".repeat(left), s, " ".repeat(right))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_text() {
        assert_eq!(format_duration_secs(0), "now");
        assert_eq!(format_duration_secs(30), "<1m");
        assert_eq!(format_duration_secs(4_800), "1h 20m");
        assert_eq!(format_duration_secs(600), "10m");
    }

    #[test]
    fn countdown_is_zero_padded() {
        let state = CountdownState { hours: 1, minutes: 2, seconds: 3, arrived: false };
        assert_eq!(format_countdown(&state), "01:02:03");
        let long = CountdownState { hours: 120, minutes: 0, seconds: 9, arrived: false };
        assert_eq!(format_countdown(&long), "120:00:09");
        assert_eq!(format_countdown(&CountdownState::ARRIVED), "00:00:00");
    }

    #[test]
    fn twelve_hour_clock() {
        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
        assert_eq!(format_time_12h(t(19, 20)), "7:20");
        assert_eq!(format_time_12h(t(0, 5)), "12:05");
        assert_eq!(format_time_12h(t(12, 0)), "12:00");
        assert_eq!(meridiem(t(5, 45)), "AM");
        assert_eq!(meridiem(t(12, 0)), "PM");
    }

    #[test]
    fn progress_bar_clamps() {
        assert_eq!(progress_bar(0.5, 4), "██░░");
        assert_eq!(progress_bar(2.0, 3), "███");
        assert_eq!(progress_bar(-1.0, 2), "░░");
    }

    #[test]
    fn center_counts_display_width() {
        assert_eq!(center("ab", 6), "  ab  ");
        assert_eq!(center("日本", 6), " 日本 ");
        assert_eq!(center("toolong", 3), "toolong");
    }
}
