use chrono::{Datelike, Duration, NaiveDate};
use hijri_date::HijriDate;

/// Islamic month names in English (index 0 = Muharram = month 1)
const HIJRI_MONTH_NAMES: &[&str] = &[
    "Muharram",
    "Safar",
    "Rabi' al-Awwal",
    "Rabi' al-Thani",
    "Jumada al-Awwal",
    "Jumada al-Thani",
    "Rajab",
    "Sha'ban",
    "Ramadan",
    "Shawwal",
    "Dhu al-Qi'dah",
    "Dhu al-Hijjah",
];

fn hijri_month_name(month: usize) -> Option<&'static str> {
    if (1..=12).contains(&month) {
        Some(HIJRI_MONTH_NAMES[month - 1])
    } else {
        None
    }
}

/// "1447-09-11" → "11 Ramadan 1447". Anything unrecognised comes back unchanged.
pub fn format_hijri_label(raw: &str) -> String {
    let parts: Vec<&str> = raw.trim().split('-').collect();
    let [year, month, day] = parts.as_slice() else {
        return raw.to_string();
    };
    let (Ok(month), Ok(day)) = (month.parse::<usize>(), day.parse::<u32>()) else {
        return raw.to_string();
    };
    match hijri_month_name(month) {
        Some(name) => format!("{} {} {}", day, name, year),
        None => raw.to_string(),
    }
}

/// Hijri date for `date` computed locally, with a day offset for local moon
/// sighting (e.g. -1 where the month starts a day after Saudi Arabia).
pub fn local_hijri_string(date: NaiveDate, offset_days: i32) -> String {
    let adjusted = date + Duration::days(offset_days as i64);

    let hd = HijriDate::from_gr(
        adjusted.year() as usize,
        adjusted.month() as usize,
        adjusted.day() as usize,
    )
    .unwrap_or_else(|_| HijriDate::today());

    format!(
        "{} {} {}",
        hd.day(),
        hijri_month_name(hd.month()).unwrap_or("Unknown"),
        hd.year()
    )
}

/// The label shown in the header: the source's own Hijri date when it sent
/// one, otherwise the local computation.
pub fn hijri_label(source: Option<&str>, today: NaiveDate, offset_days: i32) -> String {
    match source {
        Some(raw) if !raw.trim().is_empty() => format_hijri_label(raw),
        _ => local_hijri_string(today, offset_days),
    }
}
