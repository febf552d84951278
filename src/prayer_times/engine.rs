use chrono::{DateTime, Duration, FixedOffset, TimeZone};
use thiserror::Error;

use crate::models::{PrayerInstant, PrayerName, PrayerSet};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("prayer data is malformed: no usable prayer time in the set")]
    MalformedPrayerData,
}

/// Project every usable prayer of `set` onto today (the local date of `now`),
/// sorted ascending. Unusable fields are logged and skipped.
pub fn project_today(
    set: &PrayerSet,
    now: DateTime<FixedOffset>,
    include_syuruk: bool,
) -> Vec<PrayerInstant> {
    let offset = *now.offset();
    let today = now.date_naive();

    let mut instants: Vec<PrayerInstant> = set
        .entries()
        .into_iter()
        .filter(|(prayer, _)| include_syuruk || *prayer != PrayerName::Syuruk)
        .filter_map(|(prayer, value)| {
            let Some(value) = value else {
                log::warn!("{} missing from prayer set, skipping", prayer);
                return None;
            };
            match value.resolve(today, &offset) {
                Some(at) => Some(PrayerInstant { prayer, next_day: false, at }),
                None => {
                    log::warn!("Unparseable {} time {:?}, skipping", prayer, value);
                    None
                }
            }
        })
        .collect();

    // Source order is not trusted.
    instants.sort_by_key(|p| p.at);
    instants
}

/// The next prayer strictly after `now`. Past Isha this is Fajr's time of day
/// on the following date, flagged `next_day`.
pub fn compute_next_prayer(
    set: &PrayerSet,
    now: DateTime<FixedOffset>,
    include_syuruk: bool,
) -> Result<PrayerInstant, EngineError> {
    let candidates = project_today(set, now, include_syuruk);
    if candidates.is_empty() {
        return Err(EngineError::MalformedPrayerData);
    }

    if let Some(next) = candidates.iter().find(|p| p.at > now) {
        return Ok(next.clone());
    }

    let offset = *now.offset();
    let tomorrow = now.date_naive() + Duration::days(1);

    // Fajr opens the next day; without a usable Fajr the earliest candidate stands in.
    let (prayer, time) = set
        .fajr
        .as_ref()
        .and_then(|v| v.time_of_day(&offset))
        .map(|t| (PrayerName::Fajr, t))
        .unwrap_or_else(|| {
            let first = &candidates[0];
            (first.prayer, first.at.time())
        });

    let at = offset
        .from_local_datetime(&tomorrow.and_time(time))
        .single()
        .ok_or(EngineError::MalformedPrayerData)?;

    Ok(PrayerInstant { prayer, next_day: true, at })
}
