use chrono::{DateTime, FixedOffset, NaiveDate};

use crate::models::{PrayerDay, PrayerInstant, PrayerName};
use crate::prayer_times::engine::{compute_next_prayer, EngineError};
use crate::prayer_times::source::SourceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerError {
    FetchFailed,
    MalformedData,
}

impl TrackerError {
    pub fn message(&self) -> &'static str {
        match self {
            TrackerError::FetchFailed => "Failed to fetch prayer times. Please try again.",
            TrackerError::MalformedData => "Prayer data is malformed. Showing the last good times.",
        }
    }
}

/// Current prayer day and the next prayer derived from it.
///
/// Errors never wipe what is already on screen: a failed fetch keeps the old
/// day, an unreadable day keeps the old next prayer.
#[derive(Debug)]
pub struct PrayerTracker {
    include_syuruk: bool,
    day: Option<PrayerDay>,
    next: Option<PrayerInstant>,
    error: Option<TrackerError>,
    fetched_on: Option<NaiveDate>,
}

impl PrayerTracker {
    pub fn new(include_syuruk: bool) -> Self {
        Self {
            include_syuruk,
            day: None,
            next: None,
            error: None,
            fetched_on: None,
        }
    }

    /// Seed from a previously cached day so the screen is not empty while the
    /// first fetch is in flight.
    pub fn seed(&mut self, day: PrayerDay, now: DateTime<FixedOffset>) {
        if let Ok(next) = compute_next_prayer(&day.set, now, self.include_syuruk) {
            self.next = Some(next);
            self.fetched_on = Some(day.date.unwrap_or_else(|| now.date_naive()));
            self.day = Some(day);
        }
    }

    pub fn on_fetch(&mut self, result: Result<PrayerDay, SourceError>, now: DateTime<FixedOffset>) {
        match result {
            Ok(day) => match compute_next_prayer(&day.set, now, self.include_syuruk) {
                Ok(next) => {
                    log::debug!("Prayer times for zone {} loaded, next is {}", day.zone, next.label());
                    // The record's own date, not arrival time: a response that
                    // lands after midnight still describes the day it was asked for.
                    self.fetched_on = Some(day.date.unwrap_or_else(|| now.date_naive()));
                    self.day = Some(day);
                    self.next = Some(next);
                    self.error = None;
                }
                Err(EngineError::MalformedPrayerData) => {
                    log::error!("Fetched prayer set for zone {} has no usable times", day.zone);
                    self.error = Some(TrackerError::MalformedData);
                }
            },
            Err(err) => {
                log::error!("Prayer time fetch failed: {}", err);
                if self.day.is_none() {
                    self.error = Some(TrackerError::FetchFailed);
                }
            }
        }
    }

    /// Periodic recomputation against the current day.
    pub fn reevaluate(&mut self, now: DateTime<FixedOffset>) {
        let Some(day) = &self.day else {
            return;
        };
        match compute_next_prayer(&day.set, now, self.include_syuruk) {
            Ok(next) => self.next = Some(next),
            Err(err) => log::warn!("Keeping previous next prayer: {}", err),
        }
    }

    /// Whether the local date moved past the day the data was fetched for.
    pub fn needs_refetch(&self, now: DateTime<FixedOffset>) -> bool {
        self.fetched_on
            .map(|d| d < now.date_naive())
            .unwrap_or(false)
    }

    /// Maghrib of the current day: the Iftar countdown target.
    pub fn iftar_at(&self, now: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
        self.time_of(PrayerName::Maghrib, now)
    }

    /// Resolved against `now`'s date, the same base the engine projects onto.
    pub fn time_of(&self, prayer: PrayerName, now: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
        let day = self.day.as_ref()?;
        day.set.get(prayer)?.resolve(now.date_naive(), now.offset())
    }

    pub fn day(&self) -> Option<&PrayerDay> {
        self.day.as_ref()
    }

    pub fn next(&self) -> Option<&PrayerInstant> {
        self.next.as_ref()
    }

    pub fn error(&self) -> Option<TrackerError> {
        self.error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PrayerSet, TimeValue};
    use chrono::TimeZone;

    fn at(d: u32, h: u32, m: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(8 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 3, d, h, m, 0)
            .unwrap()
    }

    fn local(s: &str) -> Option<TimeValue> {
        Some(TimeValue::LocalTime(s.to_string()))
    }

    fn day() -> PrayerDay {
        PrayerDay {
            zone: "WLY01".to_string(),
            hijri: Some("1447-09-11".to_string()),
            date: NaiveDate::from_ymd_opt(2026, 3, 1),
            set: PrayerSet {
                fajr: local("05:45"),
                syuruk: local("07:02"),
                dhuhr: local("13:15"),
                asr: local("16:30"),
                maghrib: local("19:20"),
                isha: local("20:35"),
            },
        }
    }

    fn network_error() -> SourceError {
        SourceError::Status(503)
    }

    #[test]
    fn successful_fetch_computes_next_immediately() {
        let mut tracker = PrayerTracker::new(true);
        tracker.on_fetch(Ok(day()), at(1, 18, 0));
        let next = tracker.next().unwrap();
        assert_eq!(next.prayer, PrayerName::Maghrib);
        assert!(tracker.error().is_none());
        assert_eq!(tracker.iftar_at(at(1, 18, 0)), Some(at(1, 19, 20)));
    }

    #[test]
    fn failed_fetch_with_existing_day_shows_no_error() {
        let mut tracker = PrayerTracker::new(true);
        tracker.on_fetch(Ok(day()), at(1, 18, 0));
        let before = tracker.next().cloned();

        tracker.on_fetch(Err(network_error()), at(1, 18, 1));
        assert!(tracker.error().is_none());
        assert_eq!(tracker.next().cloned(), before);
        assert!(tracker.day().is_some());
    }

    #[test]
    fn failed_fetch_without_data_surfaces_error() {
        let mut tracker = PrayerTracker::new(true);
        tracker.on_fetch(Err(network_error()), at(1, 18, 0));
        assert_eq!(tracker.error(), Some(TrackerError::FetchFailed));
        assert!(tracker.next().is_none());
        assert!(tracker.iftar_at(at(1, 18, 0)).is_none());
    }

    #[test]
    fn malformed_fetch_keeps_previous_state() {
        let mut tracker = PrayerTracker::new(true);
        tracker.on_fetch(Ok(day()), at(1, 18, 0));

        let mut broken = day();
        broken.zone = "SGR01".to_string();
        broken.set = PrayerSet::default();
        tracker.on_fetch(Ok(broken), at(1, 18, 5));

        assert_eq!(tracker.error(), Some(TrackerError::MalformedData));
        assert_eq!(tracker.day().unwrap().zone, "WLY01");
        assert_eq!(tracker.next().unwrap().prayer, PrayerName::Maghrib);
    }

    #[test]
    fn reevaluation_moves_past_isha_to_tomorrow() {
        let mut tracker = PrayerTracker::new(true);
        tracker.on_fetch(Ok(day()), at(1, 20, 30));
        assert_eq!(tracker.next().unwrap().prayer, PrayerName::Isha);

        tracker.reevaluate(at(1, 21, 0));
        let next = tracker.next().unwrap();
        assert!(next.next_day);
        assert_eq!(next.at, at(2, 5, 45));
    }

    #[test]
    fn midnight_requests_refetch() {
        let mut tracker = PrayerTracker::new(true);
        assert!(!tracker.needs_refetch(at(1, 12, 0)));
        tracker.on_fetch(Ok(day()), at(1, 23, 59));
        assert!(!tracker.needs_refetch(at(1, 23, 59)));
        assert!(tracker.needs_refetch(at(2, 0, 0)));
    }

    #[test]
    fn late_response_keeps_its_own_date() {
        let mut tracker = PrayerTracker::new(true);
        // Requested on the 1st, delivered just after midnight.
        tracker.on_fetch(Ok(day()), at(2, 0, 0));
        assert!(tracker.needs_refetch(at(2, 12, 0)));
    }

    #[test]
    fn card_times_agree_with_next_prayer() {
        let mut tracker = PrayerTracker::new(true);
        tracker.on_fetch(Ok(day()), at(1, 18, 0));

        // Stale day still on screen the next afternoon.
        tracker.reevaluate(at(2, 18, 0));
        let next = tracker.next().cloned().unwrap();
        assert_eq!(next.prayer, PrayerName::Maghrib);
        assert_eq!(tracker.time_of(PrayerName::Maghrib, at(2, 18, 0)), Some(next.at));
        assert!(next.at > at(2, 18, 0));
    }

    #[test]
    fn seed_paints_cached_day() {
        let mut tracker = PrayerTracker::new(false);
        tracker.seed(day(), at(1, 6, 0));
        assert_eq!(tracker.next().unwrap().prayer, PrayerName::Dhuhr);
        assert_eq!(tracker.day().unwrap().zone, "WLY01");
    }
}
