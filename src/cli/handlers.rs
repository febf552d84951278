use anyhow::{anyhow, Result};
use chrono::{NaiveDate, Utc};
use rusqlite::Connection;

use crate::cli::args::LocationCommands;
use crate::config::AppConfig;
use crate::db::repository::CacheRepo;
use crate::location::{Coordinates, LocationProvider, LocationResolver, Resolution};
use crate::models::{PrayerDay, PrayerName};
use crate::prayer_times::countdown::tick;
use crate::prayer_times::{PrayerTimeSource, PrayerTracker, TrackerError};
use crate::utils::format::{format_countdown, format_duration_secs, format_time_12h, meridiem};
use crate::utils::hijri::hijri_label;

// ─── ANSI helpers ────────────────────────────────────────────────────────────

macro_rules! println_colored {
    ($color:expr, $($arg:tt)*) => {{
        print!("{}", $color);
        print!($($arg)*);
        println!("\x1b[0m");
    }};
}

const GREEN: &str = "\x1b[32m";
const AMBER: &str = "\x1b[33m";
const DIM: &str = "\x1b[2m";
const BOLD: &str = "\x1b[1m";
const EMERALD: &str = "\x1b[38;2;52;211;153m";

// ─── Times ───────────────────────────────────────────────────────────────────

/// Today's record for `coords`, falling back to the cached copy when the
/// source is unreachable. The flag is true when the cache was used.
pub fn load_day(
    conn: &Connection,
    source: &dyn PrayerTimeSource,
    coords: Coordinates,
    today: NaiveDate,
) -> Result<(PrayerDay, bool)> {
    match source.fetch(coords, today) {
        Ok(day) => {
            let key = day.date.unwrap_or(today);
            if let Err(e) = CacheRepo::store_day(conn, key, &day)
                .and_then(|_| CacheRepo::prune_before(conn, today))
            {
                log::warn!("Could not cache prayer day: {:#}", e);
            }
            Ok((day, false))
        }
        Err(err) => {
            log::error!("{} fetch failed: {}", source.name(), err);
            CacheRepo::get_day(conn, today)?
                .map(|day| (day, true))
                .ok_or_else(|| anyhow!(TrackerError::FetchFailed.message()))
        }
    }
}

pub fn handle_times(
    conn: &Connection,
    config: &AppConfig,
    pinned: Option<Coordinates>,
    provider: &dyn LocationProvider,
    source: &dyn PrayerTimeSource,
) -> Result<()> {
    let now = config.display.now()?;
    let today = now.date_naive();

    let coords = match pinned {
        Some(c) => c,
        None => {
            let resolver = LocationResolver::new(conn, config.location.max_age());
            match resolver.resolve(provider, now.with_timezone(&Utc)) {
                Resolution::Fresh(c) | Resolution::Cached(c) => c,
                Resolution::Unavailable(err) => return Err(anyhow!(err)),
            }
        }
    };

    let (day, from_cache) = load_day(conn, source, coords, today)?;
    let hijri = hijri_label(day.hijri.as_deref(), today, config.display.hijri_offset);

    let mut tracker = PrayerTracker::new(config.display.include_syuruk);
    tracker.seed(day, now);
    let Some(next) = tracker.next().cloned() else {
        return Err(anyhow!(TrackerError::MalformedData.message()));
    };

    println!();
    println_colored!(
        EMERALD,
        "  Prayer Times · {} ({})",
        tracker.day().map(|d| d.zone.as_str()).unwrap_or("Detected Location"),
        today.format("%d %b %Y")
    );
    println_colored!(DIM, "  {}", hijri);
    if from_cache {
        println_colored!(AMBER, "  Offline: showing cached times");
    }
    println!();

    for prayer in PrayerName::all() {
        let Some(at) = tracker.time_of(prayer, now) else {
            println_colored!(DIM, "  {:<10}  --:--", prayer.display_name());
            continue;
        };
        let t = at.time();
        let time_str = format!("{:>5} {}", format_time_12h(t), meridiem(t));
        if prayer == next.prayer && !next.next_day {
            println_colored!(GREEN, "  {:<10}  {}  ◀ next", prayer.display_name(), time_str);
        } else if at <= now {
            println_colored!(DIM, "  {:<10}  {}", prayer.display_name(), time_str);
        } else {
            println_colored!(BOLD, "  {:<10}  {}", prayer.display_name(), time_str);
        }
    }

    println!();
    println_colored!(
        AMBER,
        "  Next: {} in {}",
        next.label(),
        format_duration_secs((next.at - now).num_seconds())
    );

    if let Some(iftar) = tracker.iftar_at(now) {
        let state = tick(iftar, now);
        if state.arrived {
            println_colored!(EMERALD, "  Iftar time has arrived");
        } else {
            println_colored!(EMERALD, "  Iftar in {}", format_countdown(&state));
        }
    }
    println!();
    Ok(())
}

// ─── Location ────────────────────────────────────────────────────────────────

pub fn handle_location(conn: &Connection, config: &AppConfig, action: &LocationCommands) -> Result<()> {
    let resolver = LocationResolver::new(conn, config.location.max_age());
    match action {
        LocationCommands::Show => match resolver.cached() {
            Some(cached) => {
                let age = (Utc::now() - cached.recorded_at).num_seconds();
                let freshness = if age <= config.location.max_age().num_seconds() {
                    "fresh"
                } else {
                    "stale"
                };
                println_colored!(BOLD, "  {}", cached.coords());
                println_colored!(
                    DIM,
                    "  recorded {} ago ({})",
                    format_duration_secs(age),
                    freshness
                );
            }
            None => println_colored!(DIM, "  No location remembered yet."),
        },
        LocationCommands::Set { latitude, longitude } => {
            let coords = Coordinates::new(*latitude, *longitude)?;
            resolver.remember(coords, Utc::now())?;
            // Cached days belong to the old zone.
            CacheRepo::clear_all(conn)?;
            println_colored!(GREEN, "  ✓ Location set to {}", coords);
        }
        LocationCommands::Clear => {
            resolver.forget()?;
            CacheRepo::clear_all(conn)?;
            println_colored!(GREEN, "  ✓ Location and cached prayer times cleared");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::models::{PrayerSet, TimeValue};
    use crate::prayer_times::SourceError;

    const KL: Coordinates = Coordinates { latitude: 3.1478, longitude: 101.6953 };

    struct StubSource(Option<PrayerDay>);

    impl PrayerTimeSource for StubSource {
        fn fetch(&self, _: Coordinates, _: NaiveDate) -> Result<PrayerDay, SourceError> {
            self.0.clone().ok_or(SourceError::Status(503))
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    fn day() -> PrayerDay {
        PrayerDay {
            zone: "WLY01".to_string(),
            hijri: None,
            date: Some(today()),
            set: PrayerSet {
                maghrib: Some(TimeValue::LocalTime("19:20".to_string())),
                ..PrayerSet::default()
            },
        }
    }

    #[test]
    fn fresh_fetch_is_cached() {
        let conn = conn();
        let (loaded, from_cache) = load_day(&conn, &StubSource(Some(day())), KL, today()).unwrap();
        assert!(!from_cache);
        assert_eq!(loaded, day());
        assert_eq!(CacheRepo::get_day(&conn, today()).unwrap(), Some(day()));
    }

    #[test]
    fn failed_fetch_falls_back_to_cache() {
        let conn = conn();
        CacheRepo::store_day(&conn, today(), &day()).unwrap();
        let (loaded, from_cache) = load_day(&conn, &StubSource(None), KL, today()).unwrap();
        assert!(from_cache);
        assert_eq!(loaded.zone, "WLY01");
    }

    #[test]
    fn failed_fetch_without_cache_reports_failure() {
        let conn = conn();
        let err = load_day(&conn, &StubSource(None), KL, today()).unwrap_err();
        assert_eq!(err.to_string(), "Failed to fetch prayer times. Please try again.");
    }

    #[test]
    fn setting_location_drops_cached_days() {
        let conn = conn();
        let config = AppConfig::default();
        CacheRepo::store_day(&conn, today(), &day()).unwrap();

        let set = LocationCommands::Set { latitude: 1.4927, longitude: 103.7414 };
        handle_location(&conn, &config, &set).unwrap();

        let resolver = LocationResolver::new(&conn, config.location.max_age());
        assert_eq!(resolver.cached().unwrap().latitude, 1.4927);
        assert!(CacheRepo::get_day(&conn, today()).unwrap().is_none());

        handle_location(&conn, &config, &LocationCommands::Clear).unwrap();
        assert!(resolver.cached().is_none());
    }

    #[test]
    fn setting_invalid_location_fails() {
        let conn = conn();
        let set = LocationCommands::Set { latitude: 95.0, longitude: 0.0 };
        assert!(handle_location(&conn, &AppConfig::default(), &set).is_err());
    }
}
