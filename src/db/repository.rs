use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::PrayerDay;

// ─── Cached prayer days ─────────────────────────────────────────────────────

pub struct CacheRepo;

impl CacheRepo {
    pub fn get_day(conn: &Connection, date: NaiveDate) -> Result<Option<PrayerDay>> {
        let payload: Option<String> = conn
            .query_row(
                "SELECT payload FROM prayer_day_cache WHERE date = ?1",
                params![date.format("%Y-%m-%d").to_string()],
                |row| row.get(0),
            )
            .optional()?;

        match payload {
            None => Ok(None),
            Some(json) => {
                let day = serde_json::from_str(&json)
                    .with_context(|| format!("Decoding cached prayer day {}", date))?;
                Ok(Some(day))
            }
        }
    }

    pub fn store_day(conn: &Connection, date: NaiveDate, day: &PrayerDay) -> Result<()> {
        let payload = serde_json::to_string(day).context("Encoding prayer day")?;
        conn.execute(
            "INSERT OR REPLACE INTO prayer_day_cache (date, zone, payload, fetched_at)
             VALUES (?1, ?2, ?3, datetime('now'))",
            params![date.format("%Y-%m-%d").to_string(), day.zone, payload],
        )?;
        Ok(())
    }

    /// Drop every cached day older than `keep_from`.
    pub fn prune_before(conn: &Connection, keep_from: NaiveDate) -> Result<usize> {
        let removed = conn.execute(
            "DELETE FROM prayer_day_cache WHERE date < ?1",
            params![keep_from.format("%Y-%m-%d").to_string()],
        )?;
        Ok(removed)
    }

    pub fn clear_all(conn: &Connection) -> Result<()> {
        conn.execute("DELETE FROM prayer_day_cache", [])?;
        Ok(())
    }
}

// ─── Meta repo ──────────────────────────────────────────────────────────────

pub struct MetaRepo;

impl MetaRepo {
    pub fn get(conn: &Connection, key: &str) -> Result<Option<String>> {
        conn.query_row(
            "SELECT value FROM app_meta WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .map_err(anyhow::Error::from)
    }

    pub fn set(conn: &Connection, key: &str, value: &str) -> Result<()> {
        conn.execute(
            "INSERT INTO app_meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn delete(conn: &Connection, key: &str) -> Result<()> {
        conn.execute("DELETE FROM app_meta WHERE key = ?1", params![key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::models::{PrayerSet, TimeValue};

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn day(zone: &str) -> PrayerDay {
        PrayerDay {
            zone: zone.to_string(),
            hijri: Some("1447-09-11".to_string()),
            date: NaiveDate::from_ymd_opt(2026, 3, 1),
            set: PrayerSet {
                fajr: Some(TimeValue::Absolute(1_772_315_100)),
                maghrib: Some(TimeValue::LocalTime("19:20".to_string())),
                ..Default::default()
            },
        }
    }

    #[test]
    fn cached_day_survives_a_round_trip() {
        let conn = conn();
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert!(CacheRepo::get_day(&conn, date).unwrap().is_none());

        CacheRepo::store_day(&conn, date, &day("WLY01")).unwrap();
        CacheRepo::store_day(&conn, date, &day("SGR01")).unwrap();
        assert_eq!(CacheRepo::get_day(&conn, date).unwrap(), Some(day("SGR01")));
    }

    #[test]
    fn prune_keeps_recent_days() {
        let conn = conn();
        let d = |n| NaiveDate::from_ymd_opt(2026, 3, n).unwrap();
        for n in 1..=3 {
            CacheRepo::store_day(&conn, d(n), &day("WLY01")).unwrap();
        }
        assert_eq!(CacheRepo::prune_before(&conn, d(3)).unwrap(), 2);
        assert!(CacheRepo::get_day(&conn, d(2)).unwrap().is_none());
        assert!(CacheRepo::get_day(&conn, d(3)).unwrap().is_some());
    }

    #[test]
    fn meta_set_overwrites_and_delete_removes() {
        let conn = conn();
        MetaRepo::set(&conn, "k", "1").unwrap();
        MetaRepo::set(&conn, "k", "2").unwrap();
        assert_eq!(MetaRepo::get(&conn, "k").unwrap().as_deref(), Some("2"));
        MetaRepo::delete(&conn, "k").unwrap();
        assert!(MetaRepo::get(&conn, "k").unwrap().is_none());
    }
}
