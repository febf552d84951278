use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::location::Coordinates;
use crate::models::{PrayerDay, PrayerSet};

pub const DEFAULT_BASE_URL: &str = "https://api.waktusolat.app";

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server answered with status {0}")]
    Status(u16),
    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("response contained no prayer records")]
    NoRecords,
}

/// Fetches one day of prayer times for a coordinate pair.
pub trait PrayerTimeSource: Send + Sync {
    fn fetch(&self, coords: Coordinates, today: NaiveDate) -> Result<PrayerDay, SourceError>;

    fn name(&self) -> &str {
        "PrayerTimeSource"
    }
}

#[derive(Debug, Deserialize)]
pub struct SolatResponse {
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub prayers: Vec<PrayerRecord>,
}

#[derive(Debug, Deserialize)]
pub struct PrayerRecord {
    #[serde(default)]
    pub hijri: Option<String>,
    /// `dd-Mon-yyyy` in the variants that send it.
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub day: Option<u32>,
    #[serde(flatten)]
    pub set: PrayerSet,
}

impl PrayerRecord {
    fn matches(&self, today: NaiveDate) -> bool {
        let today_str = today.format("%d-%b-%Y").to_string();
        self.date.as_deref() == Some(today_str.as_str()) || self.day == Some(today.day())
    }

    fn calendar_date(&self, today: NaiveDate) -> Option<NaiveDate> {
        if let Some(date) = self
            .date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%d-%b-%Y").ok())
        {
            return Some(date);
        }
        self.day
            .and_then(|d| NaiveDate::from_ymd_opt(today.year(), today.month(), d))
    }
}

/// Today's record, or the first one when nothing matches.
pub fn select_record(records: &[PrayerRecord], today: NaiveDate) -> Option<&PrayerRecord> {
    records.iter().find(|r| r.matches(today)).or_else(|| {
        if !records.is_empty() {
            log::warn!("No prayer record matches {}, using the first one", today);
        }
        records.first()
    })
}

pub fn parse_response(body: &str, today: NaiveDate) -> Result<PrayerDay, SourceError> {
    let response: SolatResponse = serde_json::from_str(body)?;
    let record = select_record(&response.prayers, today).ok_or(SourceError::NoRecords)?;

    Ok(PrayerDay {
        zone: response
            .zone
            .filter(|z| !z.is_empty())
            .unwrap_or_else(|| "Detected Location".to_string()),
        hijri: record.hijri.clone(),
        date: record.calendar_date(today),
        set: record.set.clone(),
    })
}

pub struct WaktuSolatClient {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl WaktuSolatClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SourceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn url_for(&self, coords: Coordinates) -> String {
        format!(
            "{}/v2/solat/gps/{}/{}",
            self.base_url, coords.latitude, coords.longitude
        )
    }
}

impl PrayerTimeSource for WaktuSolatClient {
    fn fetch(&self, coords: Coordinates, today: NaiveDate) -> Result<PrayerDay, SourceError> {
        let url = self.url_for(coords);
        log::debug!("Fetching prayer times from {}", url);

        let response = self.client.get(&url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }
        let body = response.text()?;
        parse_response(&body, today)
    }

    fn name(&self) -> &str {
        "waktusolat.app"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PrayerName, TimeValue};
    use crate::prayer_times::engine::{compute_next_prayer, EngineError};
    use chrono::{DateTime, FixedOffset};

    const BODY: &str = r#"{
        "zone": "WLY01",
        "year": 2026,
        "month": "MAR",
        "prayers": [
            {"day": 1, "hijri": "1447-09-11", "imsak": 1772314500, "fajr": 1772315100,
             "syuruk": 1772319720, "dhuhr": 1772342100, "asr": 1772353800,
             "maghrib": 1772364000, "isha": 1772368500},
            {"day": 2, "hijri": "1447-09-12", "imsak": 1772400900, "fajr": 1772401500,
             "syuruk": 1772406120, "dhuhr": 1772428500, "asr": 1772440200,
             "maghrib": 1772450400, "isha": 1772454900}
        ]
    }"#;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn picks_the_record_for_today() {
        let day = parse_response(BODY, date(2)).unwrap();
        assert_eq!(day.zone, "WLY01");
        assert_eq!(day.hijri.as_deref(), Some("1447-09-12"));
        assert_eq!(day.date, Some(date(2)));
        assert_eq!(day.set.maghrib, Some(TimeValue::Absolute(1_772_450_400)));
    }

    #[test]
    fn falls_back_to_first_record() {
        let day = parse_response(BODY, date(20)).unwrap();
        assert_eq!(day.hijri.as_deref(), Some("1447-09-11"));
        assert_eq!(day.set.fajr, Some(TimeValue::Absolute(1_772_315_100)));
    }

    #[test]
    fn matches_formatted_date_variant() {
        let body = r#"{"zone": "JHR02", "prayers": [
            {"date": "28-Feb-2026", "fajr": "05:50:00", "maghrib": "19:22:00"},
            {"date": "01-Mar-2026", "fajr": "05:49:00", "maghrib": "19:22:00"}
        ]}"#;
        let day = parse_response(body, date(1)).unwrap();
        assert_eq!(day.date, Some(date(1)));
        assert_eq!(day.set.fajr, Some(TimeValue::LocalTime("05:49:00".into())));
        assert!(day.set.isha.is_none());
    }

    #[test]
    fn wrongly_typed_fields_are_skipped_not_fatal() {
        let body = r#"{"zone": "WLY01", "prayers": [
            {"day": 1, "fajr": true, "syuruk": 1772319720, "dhuhr": 1772342100,
             "asr": 1772353800.0, "maghrib": 1772364000, "isha": 1772368500}
        ]}"#;
        let day = parse_response(body, date(1)).unwrap();
        assert!(matches!(day.set.fajr, Some(TimeValue::Invalid(_))));
        assert!(matches!(day.set.asr, Some(TimeValue::Invalid(_))));

        // 2026-03-01 16:00 MYT: Asr (16:30) is unusable, so Maghrib comes next.
        let now = DateTime::from_timestamp(1_772_352_000, 0)
            .unwrap()
            .with_timezone(&FixedOffset::east_opt(8 * 3600).unwrap());
        let next = compute_next_prayer(&day.set, now, true).unwrap();
        assert_eq!(next.prayer, PrayerName::Maghrib);
    }

    #[test]
    fn fully_mistyped_record_is_malformed_not_a_fetch_error() {
        let body = r#"{"zone": "WLY01", "prayers": [
            {"day": 1, "fajr": false, "syuruk": [], "dhuhr": {}, "asr": 1.5,
             "maghrib": true, "isha": 0.25}
        ]}"#;
        let day = parse_response(body, date(1)).unwrap();
        let now = DateTime::from_timestamp(1_772_355_600, 0)
            .unwrap()
            .with_timezone(&FixedOffset::east_opt(8 * 3600).unwrap());
        assert_eq!(
            compute_next_prayer(&day.set, now, true),
            Err(EngineError::MalformedPrayerData)
        );
    }

    #[test]
    fn empty_prayers_is_an_error() {
        let err = parse_response(r#"{"zone": "WLY01", "prayers": []}"#, date(1)).unwrap_err();
        assert!(matches!(err, SourceError::NoRecords));
    }

    #[test]
    fn missing_zone_gets_placeholder() {
        let body = r#"{"prayers": [{"day": 1, "fajr": 1772315100}]}"#;
        assert_eq!(parse_response(body, date(1)).unwrap().zone, "Detected Location");
    }

    #[test]
    fn invalid_json_is_a_decode_error() {
        let err = parse_response("<html>502</html>", date(1)).unwrap_err();
        assert!(matches!(err, SourceError::Decode(_)));
    }

    #[test]
    fn builds_gps_url() {
        let client = WaktuSolatClient::new("https://api.waktusolat.app/", Duration::from_secs(5)).unwrap();
        let url = client.url_for(Coordinates { latitude: 3.068498, longitude: 101.630263 });
        assert_eq!(url, "https://api.waktusolat.app/v2/solat/gps/3.068498/101.630263");
    }
}
