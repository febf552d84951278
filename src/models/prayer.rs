use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrayerName {
    Fajr,
    Syuruk,
    Dhuhr,
    Asr,
    Maghrib,
    Isha,
}

impl PrayerName {
    pub fn all() -> [PrayerName; 6] {
        [
            PrayerName::Fajr,
            PrayerName::Syuruk,
            PrayerName::Dhuhr,
            PrayerName::Asr,
            PrayerName::Maghrib,
            PrayerName::Isha,
        ]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PrayerName::Fajr => "Fajr",
            PrayerName::Syuruk => "Syuruk",
            PrayerName::Dhuhr => "Dhuhr",
            PrayerName::Asr => "Asr",
            PrayerName::Maghrib => "Maghrib",
            PrayerName::Isha => "Isha",
        }
    }
}

impl std::fmt::Display for PrayerName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A prayer time as delivered by the source: either an absolute instant
/// (epoch seconds) or a local "HH:MM[:SS]" string that still needs a date.
/// Anything else is kept as `Invalid` so one bad field never fails the
/// whole payload; it simply never resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeValue {
    Absolute(i64),
    LocalTime(String),
    Invalid(serde_json::Value),
}

impl TimeValue {
    /// Resolve against `date` in `offset`. `None` if the value cannot be
    /// turned into an instant.
    pub fn resolve(&self, date: NaiveDate, offset: &FixedOffset) -> Option<DateTime<FixedOffset>> {
        match self {
            TimeValue::Absolute(secs) => {
                DateTime::from_timestamp(*secs, 0).map(|utc| utc.with_timezone(offset))
            }
            TimeValue::LocalTime(s) => {
                let time = parse_time_of_day(s)?;
                offset.from_local_datetime(&date.and_time(time)).single()
            }
            TimeValue::Invalid(_) => None,
        }
    }

    /// Local time-of-day of this value in `offset`.
    pub fn time_of_day(&self, offset: &FixedOffset) -> Option<NaiveTime> {
        match self {
            TimeValue::Absolute(secs) => {
                DateTime::from_timestamp(*secs, 0).map(|utc| utc.with_timezone(offset).time())
            }
            TimeValue::LocalTime(s) => parse_time_of_day(s),
            TimeValue::Invalid(_) => None,
        }
    }
}

fn parse_time_of_day(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}

/// One day's six prayer values. Fields may be missing in a broken payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrayerSet {
    #[serde(default)]
    pub fajr: Option<TimeValue>,
    #[serde(default)]
    pub syuruk: Option<TimeValue>,
    #[serde(default)]
    pub dhuhr: Option<TimeValue>,
    #[serde(default)]
    pub asr: Option<TimeValue>,
    #[serde(default)]
    pub maghrib: Option<TimeValue>,
    #[serde(default)]
    pub isha: Option<TimeValue>,
}

impl PrayerSet {
    pub fn get(&self, prayer: PrayerName) -> Option<&TimeValue> {
        match prayer {
            PrayerName::Fajr => self.fajr.as_ref(),
            PrayerName::Syuruk => self.syuruk.as_ref(),
            PrayerName::Dhuhr => self.dhuhr.as_ref(),
            PrayerName::Asr => self.asr.as_ref(),
            PrayerName::Maghrib => self.maghrib.as_ref(),
            PrayerName::Isha => self.isha.as_ref(),
        }
    }

    pub fn entries(&self) -> [(PrayerName, Option<&TimeValue>); 6] {
        PrayerName::all().map(|p| (p, self.get(p)))
    }
}

/// The result of one successful fetch: a PrayerSet plus its labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrayerDay {
    pub zone: String,
    pub hijri: Option<String>,
    pub date: Option<NaiveDate>,
    pub set: PrayerSet,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrayerInstant {
    pub prayer: PrayerName,
    /// Synthetic "Fajr (Tomorrow)" produced by the midnight rollover.
    pub next_day: bool,
    pub at: DateTime<FixedOffset>,
}

impl PrayerInstant {
    pub fn label(&self) -> String {
        if self.next_day {
            format!("{} (Tomorrow)", self.prayer.display_name())
        } else {
            self.prayer.display_name().to_string()
        }
    }
}
