pub mod prayer;

pub use prayer::{PrayerDay, PrayerInstant, PrayerName, PrayerSet, TimeValue};
