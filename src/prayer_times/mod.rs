pub mod countdown;
pub mod engine;
pub mod source;
pub mod tracker;

pub use countdown::{Countdown, CountdownState};
pub use engine::{compute_next_prayer, EngineError};
pub use source::{PrayerTimeSource, SourceError, WaktuSolatClient};
pub use tracker::{PrayerTracker, TrackerError};
