use chrono::{DateTime, FixedOffset};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CountdownState {
    pub hours: u64,
    pub minutes: u8,
    pub seconds: u8,
    pub arrived: bool,
}

impl CountdownState {
    pub const ARRIVED: CountdownState = CountdownState {
        hours: 0,
        minutes: 0,
        seconds: 0,
        arrived: true,
    };
}

/// Time left until `target`. A partial second still counts as a second, so
/// 00:00:00 only ever shows together with `arrived`.
pub fn tick(target: DateTime<FixedOffset>, now: DateTime<FixedOffset>) -> CountdownState {
    let millis = (target - now).num_milliseconds();
    if millis <= 0 {
        return CountdownState::ARRIVED;
    }

    let delta = (millis as u64).div_ceil(1000);
    CountdownState {
        hours: delta / 3600,
        minutes: ((delta / 60) % 60) as u8,
        seconds: (delta % 60) as u8,
        arrived: false,
    }
}

/// Elapsed share of the fast (Fajr to Maghrib), clamped to `0.0..=1.0`.
pub fn fast_progress(
    fajr: DateTime<FixedOffset>,
    maghrib: DateTime<FixedOffset>,
    now: DateTime<FixedOffset>,
) -> Option<f64> {
    let total = (maghrib - fajr).num_seconds();
    if total <= 0 {
        return None;
    }
    let elapsed = (now - fajr).num_seconds();
    Some((elapsed as f64 / total as f64).clamp(0.0, 1.0))
}

/// Drives [`tick`] for one target at a time.
///
/// Counting → Arrived is one-way; only a new target starts counting again.
#[derive(Debug, Default)]
pub struct Countdown {
    target: Option<DateTime<FixedOffset>>,
    state: Option<CountdownState>,
}

impl Countdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the target and recompute right away. Returns `false` when the
    /// target is unchanged, in which case the running state is left alone.
    pub fn set_target(
        &mut self,
        target: Option<DateTime<FixedOffset>>,
        now: DateTime<FixedOffset>,
    ) -> bool {
        if target == self.target {
            return false;
        }
        self.target = target;
        self.state = target.map(|t| tick(t, now));
        true
    }

    /// One step of the 1s cadence. Returns whether the state was updated.
    pub fn on_tick(&mut self, now: DateTime<FixedOffset>) -> bool {
        if !self.is_running() {
            return false;
        }
        let Some(target) = self.target else {
            return false;
        };
        self.state = Some(tick(target, now));
        true
    }

    pub fn is_running(&self) -> bool {
        self.target.is_some() && !self.state.map(|s| s.arrived).unwrap_or(false)
    }

    pub fn target(&self) -> Option<DateTime<FixedOffset>> {
        self.target
    }

    pub fn state(&self) -> Option<CountdownState> {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(h: u32, m: u32, s: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(8 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 3, 1, h, m, s)
            .unwrap()
    }

    #[test]
    fn one_second_before_iftar() {
        let state = tick(at(19, 20, 0), at(19, 19, 59));
        assert_eq!(
            state,
            CountdownState { hours: 0, minutes: 0, seconds: 1, arrived: false }
        );
    }

    #[test]
    fn past_target_is_pinned_at_zero() {
        assert_eq!(tick(at(19, 20, 0), at(19, 20, 1)), CountdownState::ARRIVED);
        assert_eq!(tick(at(19, 20, 0), at(19, 20, 0)), CountdownState::ARRIVED);
        assert_eq!(tick(at(19, 20, 0), at(23, 0, 0)), CountdownState::ARRIVED);
    }

    #[test]
    fn decomposes_hours_minutes_seconds() {
        let state = tick(at(19, 20, 0), at(5, 45, 30));
        assert_eq!(state.hours, 13);
        assert_eq!(state.minutes, 34);
        assert_eq!(state.seconds, 30);
    }

    #[test]
    fn hours_are_unbounded() {
        let now = at(12, 0, 0);
        let state = tick(now + Duration::hours(50), now);
        assert_eq!(state.hours, 50);
        assert_eq!((state.minutes, state.seconds), (0, 0));
    }

    #[test]
    fn partial_second_never_shows_zero_early() {
        let now = at(19, 19, 59) + Duration::milliseconds(400);
        let state = tick(at(19, 20, 0), now);
        assert!(!state.arrived);
        assert_eq!(state.seconds, 1);
    }

    #[test]
    fn minutes_and_seconds_stay_in_range() {
        let target = at(23, 59, 59);
        for offset in (0..86_400).step_by(97) {
            let now = at(0, 0, 0) + Duration::seconds(offset);
            let state = tick(target, now);
            assert!(state.minutes < 60 && state.seconds < 60);
            assert_eq!(state.arrived, now >= target);
        }
    }

    #[test]
    fn fast_progress_spans_fajr_to_maghrib() {
        let (fajr, maghrib) = (at(6, 0, 0), at(19, 0, 0));
        assert_eq!(fast_progress(fajr, maghrib, at(5, 0, 0)), Some(0.0));
        assert_eq!(fast_progress(fajr, maghrib, at(12, 30, 0)), Some(0.5));
        assert_eq!(fast_progress(fajr, maghrib, at(20, 0, 0)), Some(1.0));
        assert_eq!(fast_progress(maghrib, fajr, at(12, 0, 0)), None);
    }

    #[test]
    fn driver_stops_once_arrived() {
        let mut countdown = Countdown::new();
        assert!(countdown.set_target(Some(at(19, 20, 0)), at(19, 19, 58)));
        assert!(countdown.is_running());

        assert!(countdown.on_tick(at(19, 19, 59)));
        assert_eq!(countdown.state().unwrap().seconds, 1);

        assert!(countdown.on_tick(at(19, 20, 1)));
        assert!(countdown.state().unwrap().arrived);
        assert!(!countdown.is_running());

        // Clock going backwards does not revive the countdown.
        assert!(!countdown.on_tick(at(19, 0, 0)));
        assert!(countdown.state().unwrap().arrived);
    }

    #[test]
    fn new_target_resets_immediately() {
        let mut countdown = Countdown::new();
        countdown.set_target(Some(at(19, 20, 0)), at(19, 21, 0));
        assert!(countdown.state().unwrap().arrived);

        let tomorrow = at(19, 21, 0) + Duration::days(1);
        assert!(countdown.set_target(Some(tomorrow), at(19, 21, 0)));
        let state = countdown.state().unwrap();
        assert!(!state.arrived);
        assert_eq!(state.hours, 24);
    }

    #[test]
    fn same_target_does_not_reset() {
        let mut countdown = Countdown::new();
        countdown.set_target(Some(at(19, 20, 0)), at(19, 0, 0));
        countdown.on_tick(at(19, 10, 0));
        assert!(!countdown.set_target(Some(at(19, 20, 0)), at(19, 0, 0)));
        assert_eq!(countdown.state().unwrap().minutes, 10);
    }

    #[test]
    fn past_target_starts_arrived() {
        let mut countdown = Countdown::new();
        countdown.set_target(Some(at(19, 20, 0)), at(20, 0, 0));
        assert!(!countdown.is_running());
        assert_eq!(countdown.state(), Some(CountdownState::ARRIVED));
    }

    #[test]
    fn clearing_target_idles() {
        let mut countdown = Countdown::new();
        countdown.set_target(Some(at(19, 20, 0)), at(19, 0, 0));
        countdown.set_target(None, at(19, 0, 0));
        assert!(countdown.state().is_none());
        assert!(!countdown.on_tick(at(19, 1, 0)));
    }
}
