use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use crossterm::event::{self, Event as CEvent, KeyEvent};

use crate::location::{Coordinates, LocationError, LocationProvider};
use crate::models::PrayerDay;
use crate::prayer_times::{PrayerTimeSource, SourceError};

/// Longest the pump blocks in `poll`, so a stop request is noticed quickly.
const MAX_POLL: Duration = Duration::from_millis(250);

#[derive(Debug)]
pub enum Event {
    Key(KeyEvent),
    /// Countdown cadence.
    Tick,
    /// Next-prayer re-evaluation cadence.
    Reevaluate,
    Located(Result<Coordinates, LocationError>),
    Fetched(Result<PrayerDay, SourceError>),
}

/// Fixed-period timer driven by the pump loop.
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    period: Duration,
    last: Instant,
}

impl Timer {
    pub fn new(period: Duration, now: Instant) -> Self {
        Self { period, last: now }
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.period
            .checked_sub(now.saturating_duration_since(self.last))
            .unwrap_or(Duration::ZERO)
    }

    /// True once per elapsed period; rearms from `now`.
    pub fn fire(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last) >= self.period {
            self.last = now;
            true
        } else {
            false
        }
    }
}

/// Owns the two timers and the input poller. Dropping it stops them; worker
/// results that arrive afterwards are discarded with the closed channel.
pub struct EventHandler {
    tx: mpsc::Sender<Event>,
    rx: mpsc::Receiver<Event>,
    stop: Arc<AtomicBool>,
    pump: Option<JoinHandle<()>>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration, reevaluate_every: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        let stop = Arc::new(AtomicBool::new(false));

        let pump_tx = tx.clone();
        let pump_stop = Arc::clone(&stop);
        let pump = thread::spawn(move || {
            let start = Instant::now();
            let mut tick = Timer::new(tick_rate, start);
            let mut reevaluate = Timer::new(reevaluate_every, start);

            while !pump_stop.load(Ordering::Relaxed) {
                let now = Instant::now();
                let timeout = tick
                    .remaining(now)
                    .min(reevaluate.remaining(now))
                    .min(MAX_POLL);

                if event::poll(timeout).unwrap_or(false) {
                    match event::read() {
                        Ok(CEvent::Key(key)) => {
                            if pump_tx.send(Event::Key(key)).is_err() {
                                break;
                            }
                        }
                        Ok(_) => {}
                        Err(_) => break,
                    }
                }

                let now = Instant::now();
                if tick.fire(now) && pump_tx.send(Event::Tick).is_err() {
                    break;
                }
                if reevaluate.fire(now) && pump_tx.send(Event::Reevaluate).is_err() {
                    break;
                }
            }
        });

        Self {
            tx,
            rx,
            stop,
            pump: Some(pump),
        }
    }

    pub fn next(&self) -> Result<Event, mpsc::RecvError> {
        self.rx.recv()
    }

    /// Live location reading on a worker thread.
    pub fn spawn_locate(&self, provider: Arc<dyn LocationProvider>) {
        let tx = self.tx.clone();
        thread::spawn(move || {
            let reading = provider.locate();
            // Receiver gone means the view was torn down.
            let _ = tx.send(Event::Located(reading));
        });
    }

    /// Prayer time fetch on a worker thread.
    pub fn spawn_fetch(
        &self,
        source: Arc<dyn PrayerTimeSource>,
        coords: Coordinates,
        today: NaiveDate,
    ) {
        let tx = self.tx.clone();
        thread::spawn(move || {
            let result = source.fetch(coords, today);
            let _ = tx.send(Event::Fetched(result));
        });
    }
}

impl Drop for EventHandler {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(pump) = self.pump.take() {
            let _ = pump.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_fires_once_per_period() {
        let t0 = Instant::now();
        let mut timer = Timer::new(Duration::from_secs(1), t0);

        assert!(!timer.fire(t0 + Duration::from_millis(999)));
        assert!(timer.fire(t0 + Duration::from_millis(1_000)));
        assert!(!timer.fire(t0 + Duration::from_millis(1_500)));
        assert!(timer.fire(t0 + Duration::from_millis(2_100)));
    }

    #[test]
    fn remaining_counts_down_to_zero() {
        let t0 = Instant::now();
        let timer = Timer::new(Duration::from_secs(60), t0);
        assert_eq!(timer.remaining(t0), Duration::from_secs(60));
        assert_eq!(timer.remaining(t0 + Duration::from_secs(45)), Duration::from_secs(15));
        assert_eq!(timer.remaining(t0 + Duration::from_secs(90)), Duration::ZERO);
    }
}
