use anyhow::Result;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    DefaultTerminal, Frame,
};
use rusqlite::Connection;
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::db::repository::CacheRepo;
use crate::location::{
    Coordinates, LocationError, LocationProvider, LocationResolver, LocationState,
};
use crate::models::{PrayerDay, PrayerName};
use crate::prayer_times::countdown::fast_progress;
use crate::prayer_times::{Countdown, PrayerTimeSource, PrayerTracker, SourceError};
use crate::tui::events::{Event, EventHandler};
use crate::tui::theme;
use crate::tui::widgets::prayers::PrayerCard;
use crate::tui::widgets::{countdown, header, next_prayer, prayers, statusbar};
use crate::utils::hijri::hijri_label;

/// Readings closer than this (degrees) are the same place and need no refetch.
const SAME_PLACE_DEG: f64 = 0.01;

#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Dashboard,
    Help,
}

/// Side effects the run loop performs on the app's behalf.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Locate,
    Fetch(Coordinates),
}

pub struct App {
    pub view: View,
    pub config: AppConfig,
    pub offset: FixedOffset,
    pub should_quit: bool,

    pub now: DateTime<FixedOffset>,
    pub hijri_str: String,
    pub location: LocationState,
    pub tracker: PrayerTracker,
    pub countdown: Countdown,
    pub fetching: bool,
    fetched_for: Option<Coordinates>,
    midnight_refetch_on: Option<NaiveDate>,
}

impl App {
    pub fn new(config: AppConfig, offset: FixedOffset, now: DateTime<FixedOffset>) -> Self {
        let tracker = PrayerTracker::new(config.display.include_syuruk);
        let hijri_str = hijri_label(None, now.date_naive(), config.display.hijri_offset);
        App {
            view: View::Dashboard,
            config,
            offset,
            should_quit: false,
            now,
            hijri_str,
            location: LocationState::default(),
            tracker,
            countdown: Countdown::new(),
            fetching: false,
            fetched_for: None,
            midnight_refetch_on: None,
        }
    }

    pub fn clock(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }

    /// Paint whatever is cached, then ask for fresh data.
    pub fn start(&mut self, conn: &Connection) -> Vec<Action> {
        let today = self.now.date_naive();
        match CacheRepo::get_day(conn, today) {
            Ok(Some(day)) => self.tracker.seed(day, self.now),
            Ok(None) => {}
            Err(e) => log::warn!("Ignoring cached prayer day: {:#}", e),
        }

        let resolver = LocationResolver::new(conn, self.config.location.max_age());
        self.location = LocationState::from_cache(resolver.cached().map(|c| c.coords()));
        self.refresh_derived();

        let mut actions = Vec::new();
        if let Some(coords) = self.location.coords {
            actions.extend(self.fetch_for(coords));
        }
        if resolver.recent(self.now.with_timezone(&Utc)).is_none() {
            actions.push(self.locate());
        }
        actions
    }

    fn locate(&mut self) -> Action {
        self.location.loading = true;
        Action::Locate
    }

    fn fetch_for(&mut self, coords: Coordinates) -> Option<Action> {
        if self.fetching {
            return None;
        }
        self.fetching = true;
        self.fetched_for = Some(coords);
        Some(Action::Fetch(coords))
    }

    fn moved_since_fetch(&self, coords: &Coordinates) -> bool {
        match self.fetched_for {
            Some(prev) => !prev.is_near(coords, SAME_PLACE_DEG),
            None => true,
        }
    }

    pub fn on_located(
        &mut self,
        conn: &Connection,
        reading: Result<Coordinates, LocationError>,
    ) -> Option<Action> {
        let resolver = LocationResolver::new(conn, self.config.location.max_age());
        let resolution = resolver.apply(reading, self.now.with_timezone(&Utc));
        self.location.apply(resolution);

        let coords = self.location.coords?;
        if self.moved_since_fetch(&coords) || self.tracker.day().is_none() {
            self.fetch_for(coords)
        } else {
            None
        }
    }

    pub fn on_fetched(
        &mut self,
        conn: &Connection,
        result: Result<PrayerDay, SourceError>,
    ) -> Option<Action> {
        self.fetching = false;
        let fresh = result.as_ref().ok().cloned();
        self.tracker.on_fetch(result, self.now);

        if let Some(day) = fresh {
            if self.tracker.error().is_none() {
                let today = self.now.date_naive();
                let key = day.date.unwrap_or(today);
                if let Err(e) = CacheRepo::store_day(conn, key, &day)
                    .and_then(|_| CacheRepo::prune_before(conn, today))
                {
                    log::warn!("Could not cache prayer day: {:#}", e);
                }
            }
        }
        self.refresh_derived();

        // The location moved while this fetch was in flight.
        let coords = self.location.coords?;
        if self.moved_since_fetch(&coords) {
            self.fetch_for(coords)
        } else {
            None
        }
    }

    /// 1s cadence: countdown, plus the midnight refetch hook.
    pub fn on_tick(&mut self, now: DateTime<FixedOffset>) -> Option<Action> {
        let new_day = now.date_naive() != self.now.date_naive();
        self.now = now;
        self.countdown.on_tick(now);
        if new_day {
            self.refresh_derived();
        }

        let today = now.date_naive();
        if self.config.display.refetch_at_midnight
            && self.tracker.needs_refetch(now)
            && self.midnight_refetch_on != Some(today)
        {
            let coords = self.location.coords?;
            // A fetch still in flight from yesterday does not count.
            let action = self.fetch_for(coords)?;
            self.midnight_refetch_on = Some(today);
            log::debug!("Date changed to {}, refetching prayer times", today);
            return Some(action);
        }
        None
    }

    /// 60s cadence.
    pub fn on_reevaluate(&mut self, now: DateTime<FixedOffset>) {
        self.now = now;
        self.tracker.reevaluate(now);
        self.refresh_derived();
    }

    fn refresh_derived(&mut self) {
        self.countdown
            .set_target(self.tracker.iftar_at(self.now), self.now);
        self.hijri_str = hijri_label(
            self.tracker.day().and_then(|d| d.hijri.as_deref()),
            self.now.date_naive(),
            self.config.display.hijri_offset,
        );
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Action> {
        // Some terminals also report release and repeat events
        if key.kind != KeyEventKind::Press {
            return None;
        }
        match self.view {
            View::Help => {
                if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
                    self.view = View::Dashboard;
                }
                None
            }
            View::Dashboard => match key.code {
                KeyCode::Esc | KeyCode::Char('q') => {
                    self.should_quit = true;
                    None
                }
                KeyCode::Char('?') => {
                    self.view = View::Help;
                    None
                }
                KeyCode::Char('r') => {
                    let coords = self.location.coords?;
                    self.fetch_for(coords)
                }
                KeyCode::Char('l') if !self.location.loading => Some(self.locate()),
                _ => None,
            },
        }
    }

    pub fn prayer_cards(&self) -> Vec<PrayerCard> {
        let next = self.tracker.next();
        PrayerName::all()
            .into_iter()
            .map(|prayer| {
                let at = self.tracker.time_of(prayer, self.now);
                PrayerCard {
                    prayer,
                    time: at.map(|t| t.time()),
                    is_next: next.map(|n| n.prayer == prayer && !n.next_day).unwrap_or(false),
                    is_past: at.map(|t| t <= self.now).unwrap_or(false),
                }
            })
            .collect()
    }

    pub fn fast_progress(&self) -> Option<f64> {
        let fajr = self.tracker.time_of(PrayerName::Fajr, self.now)?;
        let maghrib = self.tracker.iftar_at(self.now)?;
        fast_progress(fajr, maghrib, self.now)
    }

    pub fn error_message(&self) -> Option<String> {
        if let Some(err) = &self.location.error {
            if self.location.coords.is_none() {
                return Some(err.clone());
            }
        }
        self.tracker.error().map(|e| e.message().to_string())
    }

    fn busy_label(&self) -> Option<&'static str> {
        if self.location.loading {
            Some("Locating")
        } else if self.fetching {
            Some("Fetching prayer times")
        } else {
            None
        }
    }

    pub fn draw(&self, frame: &mut Frame) {
        self.draw_dashboard(frame);
        if self.view == View::Help {
            self.draw_help_overlay(frame);
        }
    }

    fn draw_dashboard(&self, frame: &mut Frame) {
        let area = frame.area();

        // Clear background
        frame.render_widget(Block::default().style(theme::base()), area);

        let error = self.error_message();
        let outer_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5),                                  // header
                Constraint::Length(if error.is_some() { 3 } else { 0 }), // error banner
                Constraint::Length(10),                                 // hero countdown
                Constraint::Min(0),                                     // body
                Constraint::Length(1),                                  // status bar
            ])
            .split(area);

        header::render(
            frame,
            outer_chunks[0],
            &self.hijri_str,
            self.now,
            self.tracker.day().map(|d| d.zone.as_str()),
        );

        if let Some(message) = error {
            let banner = Paragraph::new(Line::from(Span::styled(message, theme::red())))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_type(BorderType::Rounded)
                        .border_style(theme::red())
                        .style(theme::base()),
                );
            frame.render_widget(banner, outer_chunks[1]);
        }

        countdown::render(
            frame,
            outer_chunks[2],
            self.countdown.state(),
            self.countdown.target(),
            self.fast_progress(),
        );

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(outer_chunks[3]);

        if self.tracker.day().is_some() {
            prayers::render(frame, columns[0], &self.prayer_cards());
        }
        next_prayer::render(
            frame,
            columns[1],
            self.tracker.next(),
            self.now,
            self.fetching || self.location.loading,
        );

        statusbar::render(frame, outer_chunks[4], self.busy_label());
    }

    fn draw_help_overlay(&self, frame: &mut Frame) {
        let area = frame.area();

        let popup_area = Rect {
            x: area.width / 4,
            y: area.height / 4,
            width: area.width / 2,
            height: (area.height / 2).min(14),
        };

        frame.render_widget(Clear, popup_area);

        let location = self
            .location
            .coords
            .map(|c| c.to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let help_text = vec![
            Line::from(Span::styled(
                "  Keybindings",
                theme::accent().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(vec![
                Span::styled("  [r]    ", theme::accent()),
                Span::styled("Fetch prayer times again", theme::dim()),
            ]),
            Line::from(vec![
                Span::styled("  [l]    ", theme::accent()),
                Span::styled("Look up location again", theme::dim()),
            ]),
            Line::from(vec![
                Span::styled("  [?]    ", theme::accent()),
                Span::styled("Toggle help", theme::dim()),
            ]),
            Line::from(vec![
                Span::styled("  [Esc]  ", theme::accent()),
                Span::styled("Quit", theme::dim()),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::styled("  Location  ", theme::dim()),
                Span::styled(location, theme::bold()),
            ]),
        ];

        let block = Block::default()
            .title(Span::styled(" Help ", theme::accent()))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::accent())
            .style(theme::surface());

        let paragraph = Paragraph::new(help_text).block(block);
        frame.render_widget(paragraph, popup_area);
    }
}

struct Services {
    provider: Arc<dyn LocationProvider>,
    source: Arc<dyn PrayerTimeSource>,
}

impl Services {
    fn dispatch(&self, events: &EventHandler, action: Action, today: NaiveDate) {
        match action {
            Action::Locate => events.spawn_locate(Arc::clone(&self.provider)),
            Action::Fetch(coords) => events.spawn_fetch(Arc::clone(&self.source), coords, today),
        }
    }
}

/// Run the TUI event loop.
pub fn run(
    conn: Connection,
    config: AppConfig,
    provider: Arc<dyn LocationProvider>,
    source: Arc<dyn PrayerTimeSource>,
) -> Result<()> {
    let offset = config.display.offset()?;
    let now = config.display.now()?;
    let mut app = App::new(config, offset, now);
    let services = Services { provider, source };

    let mut terminal = ratatui::init();
    let events = EventHandler::new(Duration::from_secs(1), Duration::from_secs(60));

    for action in app.start(&conn) {
        services.dispatch(&events, action, app.now.date_naive());
    }

    let result = event_loop(&mut terminal, &mut app, &events, &services, &conn);

    // Stop timers before giving the terminal back.
    drop(events);
    ratatui::restore();
    result
}

fn event_loop(
    terminal: &mut DefaultTerminal,
    app: &mut App,
    events: &EventHandler,
    services: &Services,
    conn: &Connection,
) -> Result<()> {
    loop {
        terminal.draw(|frame| app.draw(frame))?;

        let action = match events.next()? {
            Event::Key(key) => {
                let action = app.handle_key(key);
                if app.should_quit {
                    return Ok(());
                }
                action
            }
            Event::Tick => app.on_tick(app.clock()),
            Event::Reevaluate => {
                app.on_reevaluate(app.clock());
                None
            }
            Event::Located(reading) => app.on_located(conn, reading),
            Event::Fetched(result) => {
                app.now = app.clock();
                app.on_fetched(conn, result)
            }
        };

        if let Some(action) = action {
            services.dispatch(events, action, app.now.date_naive());
        }
    }
}
