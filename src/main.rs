mod cli;
mod config;
mod db;
mod location;
mod models;
mod prayer_times;
mod tui;
mod utils;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use rusqlite::Connection;
use std::sync::Arc;

use cli::args::{Cli, Commands};
use cli::handlers;
use config::AppConfig;
use db::migrations::run_migrations;
use location::{
    Coordinates, FixedLocation, IpLocator, LocationProvider, LocationResolver, NoLocation,
};
use prayer_times::{PrayerTimeSource, WaktuSolatClient};

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = AppConfig::load().context("Loading config")?;

    // First run: leave an editable config behind
    if !AppConfig::config_path()?.exists() {
        if let Err(e) = config.save() {
            log::warn!("Could not write default config: {:#}", e);
        }
    }

    // Ensure data directory exists and open DB
    AppConfig::ensure_data_dir()?;
    let db_path = AppConfig::db_path()?;
    let conn = Connection::open(&db_path)
        .with_context(|| format!("Opening database at {:?}", db_path))?;

    // Enable WAL mode for better concurrent access
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;

    // Run migrations on every startup
    run_migrations(&conn)?;

    let fixed = config.location.fixed()?;
    let provider = location_provider(&config, fixed)?;
    let source: Arc<dyn PrayerTimeSource> = Arc::new(
        WaktuSolatClient::new(&config.api.base_url, config.api.timeout())
            .context("Building prayer time client")?,
    );

    match cli.command {
        Some(Commands::Times { lat, lon }) => {
            let pinned = match (lat, lon) {
                (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)?),
                _ => fixed,
            };
            handlers::handle_times(&conn, &config, pinned, provider.as_ref(), source.as_ref())?;
        }
        Some(Commands::Location { action }) => {
            handlers::handle_location(&conn, &config, &action)?;
        }

        // No subcommand → launch TUI
        None => {
            if let Some(coords) = fixed {
                LocationResolver::new(&conn, config.location.max_age())
                    .remember(coords, Utc::now())?;
            }
            tui::app::run(conn, config, provider, source)
                .context("The dashboard stopped unexpectedly. Please restart iftar")?;
        }
    }

    Ok(())
}

/// Pinned coordinates win, then the network lookup if enabled.
fn location_provider(
    config: &AppConfig,
    fixed: Option<Coordinates>,
) -> Result<Arc<dyn LocationProvider>> {
    if let Some(coords) = fixed {
        return Ok(Arc::new(FixedLocation(coords)));
    }
    if !config.location.lookup_enabled {
        return Ok(Arc::new(NoLocation));
    }
    let locator = IpLocator::new(&config.location.lookup_url, config.location.timeout())
        .context("Building location client")?;
    Ok(Arc::new(locator))
}
