use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, FixedOffset, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::location::{provider::DEFAULT_LOOKUP_URL, Coordinates};
use crate::prayer_times::source::DEFAULT_BASE_URL;

fn default_lookup_url() -> String {
    DEFAULT_LOOKUP_URL.to_string()
}
fn default_lookup_timeout() -> u64 {
    30
}
fn default_max_age() -> u64 {
    300
}
fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_api_timeout() -> u64 {
    15
}
fn default_timezone_offset() -> i32 {
    480
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Pin the location instead of looking it up. Both must be set.
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default = "default_true")]
    pub lookup_enabled: bool,
    #[serde(default = "default_lookup_url")]
    pub lookup_url: String,
    #[serde(default = "default_lookup_timeout")]
    pub timeout_secs: u64,
    /// A cached reading younger than this is reused without a lookup.
    #[serde(default = "default_max_age")]
    pub max_age_secs: u64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            latitude: None,
            longitude: None,
            lookup_enabled: true,
            lookup_url: default_lookup_url(),
            timeout_secs: default_lookup_timeout(),
            max_age_secs: default_max_age(),
        }
    }
}

impl LocationConfig {
    pub fn fixed(&self) -> Result<Option<Coordinates>> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Coordinates::new(lat, lon).map(Some),
            (None, None) => Ok(None),
            _ => Err(anyhow!("Set both latitude and longitude under [location], or neither")),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Out-of-range values fall back to the default.
    pub fn max_age(&self) -> chrono::Duration {
        i64::try_from(self.max_age_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or_else(|| {
                log::warn!("location.max_age_secs = {} is too large, using the default", self.max_age_secs);
                chrono::Duration::seconds(default_max_age() as i64)
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_api_timeout")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_api_timeout(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Whether Syuruk counts as a "next prayer" candidate.
    #[serde(default = "default_true")]
    pub include_syuruk: bool,
    #[serde(default = "default_timezone_offset")]
    pub timezone_offset: i32, // minutes from UTC
    /// Days added to the locally computed Hijri date when the API sends none.
    #[serde(default)]
    pub hijri_offset: i32,
    #[serde(default = "default_true")]
    pub refetch_at_midnight: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            include_syuruk: true,
            timezone_offset: default_timezone_offset(),
            hijri_offset: 0,
            refetch_at_midnight: true,
        }
    }
}

impl DisplayConfig {
    pub fn offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.timezone_offset * 60)
            .ok_or_else(|| anyhow!("Invalid timezone offset: {}", self.timezone_offset))
    }

    /// Wall-clock now in the configured offset.
    pub fn now(&self) -> Result<DateTime<FixedOffset>> {
        Ok(Utc::now().with_timezone(&self.offset()?))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub location: LocationConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

impl AppConfig {
    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("", "", "iftar")
            .context("Could not determine project directories")
    }

    pub fn config_path() -> Result<PathBuf> {
        let dirs = Self::project_dirs()?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn data_dir() -> Result<PathBuf> {
        let dirs = Self::project_dirs()?;
        Ok(dirs.data_dir().to_path_buf())
    }

    pub fn db_path() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("iftar.db"))
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content =
            std::fs::read_to_string(path).with_context(|| format!("Reading {:?}", path))?;
        let config: AppConfig = toml::from_str(&content).context("Parsing config.toml")?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).context("Serializing config")?;
        std::fs::write(path, content).with_context(|| format!("Writing {:?}", path))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.location.fixed()?;
        self.display.offset()?;
        Ok(())
    }

    pub fn ensure_data_dir() -> Result<PathBuf> {
        let dir = Self::data_dir()?;
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}
