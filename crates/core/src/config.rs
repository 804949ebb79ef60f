//! Configuration structures for the MEGRIBI dashboard.

use crate::error::{Error, Result};
use crate::types::{RangeMode, StoreMeta};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable overriding `backend.base_url`.
pub const BACKEND_URL_ENV: &str = "BACKEND_URL";

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Night window configuration.
    pub night: NightConfig,
    /// Range fetch configuration.
    pub range: RangeConfig,
    /// Backend connection configuration.
    pub backend: BackendConfig,
    /// Store catalogue.
    pub stores: StoresConfig,
    /// Megribi score configuration.
    pub score: ScoreConfig,
}

impl Config {
    /// Parse a configuration from JSON. Missing sections take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file, then apply environment overrides.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let mut config = Self::from_json_str(&raw)?;
        config.apply_env();
        Ok(config)
    }

    /// Apply `BACKEND_URL` if it is set and non-empty.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(BACKEND_URL_ENV) {
            if !url.trim().is_empty() {
                self.backend.base_url = url.trim().to_string();
            }
        }
    }

    /// Check cross-field invariants.
    pub fn validate(&self) -> Result<()> {
        self.night.validate()?;
        self.stores.validate()?;
        if self.backend.base_url.trim().is_empty() {
            return Err(Error::config("backend.base_url is empty"));
        }
        Ok(())
    }
}

/// Night window configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NightConfig {
    /// Local hour at which a business night starts.
    pub start_hour: u32,
    /// Length of the night in hours.
    pub length_hours: u32,
    /// IANA time zone used for local times and labels.
    pub timezone: String,
}

impl Default for NightConfig {
    fn default() -> Self {
        Self {
            start_hour: 19,
            length_hours: 10,
            timezone: "Asia/Tokyo".to_string(),
        }
    }
}

impl NightConfig {
    /// Resolve the configured time zone.
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| Error::config(format!("unknown time zone: {}", self.timezone)))
    }

    fn validate(&self) -> Result<()> {
        if self.start_hour >= 24 {
            return Err(Error::config(format!(
                "night.start_hour must be below 24, got {}",
                self.start_hour
            )));
        }
        if self.length_hours == 0 || self.length_hours > 24 {
            return Err(Error::config(format!(
                "night.length_hours must be within 1..=24, got {}",
                self.length_hours
            )));
        }
        self.tz().map(|_| ())
    }
}

/// Row limits for `/api/range`, per range mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeConfig {
    pub today_limit: u32,
    pub yesterday_limit: u32,
    pub last_week_limit: u32,
    pub custom_limit: u32,
}

impl Default for RangeConfig {
    fn default() -> Self {
        Self {
            today_limit: 400,
            yesterday_limit: 1600,
            last_week_limit: 5200,
            custom_limit: 5200,
        }
    }
}

impl RangeConfig {
    /// Row limit to request for a range mode.
    pub fn limit_for(&self, mode: &RangeMode) -> u32 {
        match mode {
            RangeMode::Today => self.today_limit,
            RangeMode::Yesterday => self.yesterday_limit,
            RangeMode::LastWeek => self.last_week_limit,
            RangeMode::Custom(_) => self.custom_limit,
        }
    }
}

/// Backend connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the forecasting backend.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Store catalogue.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoresConfig {
    /// Brand name prefixed to store labels.
    pub brand: String,
    /// Known stores.
    pub stores: Vec<StoreMeta>,
    /// Slug used when none (or an unknown one) is requested.
    pub default_store: String,
}

impl Default for StoresConfig {
    fn default() -> Self {
        Self {
            brand: "オリエンタルラウンジ".to_string(),
            stores: vec![
                StoreMeta::new("nagasaki", "長崎", "長崎"),
                StoreMeta::new("fukuoka", "福岡", "福岡"),
                StoreMeta::new("shibuya", "渋谷本店", "東京"),
            ],
            default_store: "nagasaki".to_string(),
        }
    }
}

impl StoresConfig {
    /// Look up a store by slug, falling back to the default store.
    pub fn resolve(&self, slug: Option<&str>) -> Option<&StoreMeta> {
        slug.and_then(|s| self.stores.iter().find(|m| m.slug == s))
            .or_else(|| self.stores.iter().find(|m| m.slug == self.default_store))
    }

    /// Display name for a store.
    pub fn display_name(&self, meta: &StoreMeta) -> String {
        format!("{} {}", self.brand, meta.label)
    }

    fn validate(&self) -> Result<()> {
        if self.stores.is_empty() {
            return Err(Error::config("stores.stores is empty"));
        }
        if !self.stores.iter().any(|m| m.slug == self.default_store) {
            return Err(Error::config(format!(
                "stores.default_store {} is not a known store",
                self.default_store
            )));
        }
        Ok(())
    }
}

/// Megribi score configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreConfig {
    /// Minimum score for a point to count as "good".
    pub threshold: f64,
    /// Minimum span of a good window in minutes.
    pub min_duration_minutes: u32,
    /// Ideal occupancy rate.
    pub ideal_occupancy: f64,
    /// Weight applied to the female ratio deviation from 0.5.
    pub gender_weight: f64,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            threshold: 0.80,
            min_duration_minutes: 120,
            ideal_occupancy: 0.7,
            gender_weight: 1.5,
        }
    }
}
