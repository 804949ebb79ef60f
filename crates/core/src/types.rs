//! Core data types for the MEGRIBI dashboard.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Absolute instant of a sample.
pub type Timestamp = DateTime<Utc>;

/// Placeholder label used when no peak exists.
pub const NO_PEAK_LABEL: &str = "--:--";

/// Anything positioned at an instant.
pub trait Timestamped {
    fn timestamp(&self) -> Timestamp;
}

/// A measured row from `/api/range`, as decoded from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActualRow {
    /// ISO-8601 timestamp string.
    pub ts: String,
    pub men: Option<f64>,
    pub women: Option<f64>,
    pub total: Option<f64>,
}

/// A predicted row from `/api/forecast_*`, as decoded from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    /// ISO-8601 timestamp string.
    pub ts: String,
    pub men_pred: Option<f64>,
    pub women_pred: Option<f64>,
    pub total_pred: Option<f64>,
}

/// One measured sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActualPoint {
    pub timestamp: Timestamp,
    pub men: Option<u32>,
    pub women: Option<u32>,
    /// Reported total, if the backend sent one.
    pub total: Option<u32>,
}

impl ActualPoint {
    /// Reported total, or `men + women` when both are known and the sum fits.
    pub fn total(&self) -> Option<u32> {
        self.total.or_else(|| match (self.men, self.women) {
            (Some(m), Some(w)) => m.checked_add(w),
            _ => None,
        })
    }
}

impl Timestamped for ActualPoint {
    fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

/// One predicted sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub timestamp: Timestamp,
    pub men_pred: Option<f64>,
    pub women_pred: Option<f64>,
    pub total_pred: Option<f64>,
}

impl Timestamped for ForecastPoint {
    fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

/// One business night: `[start, end]`, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NightWindow {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl NightWindow {
    /// Check whether an instant lies inside the window.
    #[inline]
    pub fn contains(&self, ts: Timestamp) -> bool {
        ts >= self.start && ts <= self.end
    }

    /// Window length.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// One entry of the reconciled chart series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledPoint {
    /// Local `HH:MM` label.
    pub label: String,
    /// Instant the entry is keyed by. Absent for template entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
    pub men_actual: Option<f64>,
    pub women_actual: Option<f64>,
    pub men_forecast: Option<f64>,
    pub women_forecast: Option<f64>,
}

impl ReconciledPoint {
    /// An entry with no values.
    pub fn empty(label: impl Into<String>, timestamp: Option<Timestamp>) -> Self {
        Self {
            label: label.into(),
            timestamp,
            men_actual: None,
            women_actual: None,
            men_forecast: None,
            women_forecast: None,
        }
    }

    /// Whether any of the four values is present.
    pub fn has_any(&self) -> bool {
        self.men_actual.is_some()
            || self.women_actual.is_some()
            || self.men_forecast.is_some()
            || self.women_forecast.is_some()
    }

    /// Sum of all four values with absent ones counted as zero.
    pub fn combined_total(&self) -> f64 {
        self.men_actual.unwrap_or(0.0)
            + self.women_actual.unwrap_or(0.0)
            + self.men_forecast.unwrap_or(0.0)
            + self.women_forecast.unwrap_or(0.0)
    }
}

/// Which night the dashboard shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "mode", content = "date")]
pub enum RangeMode {
    /// Tonight (or the night still running after midnight).
    Today,
    /// The night before tonight.
    Yesterday,
    /// Same night one week earlier.
    LastWeek,
    /// Night starting on an explicit calendar date.
    Custom(NaiveDate),
}

impl RangeMode {
    /// Forecasts are only meaningful for the current night.
    pub fn fetches_forecast(&self) -> bool {
        matches!(self, RangeMode::Today)
    }
}

/// Static store metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreMeta {
    /// Slug understood by the backend.
    pub slug: String,
    /// Short display label.
    pub label: String,
    /// Area display label.
    pub area_label: String,
}

impl StoreMeta {
    pub fn new(slug: impl Into<String>, label: impl Into<String>, area_label: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            label: label.into(),
            area_label: area_label.into(),
        }
    }
}

/// Whether a snapshot carries any data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataStatus {
    Available,
    NoData,
}

impl DataStatus {
    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            DataStatus::Available => "データ取得済み",
            DataStatus::NoData => "データなし",
        }
    }
}

/// Headline "right now" numbers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurrentSnapshot {
    pub men_now: f64,
    pub women_now: f64,
}

impl CurrentSnapshot {
    pub fn total(&self) -> f64 {
        self.men_now + self.women_now
    }
}

/// Busiest entry of a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    pub label: String,
    pub total: f64,
}

impl Peak {
    /// Peak used when no entry has a positive total.
    pub fn none() -> Self {
        Self {
            label: NO_PEAK_LABEL.to_string(),
            total: 0.0,
        }
    }
}

/// Everything the store preview renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub slug: String,
    pub name: String,
    pub area: String,
    pub status: DataStatus,
    pub now_men: f64,
    pub now_women: f64,
    pub now_total: f64,
    pub peak_label: String,
    pub peak_total: f64,
    pub series: Vec<ReconciledPoint>,
    pub has_data: bool,
}
