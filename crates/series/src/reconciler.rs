//! Actual/forecast reconciliation.
//!
//! Merges measured and predicted samples into one chart series keyed by
//! instant. Forecasts are only shown strictly after the last actual sample;
//! anything at or before it is suppressed so the measured curve is never
//! overlaid. Absent values stay absent: zero and "not measured" differ.

use chrono_tz::Tz;
use megribi_core::{ActualPoint, ForecastPoint, NightWindow, ReconciledPoint, Timestamp};
use std::collections::BTreeMap;

use crate::window::filter_within_window;

/// Label format: 24-hour local time, no zone suffix.
const LABEL_FORMAT: &str = "%H:%M";

/// An entry being assembled.
#[derive(Debug, Clone, Default)]
struct SeriesEntry {
    men_actual: Option<f64>,
    women_actual: Option<f64>,
    men_forecast: Option<f64>,
    women_forecast: Option<f64>,
}

impl SeriesEntry {
    fn set_actual(&mut self, point: &ActualPoint) {
        self.men_actual = point.men.map(f64::from);
        self.women_actual = point.women.map(f64::from);
    }

    fn merge_forecast(&mut self, point: &ForecastPoint) {
        // Fields missing on this sample keep an earlier sample's value
        if let Some(men) = point.men_pred {
            self.men_forecast = Some(men);
        }
        if let Some(women) = point.women_pred {
            self.women_forecast = Some(women);
        }
    }

    fn suppress_forecast(&mut self) {
        self.men_forecast = None;
        self.women_forecast = None;
    }

    fn into_point(self, label: String, timestamp: Timestamp) -> ReconciledPoint {
        ReconciledPoint {
            label,
            timestamp: Some(timestamp),
            men_actual: self.men_actual,
            women_actual: self.women_actual,
            men_forecast: self.men_forecast,
            women_forecast: self.women_forecast,
        }
    }
}

/// Builds the reconciled series for one night.
#[derive(Debug, Clone)]
pub struct NightWindowReconciler {
    /// Zone labels are rendered in.
    tz: Tz,
}

impl NightWindowReconciler {
    /// Create a new reconciler.
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Local `HH:MM` label for an instant.
    pub fn label(&self, ts: Timestamp) -> String {
        ts.with_timezone(&self.tz).format(LABEL_FORMAT).to_string()
    }

    /// Merge actual and forecast samples into one ascending series.
    pub fn build_series(&self, actuals: &[ActualPoint], forecasts: &[ForecastPoint]) -> Vec<ReconciledPoint> {
        // Stable sorts: a later duplicate overrides an earlier one
        let mut sorted_actuals: Vec<&ActualPoint> = actuals.iter().collect();
        sorted_actuals.sort_by_key(|p| p.timestamp);
        let mut sorted_forecasts: Vec<&ForecastPoint> = forecasts.iter().collect();
        sorted_forecasts.sort_by_key(|p| p.timestamp);

        let last_actual = sorted_actuals.last().map(|p| p.timestamp);
        let mut entries: BTreeMap<Timestamp, SeriesEntry> = BTreeMap::new();

        for point in sorted_actuals {
            entries.entry(point.timestamp).or_default().set_actual(point);
        }

        for point in sorted_forecasts {
            let after_last_actual = last_actual.map_or(true, |last| point.timestamp > last);
            if after_last_actual {
                entries.entry(point.timestamp).or_default().merge_forecast(point);
            } else if let Some(entry) = entries.get_mut(&point.timestamp) {
                entry.suppress_forecast();
            }
        }

        entries
            .into_iter()
            .map(|(ts, entry)| entry.into_point(self.label(ts), ts))
            .collect()
    }

    /// Restrict both inputs to a night window, then merge.
    pub fn reconcile(
        &self,
        actuals: Vec<ActualPoint>,
        forecasts: Vec<ForecastPoint>,
        window: &NightWindow,
    ) -> Vec<ReconciledPoint> {
        let actuals = filter_within_window(actuals, window);
        let forecasts = filter_within_window(forecasts, window);
        self.build_series(&actuals, &forecasts)
    }
}
