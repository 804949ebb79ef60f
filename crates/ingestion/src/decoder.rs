//! Row to point normalization.
//!
//! Converts decoded rows into typed points: timestamps become UTC instants,
//! counts are validated. Rows whose timestamp cannot be parsed are dropped;
//! invalid numeric fields become absent rather than zero.

use crate::payload::{parse_forecast_payload, parse_range_payload};
use crate::timestamp::parse_timestamp;
use chrono_tz::Tz;
use megribi_core::{ActualPoint, ActualRow, ForecastPoint, ForecastRow};
use serde_json::Value;
use tracing::debug;

/// Statistics about decoding quality.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeStats {
    /// Actual rows seen.
    pub actual_rows: u64,
    /// Forecast rows seen.
    pub forecast_rows: u64,
    /// Rows dropped for an unparseable timestamp.
    pub dropped_timestamps: u64,
    /// Numeric fields discarded as invalid (negative, non-finite, fractional count).
    pub invalid_values: u64,
}

impl DecodeStats {
    /// Total rows seen.
    pub fn total_rows(&self) -> u64 {
        self.actual_rows + self.forecast_rows
    }

    /// Reset statistics.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Normalizes backend rows into points for one time zone.
pub struct PayloadDecoder {
    /// Zone for timestamps without an offset.
    tz: Tz,
    /// Decoding statistics.
    stats: DecodeStats,
}

impl PayloadDecoder {
    /// Create a new decoder.
    pub fn new(tz: Tz) -> Self {
        Self {
            tz,
            stats: DecodeStats::default(),
        }
    }

    /// Convert actual rows to points.
    pub fn actual_points(&mut self, rows: &[ActualRow]) -> Vec<ActualPoint> {
        let mut points = Vec::with_capacity(rows.len());
        for row in rows {
            self.stats.actual_rows += 1;
            let Some(timestamp) = parse_timestamp(&row.ts, &self.tz) else {
                self.stats.dropped_timestamps += 1;
                debug!(ts = %row.ts, "dropping actual row with unparseable timestamp");
                continue;
            };
            points.push(ActualPoint {
                timestamp,
                men: self.count(row.men),
                women: self.count(row.women),
                total: self.count(row.total),
            });
        }
        points
    }

    /// Convert forecast rows to points.
    pub fn forecast_points(&mut self, rows: &[ForecastRow]) -> Vec<ForecastPoint> {
        let mut points = Vec::with_capacity(rows.len());
        for row in rows {
            self.stats.forecast_rows += 1;
            let Some(timestamp) = parse_timestamp(&row.ts, &self.tz) else {
                self.stats.dropped_timestamps += 1;
                debug!(ts = %row.ts, "dropping forecast row with unparseable timestamp");
                continue;
            };
            points.push(ForecastPoint {
                timestamp,
                men_pred: self.estimate(row.men_pred),
                women_pred: self.estimate(row.women_pred),
                total_pred: self.estimate(row.total_pred),
            });
        }
        points
    }

    /// Decode a `/api/range` body straight into points.
    pub fn decode_range(&mut self, raw: &Value) -> Vec<ActualPoint> {
        self.actual_points(&parse_range_payload(raw))
    }

    /// Decode a `/api/forecast_*` body straight into points.
    pub fn decode_forecast(&mut self, raw: &Value) -> Vec<ForecastPoint> {
        self.forecast_points(&parse_forecast_payload(raw))
    }

    /// Get decoding statistics.
    pub fn stats(&self) -> &DecodeStats {
        &self.stats
    }

    /// Validate a headcount: finite, non-negative, integral.
    fn count(&mut self, value: Option<f64>) -> Option<u32> {
        let v = value?;
        if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64 {
            Some(v as u32)
        } else {
            self.stats.invalid_values += 1;
            None
        }
    }

    /// Validate an estimate: finite and non-negative.
    fn estimate(&mut self, value: Option<f64>) -> Option<f64> {
        let v = value?;
        if v.is_finite() && v >= 0.0 {
            Some(v)
        } else {
            self.stats.invalid_values += 1;
            None
        }
    }
}
