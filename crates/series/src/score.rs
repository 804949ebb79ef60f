//! Megribi score.
//!
//! Rates a moment in a venue from its female ratio, occupancy rate and
//! stability, each in `[0, 1]`, and finds sustained stretches of high scores.

use megribi_core::config::ScoreConfig;
use megribi_core::Timestamp;
use serde::{Deserialize, Serialize};

/// Clamp to `[0, 1]`; NaN and infinities become zero.
pub fn clamp01(x: f64) -> f64 {
    if !x.is_finite() {
        return 0.0;
    }
    x.clamp(0.0, 1.0)
}

/// How close occupancy is to the ideal, linearly falling off on both sides.
pub fn occupancy_score(occupancy_rate: f64, ideal: f64) -> f64 {
    let occ = clamp01(occupancy_rate);
    let ideal = clamp01(ideal);
    if ideal <= 0.0 {
        return clamp01(1.0 - occ);
    }
    if ideal >= 1.0 {
        return occ;
    }
    if occ <= ideal {
        clamp01(1.0 - (ideal - occ) / ideal)
    } else {
        clamp01(1.0 - (occ - ideal) / (1.0 - ideal))
    }
}

/// Combined score in `[0, 1]`.
pub fn megribi_score(female_ratio: f64, occupancy_rate: f64, stability: f64, ideal: f64, gender_weight: f64) -> f64 {
    let occ = occupancy_score(occupancy_rate, ideal);
    let weight = gender_weight.max(0.0);
    let female = clamp01(0.5 + (clamp01(female_ratio) - 0.5) * weight);
    clamp01(occ * female * clamp01(stability))
}

/// One scored input sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScorePoint {
    pub timestamp: Timestamp,
    pub female_ratio: f64,
    pub occupancy_rate: f64,
    /// Defaults to 1.0 when the source has no stability figure.
    pub stability: f64,
}

/// A sustained stretch of high scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoodWindow {
    pub start: Timestamp,
    pub end: Timestamp,
    pub duration_minutes: f64,
    pub avg_score: f64,
}

/// Scores points and detects good windows.
#[derive(Debug, Clone, Default)]
pub struct MegribiScorer {
    config: ScoreConfig,
}

impl MegribiScorer {
    /// Create a new scorer.
    pub fn new(config: ScoreConfig) -> Self {
        Self { config }
    }

    /// Score one point.
    pub fn score(&self, point: &ScorePoint) -> f64 {
        megribi_score(
            point.female_ratio,
            point.occupancy_rate,
            point.stability,
            self.config.ideal_occupancy,
            self.config.gender_weight,
        )
    }

    /// Find runs of consecutive points scoring at or above the threshold that
    /// span at least the minimum duration (first to last point).
    pub fn find_good_windows(&self, points: &[ScorePoint]) -> Vec<GoodWindow> {
        let mut scored: Vec<(Timestamp, f64)> = points.iter().map(|p| (p.timestamp, self.score(p))).collect();
        scored.sort_by_key(|(ts, _)| *ts);

        let min_minutes = f64::from(self.config.min_duration_minutes);
        let mut windows = Vec::new();
        let mut segment: Vec<(Timestamp, f64)> = Vec::new();

        let mut flush = |segment: &mut Vec<(Timestamp, f64)>| {
            if let (Some(first), Some(last)) = (segment.first(), segment.last()) {
                let duration_minutes = (last.0 - first.0).num_seconds() as f64 / 60.0;
                if duration_minutes >= min_minutes {
                    let avg_score = segment.iter().map(|(_, s)| s).sum::<f64>() / segment.len() as f64;
                    windows.push(GoodWindow {
                        start: first.0,
                        end: last.0,
                        duration_minutes,
                        avg_score,
                    });
                }
            }
            segment.clear();
        };

        for item in scored {
            if item.1 >= self.config.threshold {
                segment.push(item);
            } else {
                flush(&mut segment);
            }
        }
        flush(&mut segment);

        windows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone, Utc};

    fn at(minutes: i64) -> Timestamp {
        Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn sample(minutes: i64, female_ratio: f64, occupancy_rate: f64) -> ScorePoint {
        ScorePoint {
            timestamp: at(minutes),
            female_ratio,
            occupancy_rate,
            stability: 1.0,
        }
    }

    #[test]
    fn test_clamp01() {
        assert_eq!(clamp01(f64::NAN), 0.0);
        assert_eq!(clamp01(f64::INFINITY), 0.0);
        assert_eq!(clamp01(-0.5), 0.0);
        assert_eq!(clamp01(1.5), 1.0);
        assert_eq!(clamp01(0.25), 0.25);
    }

    #[test]
    fn test_occupancy_score() {
        assert_relative_eq!(occupancy_score(0.7, 0.7), 1.0, epsilon = 1e-12);
        assert_relative_eq!(occupancy_score(0.35, 0.7), 0.5, epsilon = 1e-12);
        assert_relative_eq!(occupancy_score(0.85, 0.7), 0.5, epsilon = 1e-12);
        assert_relative_eq!(occupancy_score(0.2, 0.0), 0.8, epsilon = 1e-12);
        assert_relative_eq!(occupancy_score(0.2, 1.0), 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_megribi_score() {
        // Balanced ratio at ideal occupancy
        assert_relative_eq!(megribi_score(0.5, 0.7, 1.0, 0.7, 1.5), 0.5, epsilon = 1e-12);
        // Female-heavy venue saturates the gender term
        assert_relative_eq!(megribi_score(0.9, 0.7, 1.0, 0.7, 1.5), 1.0, epsilon = 1e-12);
        // Negative weight is treated as zero
        assert_relative_eq!(megribi_score(0.9, 0.7, 1.0, 0.7, -2.0), 0.5, epsilon = 1e-12);
        assert_relative_eq!(megribi_score(0.9, 0.7, 0.5, 0.7, 1.5), 0.5, epsilon = 1e-12);
        assert_eq!(megribi_score(f64::NAN, 0.7, 1.0, 0.7, 1.5), 0.0);
    }

    #[test]
    fn test_good_window_found() {
        let scorer = MegribiScorer::default();
        let mut points: Vec<ScorePoint> = (0..=12).map(|i| sample(i * 10, 0.9, 0.7)).collect();
        points.push(sample(130, 0.1, 0.7));
        points.reverse();

        let windows = scorer.find_good_windows(&points);
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].start, at(0));
        assert_eq!(windows[0].end, at(120));
        assert_relative_eq!(windows[0].duration_minutes, 120.0);
        assert_relative_eq!(windows[0].avg_score, 1.0);
    }

    #[test]
    fn test_short_runs_ignored() {
        let scorer = MegribiScorer::default();
        let points = vec![
            sample(0, 0.9, 0.7),
            sample(60, 0.9, 0.7),
            sample(90, 0.1, 0.7),
            sample(100, 0.9, 0.7),
            sample(220, 0.9, 0.7),
        ];

        let windows = scorer.find_good_windows(&points);
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].start, at(100));
        assert_eq!(windows[0].end, at(220));
        assert_relative_eq!(windows[0].duration_minutes, 120.0);
    }

    #[test]
    fn test_no_points() {
        assert!(MegribiScorer::default().find_good_windows(&[]).is_empty());
    }
}
