//! Snapshot headline numbers.
//!
//! Derives the "now" and "peak" figures from a reconciled series, and builds
//! the store snapshot the preview renders.

use megribi_core::config::{NightConfig, StoresConfig};
use crate::window::MAX_NIGHT_HOURS;
use megribi_core::{CurrentSnapshot, DataStatus, Peak, ReconciledPoint, StoreMeta, StoreSnapshot};

/// Whether any entry carries any value.
pub fn has_any_data(series: &[ReconciledPoint]) -> bool {
    series.iter().any(ReconciledPoint::has_any)
}

/// "Right now" numbers from the last entry that has any value.
///
/// Each side prefers the actual value, then the forecast, then zero.
pub fn pick_current_snapshot(series: &[ReconciledPoint]) -> CurrentSnapshot {
    match series.iter().rev().find(|p| p.has_any()) {
        Some(p) => CurrentSnapshot {
            men_now: p.men_actual.or(p.men_forecast).unwrap_or(0.0),
            women_now: p.women_actual.or(p.women_forecast).unwrap_or(0.0),
        },
        None => CurrentSnapshot {
            men_now: 0.0,
            women_now: 0.0,
        },
    }
}

/// Entry with the strictly greatest combined total; the earliest wins ties.
pub fn pick_peak(series: &[ReconciledPoint]) -> Peak {
    let mut best = Peak::none();
    for point in series {
        let total = point.combined_total();
        if total > best.total {
            best = Peak {
                label: point.label.clone(),
                total,
            };
        }
    }
    best
}

/// Hourly template for a night without data.
///
/// Runs from the start hour through one hour past the window end, so the
/// empty chart keeps the same horizontal extent as a populated one.
/// `start_hour` is capped at 23 and `length_hours` at 24.
pub fn empty_night_series(start_hour: u32, length_hours: u32) -> Vec<ReconciledPoint> {
    let start_hour = start_hour.min(23);
    (start_hour..=start_hour + length_hours.min(MAX_NIGHT_HOURS) + 1)
        .map(|h| ReconciledPoint::empty(format!("{:02}:00", h % 24), None))
        .collect()
}

/// Builds store snapshots.
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    /// Store catalogue, for display names.
    stores: StoresConfig,
    /// Series shown when a night has no entries.
    template: Vec<ReconciledPoint>,
}

impl SnapshotBuilder {
    /// Create a new snapshot builder.
    pub fn new(stores: StoresConfig, night: &NightConfig) -> Self {
        Self {
            stores,
            template: empty_night_series(night.start_hour, night.length_hours),
        }
    }

    /// Snapshot shown while loading or after a failed fetch.
    pub fn placeholder(&self, meta: &StoreMeta) -> StoreSnapshot {
        StoreSnapshot {
            slug: meta.slug.clone(),
            name: self.stores.display_name(meta),
            area: meta.area_label.clone(),
            status: DataStatus::NoData,
            now_men: 0.0,
            now_women: 0.0,
            now_total: 0.0,
            peak_label: Peak::none().label,
            peak_total: 0.0,
            series: self.template.clone(),
            has_data: false,
        }
    }

    /// Snapshot for a reconciled series.
    pub fn build(&self, meta: &StoreMeta, series: Vec<ReconciledPoint>) -> StoreSnapshot {
        let has_data = has_any_data(&series);
        let series = if series.is_empty() {
            self.template.clone()
        } else {
            series
        };

        let current = pick_current_snapshot(&series);
        let peak = pick_peak(&series);
        let status = if has_data {
            DataStatus::Available
        } else {
            DataStatus::NoData
        };

        StoreSnapshot {
            slug: meta.slug.clone(),
            name: self.stores.display_name(meta),
            area: meta.area_label.clone(),
            status,
            now_men: current.men_now,
            now_women: current.women_now,
            now_total: current.total(),
            peak_label: peak.label,
            peak_total: peak.total,
            series,
            has_data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use megribi_core::NO_PEAK_LABEL;

    fn point(label: &str, values: [Option<f64>; 4]) -> ReconciledPoint {
        ReconciledPoint {
            label: label.to_string(),
            timestamp: None,
            men_actual: values[0],
            women_actual: values[1],
            men_forecast: values[2],
            women_forecast: values[3],
        }
    }

    fn builder() -> SnapshotBuilder {
        SnapshotBuilder::new(StoresConfig::default(), &NightConfig::default())
    }

    #[test]
    fn test_has_any_data() {
        assert!(!has_any_data(&[]));
        assert!(!has_any_data(&[point("19:00", [None; 4])]));
        assert!(has_any_data(&[
            point("19:00", [None; 4]),
            point("20:00", [None, None, None, Some(0.0)]),
        ]));
    }

    #[test]
    fn test_current_prefers_actual() {
        let series = vec![
            point("20:00", [Some(5.0), Some(3.0), None, None]),
            point("21:00", [Some(4.0), None, Some(9.0), Some(7.0)]),
            point("22:00", [None; 4]),
        ];
        let current = pick_current_snapshot(&series);
        assert_relative_eq!(current.men_now, 4.0);
        assert_relative_eq!(current.women_now, 7.0);
        assert_relative_eq!(current.total(), 11.0);
    }

    #[test]
    fn test_current_from_forecast_only() {
        let series = vec![
            point("20:00", [Some(5.0), Some(3.0), None, None]),
            point("21:00", [None, None, Some(6.0), None]),
        ];
        let current = pick_current_snapshot(&series);
        assert_relative_eq!(current.men_now, 6.0);
        assert_relative_eq!(current.women_now, 0.0);
    }

    #[test]
    fn test_current_empty() {
        let current = pick_current_snapshot(&[point("19:00", [None; 4])]);
        assert_eq!(current.men_now, 0.0);
        assert_eq!(current.women_now, 0.0);
    }

    #[test]
    fn test_peak_ties_keep_first() {
        let series = vec![
            point("20:00", [Some(6.0), Some(4.0), None, None]),
            point("21:00", [Some(15.0), Some(10.0), None, None]),
            point("22:00", [None, None, Some(20.0), Some(5.0)]),
        ];
        let peak = pick_peak(&series);
        assert_eq!(peak.label, "21:00");
        assert_relative_eq!(peak.total, 25.0);
    }

    #[test]
    fn test_peak_none_when_all_zero() {
        let peak = pick_peak(&[point("19:00", [Some(0.0), Some(0.0), None, None])]);
        assert_eq!(peak.label, NO_PEAK_LABEL);
        assert_eq!(peak.total, 0.0);
    }

    #[test]
    fn test_empty_template() {
        let series = empty_night_series(19, 10);
        let labels: Vec<&str> = series.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "19:00", "20:00", "21:00", "22:00", "23:00", "00:00", "01:00", "02:00", "03:00", "04:00",
                "05:00", "06:00",
            ]
        );
        assert!(!has_any_data(&series));
    }

    #[test]
    fn test_empty_template_oversized_config() {
        let series = empty_night_series(u32::MAX, u32::MAX);
        assert_eq!(series.len(), 26);
        assert_eq!(series[0].label, "23:00");
    }

    #[test]
    fn test_build_with_data() {
        let stores = StoresConfig::default();
        let meta = stores.resolve(Some("fukuoka")).unwrap().clone();
        let snapshot = builder().build(
            &meta,
            vec![
                point("20:00", [Some(5.0), Some(3.0), None, None]),
                point("21:00", [None, None, Some(6.0), Some(4.0)]),
            ],
        );

        assert!(snapshot.has_data);
        assert_eq!(snapshot.status, DataStatus::Available);
        assert_eq!(snapshot.slug, "fukuoka");
        assert_eq!(snapshot.name, "オリエンタルラウンジ 福岡");
        assert_eq!(snapshot.area, meta.area_label);
        assert_relative_eq!(snapshot.now_total, 10.0);
        assert_eq!(snapshot.peak_label, "21:00");
        assert_eq!(snapshot.series.len(), 2);
    }

    #[test]
    fn test_build_empty_uses_template() {
        let stores = StoresConfig::default();
        let meta = stores.resolve(None).unwrap().clone();
        let snapshot = builder().build(&meta, Vec::new());

        assert!(!snapshot.has_data);
        assert_eq!(snapshot.status, DataStatus::NoData);
        assert_eq!(snapshot.series.len(), 12);
        assert_eq!(snapshot.peak_label, NO_PEAK_LABEL);
        assert_eq!(snapshot, builder().placeholder(&meta));
    }
}
