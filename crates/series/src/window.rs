//! Night window selection.
//!
//! A business night starts at 19:00 local time on its base date and runs for
//! ten hours, into the next calendar day. A view opened at 02:00 still belongs
//! to the night that started the previous evening.

use chrono::{Days, Duration, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use megribi_core::config::NightConfig;
use megribi_core::{NightWindow, RangeMode, Result, Timestamp, Timestamped};
use megribi_ingestion::parse_timestamp;
use tracing::debug;

/// Longest night a clock or template will span.
pub const MAX_NIGHT_HOURS: u32 = 24;

/// Maps instants and range modes to night windows in one time zone.
#[derive(Debug, Clone)]
pub struct NightClock {
    tz: Tz,
    start_hour: u32,
    length: Duration,
}

impl NightClock {
    /// Create a clock. `start_hour` is capped at 23 and `length_hours` at 24.
    pub fn new(tz: Tz, start_hour: u32, length_hours: u32) -> Self {
        Self {
            tz,
            start_hour: start_hour.min(23),
            length: Duration::hours(i64::from(length_hours.min(MAX_NIGHT_HOURS))),
        }
    }

    /// Create a clock from configuration.
    pub fn from_config(config: &NightConfig) -> Result<Self> {
        Ok(Self::new(config.tz()?, config.start_hour, config.length_hours))
    }

    /// Time zone of this clock.
    pub fn tz(&self) -> Tz {
        self.tz
    }

    /// Base date of the night running (or about to run) at `now`.
    pub fn base_date(&self, now: Timestamp) -> NaiveDate {
        let local = now.with_timezone(&self.tz);
        let today = local.date_naive();
        if local.hour() >= self.start_hour {
            today
        } else {
            today.checked_sub_days(Days::new(1)).unwrap_or(today)
        }
    }

    /// Base date selected by a range mode.
    pub fn base_date_for_mode(&self, mode: &RangeMode, now: Timestamp) -> NaiveDate {
        let today = self.base_date(now);
        match mode {
            RangeMode::Today => today,
            RangeMode::Yesterday => today.checked_sub_days(Days::new(1)).unwrap_or(today),
            RangeMode::LastWeek => today.checked_sub_days(Days::new(7)).unwrap_or(today),
            RangeMode::Custom(date) => *date,
        }
    }

    /// Custom mode for a user-entered date; invalid input selects tonight.
    pub fn custom_mode(&self, raw_date: &str, now: Timestamp) -> RangeMode {
        RangeMode::Custom(parse_ymd(raw_date).unwrap_or_else(|| self.base_date(now)))
    }

    /// Window of the night starting on `base`.
    pub fn window_for_date(&self, base: NaiveDate) -> NightWindow {
        let naive_start = base
            .and_hms_opt(self.start_hour, 0, 0)
            .unwrap_or_else(|| base.and_time(chrono::NaiveTime::MIN));
        let start = self.resolve_local(naive_start);
        NightWindow {
            start,
            end: start + self.length,
        }
    }

    /// Window for `now`, or for an explicitly chosen base date.
    pub fn compute_night_window(&self, now: Timestamp, explicit_base_date: Option<NaiveDate>) -> NightWindow {
        let base = explicit_base_date.unwrap_or_else(|| self.base_date(now));
        self.window_for_date(base)
    }

    /// Window for a range mode.
    pub fn window_for_mode(&self, mode: &RangeMode, now: Timestamp) -> NightWindow {
        self.window_for_date(self.base_date_for_mode(mode, now))
    }

    /// Earliest instant at or after a local wall-clock time, to the minute.
    ///
    /// A time inside a DST gap resolves to the end of the gap.
    fn resolve_local(&self, naive: NaiveDateTime) -> Timestamp {
        (0..=3 * 60)
            .find_map(|m| {
                self.tz
                    .from_local_datetime(&(naive + Duration::minutes(m)))
                    .earliest()
            })
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
    }
}

/// Parse a strict `YYYY-MM-DD` calendar date.
pub fn parse_ymd(value: &str) -> Option<NaiveDate> {
    let s = value.trim();
    let bytes = s.as_bytes();
    let shape_ok = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !shape_ok {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Keep points inside the window (both bounds inclusive).
pub fn filter_within_window<T: Timestamped>(points: Vec<T>, window: &NightWindow) -> Vec<T> {
    points
        .into_iter()
        .filter(|p| window.contains(p.timestamp()))
        .collect()
}

/// Keep raw rows whose timestamp parses and lies inside the window.
pub fn filter_rows_within<R, F>(rows: Vec<R>, window: &NightWindow, tz: &Tz, ts_of: F) -> Vec<R>
where
    F: Fn(&R) -> &str,
{
    rows.into_iter()
        .filter(|row| match parse_timestamp(ts_of(row), tz) {
            Some(ts) => window.contains(ts),
            None => {
                debug!(ts = ts_of(row), "dropping row with unparseable timestamp");
                false
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use megribi_core::{ActualPoint, ActualRow};

    fn clock() -> NightClock {
        NightClock::new(chrono_tz::Asia::Tokyo, 19, 10)
    }

    fn tokyo(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> Timestamp {
        chrono_tz::Asia::Tokyo
            .with_ymd_and_hms(y, mo, d, h, mi, s)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn date(y: i32, mo: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, mo, d).unwrap()
    }

    #[test]
    fn test_evening_uses_today() {
        let window = clock().compute_night_window(tokyo(2025, 1, 1, 19, 0, 0), None);
        assert_eq!(window.start, tokyo(2025, 1, 1, 19, 0, 0));
        assert_eq!(window.end, tokyo(2025, 1, 2, 5, 0, 0));
    }

    #[test]
    fn test_after_midnight_uses_yesterday() {
        let window = clock().compute_night_window(tokyo(2025, 1, 2, 2, 0, 0), None);
        assert_eq!(window.start, tokyo(2025, 1, 1, 19, 0, 0));
    }

    #[test]
    fn test_afternoon_uses_yesterday() {
        let base = clock().base_date(tokyo(2025, 1, 2, 18, 59, 59));
        assert_eq!(base, date(2025, 1, 1));
    }

    #[test]
    fn test_explicit_base_date() {
        let window = clock().compute_night_window(tokyo(2025, 6, 1, 12, 0, 0), Some(date(2025, 3, 1)));
        assert_eq!(window.start, tokyo(2025, 3, 1, 19, 0, 0));
        assert_eq!(window.end, tokyo(2025, 3, 2, 5, 0, 0));
    }

    #[test]
    fn test_window_is_ten_hours() {
        let clock = clock();
        for day in 1..=28 {
            let window = clock.window_for_date(date(2025, 2, day));
            assert_eq!(window.duration(), Duration::hours(10));
        }
        // Holds across a DST change as well
        let ny = NightClock::new(chrono_tz::America::New_York, 19, 10);
        let window = ny.window_for_date(date(2025, 3, 8));
        assert_eq!(window.duration(), Duration::hours(10));
    }

    #[test]
    fn test_start_in_half_hour_gap_resolves_to_gap_end() {
        // Lord Howe jumps from 02:00 to 02:30 on 2024-10-06
        let clock = NightClock::new(chrono_tz::Australia::Lord_Howe, 2, 10);
        let window = clock.window_for_date(date(2024, 10, 6));
        assert_eq!(window.start, Utc.with_ymd_and_hms(2024, 10, 5, 15, 30, 0).unwrap());
        assert_eq!(window.duration(), Duration::hours(10));
    }

    #[test]
    fn test_oversized_config_is_capped() {
        let clock = NightClock::new(chrono_tz::Asia::Tokyo, u32::MAX, u32::MAX);
        let window = clock.window_for_date(date(2025, 1, 1));
        assert_eq!(window.start, tokyo(2025, 1, 1, 23, 0, 0));
        assert_eq!(window.duration(), Duration::hours(i64::from(MAX_NIGHT_HOURS)));
    }

    #[test]
    fn test_range_modes() {
        let clock = clock();
        let now = tokyo(2025, 1, 10, 21, 0, 0);
        assert_eq!(clock.base_date_for_mode(&RangeMode::Today, now), date(2025, 1, 10));
        assert_eq!(clock.base_date_for_mode(&RangeMode::Yesterday, now), date(2025, 1, 9));
        assert_eq!(clock.base_date_for_mode(&RangeMode::LastWeek, now), date(2025, 1, 3));
        assert_eq!(
            clock.base_date_for_mode(&RangeMode::Custom(date(2024, 12, 24)), now),
            date(2024, 12, 24)
        );
        let window = clock.window_for_mode(&RangeMode::Yesterday, now);
        assert_eq!(window.start, tokyo(2025, 1, 9, 19, 0, 0));
    }

    #[test]
    fn test_custom_mode_fallback() {
        let clock = clock();
        let now = tokyo(2025, 1, 10, 3, 0, 0);
        assert_eq!(clock.custom_mode("2024-12-24", now), RangeMode::Custom(date(2024, 12, 24)));
        assert_eq!(clock.custom_mode("2024-02-31", now), RangeMode::Custom(date(2025, 1, 9)));
    }

    #[test]
    fn test_parse_ymd() {
        assert_eq!(parse_ymd("2025-01-31"), Some(date(2025, 1, 31)));
        assert_eq!(parse_ymd(" 2025-01-31 "), Some(date(2025, 1, 31)));
        assert_eq!(parse_ymd("2025-02-30"), None);
        assert_eq!(parse_ymd("2025-1-31"), None);
        assert_eq!(parse_ymd("20250131"), None);
        assert_eq!(parse_ymd(""), None);
    }

    #[test]
    fn test_filter_inclusive_bounds() {
        let window = clock().window_for_date(date(2025, 1, 1));
        let point = |ts| ActualPoint {
            timestamp: ts,
            men: Some(1),
            women: Some(1),
            total: None,
        };
        let points = vec![
            point(tokyo(2025, 1, 1, 18, 59, 59)),
            point(tokyo(2025, 1, 1, 19, 0, 0)),
            point(tokyo(2025, 1, 2, 5, 0, 0)),
            point(tokyo(2025, 1, 2, 5, 0, 1)),
        ];

        let kept = filter_within_window(points, &window);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].timestamp, window.start);
        assert_eq!(kept[1].timestamp, window.end);
    }

    #[test]
    fn test_filter_rows_drops_unparseable() {
        let clock = clock();
        let window = clock.window_for_date(date(2025, 1, 1));
        let row = |ts: &str| ActualRow {
            ts: ts.to_string(),
            men: Some(1.0),
            women: None,
            total: None,
        };
        let rows = vec![
            row("2025-01-01T20:00:00+09:00"),
            row("not-a-time"),
            row("2025-01-01T12:00:00+09:00"),
        ];

        let kept = filter_rows_within(rows, &window, &clock.tz(), |r| r.ts.as_str());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].ts, "2025-01-01T20:00:00+09:00");
    }
}
