//! Decoding of backend JSON envelopes into rows.
//!
//! Range responses carry rows under `rows` (older deployments used `data`);
//! forecast responses carry them under `data`. Anything that does not look like
//! a row is skipped.

use megribi_core::{ActualRow, ForecastRow};
use serde_json::Value;

fn envelope_rows<'a>(raw: &'a Value, keys: &[&str]) -> &'a [Value] {
    keys.iter()
        .find_map(|key| raw.get(*key).and_then(Value::as_array))
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn row_ts(row: &Value) -> Option<String> {
    row.get("ts").and_then(Value::as_str).map(str::to_string)
}

fn number(row: &Value, key: &str) -> Option<f64> {
    row.get(key).and_then(Value::as_f64)
}

/// Extract actual rows from a `/api/range` response body.
pub fn parse_range_payload(raw: &Value) -> Vec<ActualRow> {
    envelope_rows(raw, &["rows", "data"])
        .iter()
        .filter_map(|row| {
            Some(ActualRow {
                ts: row_ts(row)?,
                men: number(row, "men"),
                women: number(row, "women"),
                total: number(row, "total"),
            })
        })
        .collect()
}

/// Extract forecast rows from a `/api/forecast_*` response body.
pub fn parse_forecast_payload(raw: &Value) -> Vec<ForecastRow> {
    envelope_rows(raw, &["data"])
        .iter()
        .filter_map(|row| {
            Some(ForecastRow {
                ts: row_ts(row)?,
                men_pred: number(row, "men_pred"),
                women_pred: number(row, "women_pred"),
                total_pred: number(row, "total_pred"),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_range_rows() {
        let raw = json!({
            "ok": true,
            "rows": [
                {"ts": "2025-01-01T20:00:00+09:00", "men": 5, "women": 3, "total": 8},
                {"ts": "2025-01-01T20:10:00+09:00", "men": null, "women": 4},
            ]
        });
        let rows = parse_range_payload(&raw);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].men, Some(5.0));
        assert_eq!(rows[0].total, Some(8.0));
        assert_eq!(rows[1].men, None);
        assert_eq!(rows[1].total, None);
    }

    #[test]
    fn test_range_falls_back_to_data() {
        let raw = json!({"data": [{"ts": "2025-01-01T20:00:00+09:00", "men": 1}]});
        assert_eq!(parse_range_payload(&raw).len(), 1);
    }

    #[test]
    fn test_rows_without_string_ts_dropped() {
        let raw = json!({
            "rows": [
                {"ts": 1735729200, "men": 1},
                {"men": 2},
                "garbage",
                null,
                {"ts": "2025-01-01T21:00:00+09:00", "men": "3"},
            ]
        });
        let rows = parse_range_payload(&raw);
        assert_eq!(rows.len(), 1);
        // Non-numeric values are absent, not zero
        assert_eq!(rows[0].men, None);
    }

    #[test]
    fn test_forecast_rows() {
        let raw = json!({
            "ok": true,
            "data": [{"ts": "2025-01-01T21:00:00+09:00", "men_pred": 6.5, "women_pred": 4, "total_pred": 10.5}]
        });
        let rows = parse_forecast_payload(&raw);
        assert_eq!(rows.len(), 1);
        approx::assert_relative_eq!(rows[0].men_pred.unwrap(), 6.5);
        approx::assert_relative_eq!(rows[0].total_pred.unwrap(), 10.5);
    }

    #[test]
    fn test_forecast_ignores_rows_key() {
        let raw = json!({"rows": [{"ts": "2025-01-01T21:00:00+09:00"}]});
        assert!(parse_forecast_payload(&raw).is_empty());
    }

    #[test]
    fn test_malformed_envelopes() {
        assert!(parse_range_payload(&Value::Null).is_empty());
        assert!(parse_range_payload(&json!([])).is_empty());
        assert!(parse_range_payload(&json!({"rows": "nope"})).is_empty());
        assert!(parse_forecast_payload(&json!({"ok": false, "error": "boom"})).is_empty());
    }
}
