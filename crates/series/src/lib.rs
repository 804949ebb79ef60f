//! Series computation for the MEGRIBI dashboard.
//!
//! This crate handles:
//! - Night window selection (19:00 to 05:00 local, spanning midnight)
//! - Actual/forecast reconciliation into one chart series
//! - Snapshot headline numbers (now, peak, has-data)
//! - Megribi score and good-window detection

pub mod window;
pub mod reconciler;
pub mod snapshot;
pub mod score;

pub use window::{filter_rows_within, filter_within_window, parse_ymd, NightClock, MAX_NIGHT_HOURS};
pub use reconciler::NightWindowReconciler;
pub use snapshot::{has_any_data, pick_current_snapshot, pick_peak, SnapshotBuilder};
pub use score::{megribi_score, GoodWindow, MegribiScorer, ScorePoint};
