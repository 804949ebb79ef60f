//! Per-store, per-day feedback poll.
//!
//! A visitor may vote once per store per day. The chosen option and the
//! running counts are kept in a [`KeyValueStore`] under keys derived from the
//! store slug and the date.

use crate::store::KeyValueStore;
use chrono::NaiveDate;
use megribi_core::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

const KEY_PREFIX: &str = "meguribi_feedback";

/// Poll answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackOption {
    /// Left together with someone.
    Success,
    /// Did not.
    NoSuccess,
    /// The forecast helped.
    Useful,
    /// The forecast did not help.
    Useless,
}

impl FeedbackOption {
    pub const ALL: [FeedbackOption; 4] = [
        FeedbackOption::Success,
        FeedbackOption::NoSuccess,
        FeedbackOption::Useful,
        FeedbackOption::Useless,
    ];

    /// Stored identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            FeedbackOption::Success => "success",
            FeedbackOption::NoSuccess => "no_success",
            FeedbackOption::Useful => "useful",
            FeedbackOption::Useless => "useless",
        }
    }

    /// Parse a stored identifier.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|o| o.as_str() == value)
    }

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            FeedbackOption::Success => "お持ち帰りできた",
            FeedbackOption::NoSuccess => "お持ち帰りできなかった",
            FeedbackOption::Useful => "役に立った",
            FeedbackOption::Useless => "あまり役立たなかった",
        }
    }
}

/// Vote counts per option.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackCounts {
    pub success: u32,
    pub no_success: u32,
    pub useful: u32,
    pub useless: u32,
}

impl FeedbackCounts {
    /// Count for one option.
    pub fn get(&self, option: FeedbackOption) -> u32 {
        match option {
            FeedbackOption::Success => self.success,
            FeedbackOption::NoSuccess => self.no_success,
            FeedbackOption::Useful => self.useful,
            FeedbackOption::Useless => self.useless,
        }
    }

    fn increment(&mut self, option: FeedbackOption) {
        let slot = match option {
            FeedbackOption::Success => &mut self.success,
            FeedbackOption::NoSuccess => &mut self.no_success,
            FeedbackOption::Useful => &mut self.useful,
            FeedbackOption::Useless => &mut self.useless,
        };
        *slot = slot.saturating_add(1);
    }
}

/// Poll state for one store and day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackState {
    /// Option chosen today, if any.
    pub selected: Option<FeedbackOption>,
    pub counts: FeedbackCounts,
}

/// Feedback poll over an injected store.
pub struct FeedbackPoll<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> FeedbackPoll<S> {
    /// Create a poll over a store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Key holding the chosen option.
    pub fn vote_key(store_slug: &str, date: NaiveDate) -> String {
        format!("{}_{}_{}", KEY_PREFIX, store_slug, date.format("%Y-%m-%d"))
    }

    /// Key holding the counts.
    pub fn counts_key(store_slug: &str, date: NaiveDate) -> String {
        format!("{}_counts", Self::vote_key(store_slug, date))
    }

    /// Current state; unreadable values are treated as absent.
    pub fn load(&self, store_slug: &str, date: NaiveDate) -> Result<FeedbackState> {
        let selected = self
            .store
            .get(&Self::vote_key(store_slug, date))?
            .and_then(|v| FeedbackOption::parse(&v));

        let counts = match self.store.get(&Self::counts_key(store_slug, date))? {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(store = store_slug, error = %e, "ignoring unreadable feedback counts");
                FeedbackCounts::default()
            }),
            None => FeedbackCounts::default(),
        };

        Ok(FeedbackState { selected, counts })
    }

    /// Record a vote. A second vote on the same day leaves the state unchanged.
    pub fn vote(&self, store_slug: &str, date: NaiveDate, option: FeedbackOption) -> Result<FeedbackState> {
        let mut state = self.load(store_slug, date)?;
        if state.selected.is_some() {
            return Ok(state);
        }

        state.counts.increment(option);
        state.selected = Some(option);

        self.store.set(&Self::vote_key(store_slug, date), option.as_str())?;
        self.store.set(
            &Self::counts_key(store_slug, date),
            &serde_json::to_string(&state.counts)?,
        )?;
        Ok(state)
    }
}
