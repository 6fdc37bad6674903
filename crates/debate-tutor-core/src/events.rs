use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{Cursor, TimerState};

/// Every state change of a walkthrough produces an Event.
/// The CLI prints them; timer events are also broadcast to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    ActivitySelected {
        stage_index: usize,
        activity_index: usize,
        activity_id: String,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    /// `next()` was requested at the last activity of the last stage.
    ScenarioCompleted {
        at: DateTime<Utc>,
    },
    ActivityTimeChanged {
        stage_index: usize,
        activity_index: usize,
        time_minutes: u32,
        stage_total: u32,
        at: DateTime<Utc>,
    },
    TimerStarted {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerTicked {
        remaining_secs: u64,
    },
    /// One-shot signal: the running countdown reached zero.
    TimerExpired {
        at: DateTime<Utc>,
    },
    StateSnapshot {
        cursor: Cursor,
        stage_title: String,
        activity_id: String,
        activity_title: String,
        timer: TimerState,
        progress_pct: f64,
        at: DateTime<Utc>,
    },
}
