use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::Mode;

/// Every timer state change produces an event.
/// The CLI prints them; the watch loop uses them to drive the alarm cue.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TimerEvent {
    StudyStarted {
        duration_secs: i64,
        at: DateTime<Utc>,
    },
    BreakStarted {
        studied_secs: i64,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    /// A study interval ran out; the alarm signal, raised once per episode.
    /// The interval keeps counting into overtime.
    StudyOvertime {
        overtime_secs: i64,
        at: DateTime<Utc>,
    },
    /// A break interval ran out; the engine returned to idle.
    BreakFinished {
        at: DateTime<Utc>,
    },
    StateSnapshot {
        mode: Mode,
        is_running: bool,
        elapsed_secs: i64,
        remaining_secs: i64,
        start_instant: Option<DateTime<Utc>>,
        at: DateTime<Utc>,
    },
}
