//! Session timer implementation.
//!
//! The timer is a wall-clock-based state machine. It does not use
//! internal threads - the caller is responsible for calling `tick()`
//! periodically (once a second in the watch loop).
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Studying -> Break -> Idle
//! ```
//!
//! There is no direct Studying -> Idle transition: a study session always
//! passes through a break. Elapsed time is recomputed from the recorded
//! start instant on every tick, so a process that was suspended or
//! restarted picks the interval back up at the correct offset.
//!
//! ## Usage
//!
//! ```ignore
//! let mut timer = SessionTimer::new(Durations::default());
//! timer.start();
//! // In a loop:
//! timer.tick(); // Returns Some(TimerEvent) at interval expiry
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock};
use crate::events::TimerEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Idle,
    Studying,
    Break,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Idle => "idle",
            Mode::Studying => "studying",
            Mode::Break => "break",
        }
    }

    /// Parse a persisted mode string.
    pub fn parse(s: &str) -> Option<Mode> {
        match s {
            "idle" => Some(Mode::Idle),
            "studying" => Some(Mode::Studying),
            "break" => Some(Mode::Break),
            _ => None,
        }
    }
}

/// Study/break interval lengths, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Durations {
    pub study_secs: i64,
    pub break_secs: i64,
}

impl Durations {
    /// Interval length for a mode. Idle reports the study duration, which
    /// is what the display shows before a session starts.
    pub fn for_mode(&self, mode: Mode) -> i64 {
        match mode {
            Mode::Idle | Mode::Studying => self.study_secs,
            Mode::Break => self.break_secs,
        }
    }
}

impl Default for Durations {
    fn default() -> Self {
        Self {
            study_secs: 25 * 60,
            break_secs: 5 * 60,
        }
    }
}

impl From<&crate::storage::TimerConfig> for Durations {
    fn from(config: &crate::storage::TimerConfig) -> Self {
        Self {
            study_secs: i64::from(config.study_duration_min) * 60,
            break_secs: i64::from(config.break_duration_min) * 60,
        }
    }
}

/// The `(mode, start_instant)` pair persisted whenever the timer is
/// running, cleared whenever it is idle. Derived state only - the engine,
/// not the log, is the source of truth for "currently running".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumeState {
    pub mode: Mode,
    pub start_instant: DateTime<Utc>,
}

/// Core session timer.
///
/// Operates on wall-clock instants - no internal thread. The caller is
/// responsible for calling `tick()` periodically.
#[derive(Debug, Clone)]
pub struct SessionTimer<C: Clock = SystemClock> {
    durations: Durations,
    mode: Mode,
    /// Instant the current episode began. `None` when idle.
    start_instant: Option<DateTime<Utc>>,
    /// One-shot alarm guard, cleared on every transition into a running mode.
    alarm_fired: bool,
    clock: C,
}

impl SessionTimer<SystemClock> {
    /// Create a new idle timer on the system clock.
    pub fn new(durations: Durations) -> Self {
        Self::with_clock(durations, SystemClock)
    }
}

impl<C: Clock> SessionTimer<C> {
    pub fn with_clock(durations: Durations, clock: C) -> Self {
        Self {
            durations,
            mode: Mode::Idle,
            start_instant: None,
            alarm_fired: false,
            clock,
        }
    }

    /// Rebuild a timer from persisted resume state.
    ///
    /// The wall-clock gap since `start_instant` counts against the
    /// interval: time that passed while the process was unloaded is not
    /// given back.
    pub fn with_resume(durations: Durations, clock: C, resume: Option<ResumeState>) -> Self {
        match resume {
            Some(state) if state.mode != Mode::Idle => Self {
                durations,
                mode: state.mode,
                start_instant: Some(state.start_instant),
                alarm_fired: false,
                clock,
            },
            _ => Self::with_clock(durations, clock),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_running(&self) -> bool {
        self.mode != Mode::Idle
    }

    pub fn start_instant(&self) -> Option<DateTime<Utc>> {
        self.start_instant
    }

    pub fn durations(&self) -> Durations {
        self.durations
    }

    /// Current wall-clock instant, as seen by the timer's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Whole seconds since the current episode began; 0 when idle.
    pub fn elapsed_secs(&self) -> i64 {
        match self.start_instant {
            Some(start) => (self.clock.now() - start).num_seconds(),
            None => 0,
        }
    }

    /// Seconds left in the current interval, as a signed value.
    ///
    /// Negative remaining in `Studying` is overtime and is displayed with
    /// a sign rather than clamped; a break never goes negative for long
    /// because `tick()` auto-resets it.
    pub fn remaining_secs(&self) -> i64 {
        self.durations.for_mode(self.mode) - self.elapsed_secs()
    }

    /// The persistable `(mode, start_instant)` pair; `None` when idle.
    pub fn resume_state(&self) -> Option<ResumeState> {
        self.start_instant.map(|start_instant| ResumeState {
            mode: self.mode,
            start_instant,
        })
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> TimerEvent {
        TimerEvent::StateSnapshot {
            mode: self.mode,
            is_running: self.is_running(),
            elapsed_secs: self.elapsed_secs(),
            remaining_secs: self.remaining_secs(),
            start_instant: self.start_instant,
            at: self.clock.now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Idle -> Studying. Returns `None` if a session is already running.
    pub fn start(&mut self) -> Option<TimerEvent> {
        if self.mode != Mode::Idle {
            return None;
        }
        let now = self.clock.now();
        self.mode = Mode::Studying;
        self.start_instant = Some(now);
        self.alarm_fired = false;
        Some(TimerEvent::StudyStarted {
            duration_secs: self.durations.study_secs,
            at: now,
        })
    }

    /// Studying -> Break.
    ///
    /// The caller reads the elapsed time and appends the study log BEFORE
    /// calling this; stop and log-append are deliberately not atomic at
    /// the engine level. See `SessionController::stop`.
    pub fn stop(&mut self) -> Option<TimerEvent> {
        if self.mode != Mode::Studying {
            return None;
        }
        let studied_secs = self.elapsed_secs();
        let now = self.clock.now();
        self.mode = Mode::Break;
        self.start_instant = Some(now);
        self.alarm_fired = false;
        Some(TimerEvent::BreakStarted {
            studied_secs,
            at: now,
        })
    }

    /// Break -> Idle, by explicit user action. Break expiry takes the same
    /// transition automatically inside `tick()`.
    pub fn reset(&mut self) -> Option<TimerEvent> {
        if self.mode != Mode::Break {
            return None;
        }
        self.mode = Mode::Idle;
        self.start_instant = None;
        Some(TimerEvent::TimerReset {
            at: self.clock.now(),
        })
    }

    /// Call once a second.
    ///
    /// Raises the one-shot alarm event the first time the interval runs
    /// out, and auto-resets an expired break. The auto-reset leaves `Idle`,
    /// which never ticks, so alarm and reset each fire at most once per
    /// break episode no matter how many ticks observe `remaining <= 0`.
    pub fn tick(&mut self) -> Option<TimerEvent> {
        match self.mode {
            Mode::Idle => None,
            Mode::Studying => {
                let remaining = self.remaining_secs();
                if remaining <= 0 && !self.alarm_fired {
                    self.alarm_fired = true;
                    return Some(TimerEvent::StudyOvertime {
                        overtime_secs: -remaining,
                        at: self.clock.now(),
                    });
                }
                None
            }
            Mode::Break => {
                if self.remaining_secs() <= 0 {
                    let now = self.clock.now();
                    self.mode = Mode::Idle;
                    self.start_instant = None;
                    return Some(TimerEvent::BreakFinished { at: now });
                }
                None
            }
        }
    }
}
