//! Session orchestration: wires the timer engine to the study log store.
//!
//! The controller owns the running timer, the database, and the alarm
//! cue, and enforces the save-then-transition contract: when a study
//! interval is stopped, its log entry is durably appended BEFORE the mode
//! flips to break. A failed append aborts the stop and leaves the timer
//! in `Studying`; resume-state writes are derived state and never block a
//! transition.

use crate::alarm::AlarmPlayer;
use crate::clock::{Clock, SystemClock};
use crate::error::CoreError;
use crate::events::TimerEvent;
use crate::storage::{Config, Database};
use crate::timer::{Durations, Mode, SessionTimer};

pub struct SessionController<C: Clock = SystemClock> {
    timer: SessionTimer<C>,
    db: Database,
    alarm: AlarmPlayer,
}

impl SessionController<SystemClock> {
    /// Build a controller on the system clock, resuming any persisted
    /// in-flight timer state.
    pub fn new(db: Database, config: &Config) -> Self {
        Self::with_clock(db, config, SystemClock)
    }
}

impl<C: Clock> SessionController<C> {
    pub fn with_clock(db: Database, config: &Config, clock: C) -> Self {
        let resume = db.load_resume_state().unwrap_or_else(|e| {
            tracing::warn!("failed to load timer resume state: {}", e);
            None
        });
        let timer = SessionTimer::with_resume(Durations::from(&config.timer), clock, resume);
        let alarm = AlarmPlayer::from_config(&config.notifications);
        Self { timer, db, alarm }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn mode(&self) -> Mode {
        self.timer.mode()
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_running()
    }

    pub fn remaining_secs(&self) -> i64 {
        self.timer.remaining_secs()
    }

    pub fn snapshot(&self) -> TimerEvent {
        self.timer.snapshot()
    }

    pub fn timer(&self) -> &SessionTimer<C> {
        &self.timer
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start a study interval.
    pub fn start(&mut self) -> Option<TimerEvent> {
        let event = self.timer.start();
        if event.is_some() {
            self.persist_resume();
        }
        event
    }

    /// Stop the running study interval and enter the break.
    ///
    /// Appends the study log first; the break transition only happens
    /// after a successful append. A zero-length interval is not logged
    /// (the transition still proceeds). Tag names that no longer resolve
    /// are dropped by the store.
    pub fn stop(&mut self, tag_names: &[String], memo: Option<&str>) -> Result<Option<TimerEvent>, CoreError> {
        if self.timer.mode() != Mode::Studying {
            return Ok(None);
        }
        let start = match self.timer.start_instant() {
            Some(start) => start,
            None => return Ok(None),
        };

        if self.timer.elapsed_secs() > 0 {
            let end = self.timer.now();
            self.db.append_log(start, Some(end), tag_names, memo)?;
        }

        let event = self.timer.stop();
        if event.is_some() {
            self.persist_resume();
        }
        Ok(event)
    }

    /// End the break early and return to idle.
    pub fn reset(&mut self) -> Option<TimerEvent> {
        let event = self.timer.reset();
        if event.is_some() {
            self.persist_resume();
        }
        event
    }

    /// Drive the timer one tick.
    ///
    /// Plays the alarm cue on expiry events and persists the auto-reset
    /// out of an expired break.
    pub fn tick(&mut self) -> Option<TimerEvent> {
        let event = self.timer.tick();
        match &event {
            Some(TimerEvent::StudyOvertime { .. }) => self.alarm.play(),
            Some(TimerEvent::BreakFinished { .. }) => {
                self.alarm.play();
                self.persist_resume();
            }
            _ => {}
        }
        event
    }

    /// Write or clear the resume-state record for the current mode.
    ///
    /// Resume state is derived, never authoritative; failures here are
    /// logged and do not fail the transition that triggered them.
    fn persist_resume(&self) {
        let result = match self.timer.resume_state() {
            Some(state) => self.db.save_resume_state(&state),
            None => self.db.clear_resume_state(),
        };
        if let Err(e) = result {
            tracing::warn!("failed to persist timer resume state: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
    }

    fn silent_config() -> Config {
        let mut config = Config::default();
        config.notifications.enabled = false;
        config
    }

    fn controller() -> (SessionController<ManualClock>, ManualClock) {
        let clock = ManualClock::new(t0());
        let db = Database::open_memory().unwrap();
        let controller = SessionController::with_clock(db, &silent_config(), clock.clone());
        (controller, clock)
    }

    #[test]
    fn stop_appends_log_before_break() {
        let (mut controller, clock) = controller();
        controller.db().add_tag("Math").unwrap();

        controller.start();
        clock.advance(Duration::seconds(1500));
        let event = controller.stop(&["Math".into()], None).unwrap();
        assert!(matches!(event, Some(TimerEvent::BreakStarted { studied_secs: 1500, .. })));

        let logs = controller.db().all_logs().unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].start_time, t0());
        assert_eq!(logs[0].end_time, Some(t0() + Duration::seconds(1500)));
        assert_eq!(controller.mode(), Mode::Break);
        assert_eq!(controller.remaining_secs(), 300);
    }

    #[test]
    fn zero_elapsed_stop_skips_the_log() {
        let (mut controller, _clock) = controller();
        controller.start();
        controller.stop(&[], None).unwrap();
        assert!(controller.db().all_logs().unwrap().is_empty());
        assert_eq!(controller.mode(), Mode::Break);
    }

    #[test]
    fn stop_outside_studying_is_a_noop() {
        let (mut controller, _clock) = controller();
        assert!(controller.stop(&[], None).unwrap().is_none());
        assert_eq!(controller.mode(), Mode::Idle);
    }

    #[test]
    fn failed_append_leaves_timer_studying() {
        let (mut controller, clock) = controller();
        controller.start();
        clock.advance(Duration::seconds(60));

        // Break the log table underneath the controller.
        controller
            .db()
            .conn()
            .execute_batch("DROP TABLE study_logs;")
            .unwrap();

        let result = controller.stop(&[], None);
        assert!(result.is_err());
        assert_eq!(controller.mode(), Mode::Studying);
    }

    #[test]
    fn transitions_maintain_resume_state() {
        let (mut controller, clock) = controller();

        controller.start();
        let state = controller.db().load_resume_state().unwrap().unwrap();
        assert_eq!(state.mode, Mode::Studying);
        assert_eq!(state.start_instant, t0());

        clock.advance(Duration::seconds(100));
        controller.stop(&[], None).unwrap();
        let state = controller.db().load_resume_state().unwrap().unwrap();
        assert_eq!(state.mode, Mode::Break);

        controller.reset();
        assert!(controller.db().load_resume_state().unwrap().is_none());
    }

    #[test]
    fn break_expiry_clears_resume_state() {
        let (mut controller, clock) = controller();
        controller.start();
        clock.advance(Duration::seconds(10));
        controller.stop(&[], None).unwrap();

        clock.advance(Duration::seconds(301));
        assert!(matches!(controller.tick(), Some(TimerEvent::BreakFinished { .. })));
        assert_eq!(controller.mode(), Mode::Idle);
        assert!(controller.db().load_resume_state().unwrap().is_none());
    }
}
