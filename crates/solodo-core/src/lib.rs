//! # SoloDo Core Library
//!
//! This library provides the core logic for the SoloDo study-session
//! tracker. It implements a CLI-first philosophy where all operations are
//! available via a standalone CLI binary, with any graphical shell being
//! a thin layer over the same core library.
//!
//! ## Architecture
//!
//! - **Session Timer Engine**: A wall-clock-based state machine cycling
//!   idle -> studying -> break, driven by a periodic `tick()` from the
//!   caller, with crash/reload recovery from persisted resume state
//! - **Study Log Store**: SQLite-based storage for the tag vocabulary and
//!   the log of completed study sessions, with cascading tag cleanup
//! - **Log Query Engine**: pure date-range and multi-tag filtering over
//!   the retrieved log set
//!
//! ## Key Components
//!
//! - [`SessionTimer`]: Core timer state machine
//! - [`SessionController`]: Orchestration facade tying timer, store, and
//!   alarm together (save-then-transition contract lives here)
//! - [`Database`]: Tag, study log, and resume-state persistence
//! - [`Config`]: Application configuration management

pub mod alarm;
pub mod clock;
pub mod error;
pub mod events;
pub mod query;
pub mod session;
pub mod storage;
pub mod timer;

pub use alarm::AlarmPlayer;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, CoreError, DatabaseError};
pub use events::TimerEvent;
pub use query::{filter_logs, resolve_tag_names, LogFilter, UNKNOWN_TAG_LABEL};
pub use session::SessionController;
pub use storage::{Config, Database, StudyLog, Tag};
pub use timer::{Durations, Mode, ResumeState, SessionTimer};
