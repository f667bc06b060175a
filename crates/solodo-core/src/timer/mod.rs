mod engine;
mod format;

pub use engine::{Durations, Mode, ResumeState, SessionTimer};
pub use format::{format_hms, format_signed};
