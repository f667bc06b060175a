//! Log query engine: date-range and tag filtering over the study log.
//!
//! Pure functions over an already-retrieved log set. Input logs arrive
//! pre-sorted descending by start time (the retrieval boundary orders
//! them); filtering preserves that order and never re-sorts.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

use crate::storage::{StudyLog, Tag};

/// Label rendered for a tag id that no longer resolves to a live tag.
///
/// The deletion cascade should have scrubbed it; finding one at display
/// time is a data-integrity bug worth logging, not hiding.
pub const UNKNOWN_TAG_LABEL: &str = "Unknown Tag";

/// Filter criteria for the log browser.
///
/// Both dates are optional (absent = unbounded on that side) and may be
/// supplied in reverse order; `selected` tag filtering requires a log to
/// carry every selected tag, not merely one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub tag_ids: Vec<i64>,
}

impl LogFilter {
    /// Effective instant bounds, normalized.
    ///
    /// Reversed dates are swapped before use (the entry surface never
    /// prevents typing them backwards). The start boundary clamps to
    /// 00:00:00.000 of its calendar day, the end boundary to 23:59:59.999,
    /// both in UTC to match storage.
    fn effective_bounds(&self) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        let (start, end) = match (self.start_date, self.end_date) {
            (Some(s), Some(e)) if s > e => (Some(e), Some(s)),
            other => other,
        };
        (start.map(day_start), end.map(day_end))
    }

    /// Whether one log passes both the date filter and the tag filter.
    pub fn matches(&self, log: &StudyLog) -> bool {
        let (lower, upper) = self.effective_bounds();
        if let Some(lower) = lower {
            if log.start_time < lower {
                return false;
            }
        }
        if let Some(upper) = upper {
            if log.start_time > upper {
                return false;
            }
        }
        // Superset match: the log must carry every selected tag.
        self.tag_ids.iter().all(|id| log.tag_ids.contains(id))
    }
}

fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn day_end(date: NaiveDate) -> DateTime<Utc> {
    day_start(date) + Duration::days(1) - Duration::milliseconds(1)
}

/// Apply the filter, preserving the input's most-recent-first order.
pub fn filter_logs<'a>(logs: &'a [StudyLog], filter: &LogFilter) -> Vec<&'a StudyLog> {
    logs.iter().filter(|log| filter.matches(log)).collect()
}

/// Resolve a log's tag ids to display names.
///
/// A dangling id renders as [`UNKNOWN_TAG_LABEL`] and logs a warning; it
/// is never silently dropped from the display.
pub fn resolve_tag_names(tag_ids: &[i64], tags: &[Tag]) -> Vec<String> {
    tag_ids
        .iter()
        .map(|id| match tags.iter().find(|tag| tag.id == *id) {
            Some(tag) => tag.name.clone(),
            None => {
                tracing::warn!("study log references deleted tag id {}", id);
                UNKNOWN_TAG_LABEL.to_string()
            }
        })
        .collect()
}
