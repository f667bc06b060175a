//! Integration tests for the study log store and the query engine.
//!
//! Verifies the tag-deletion cascade against an on-disk database and the
//! interaction between scrubbed logs and the log browser's filters.

use chrono::{DateTime, TimeZone, Utc};
use solodo_core::{filter_logs, Database, LogFilter};

fn ts(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, day, hour, 0, 0).unwrap()
}

#[test]
fn deleting_a_tag_scrubs_it_from_every_referencing_log() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open_at(&dir.path().join("solodo.db")).unwrap();

    let math = db.add_tag("Math").unwrap();
    let physics = db.add_tag("Physics").unwrap();

    for day in 1..=5 {
        db.append_log(
            ts(day, 9),
            Some(ts(day, 10)),
            &["Math".into(), "Physics".into()],
            None,
        )
        .unwrap();
    }

    assert_eq!(db.delete_tag("Math").unwrap(), Some(5));

    let logs = db.all_logs().unwrap();
    assert_eq!(logs.len(), 5);
    for log in &logs {
        assert!(!log.tag_ids.contains(&math));
        assert_eq!(log.tag_ids, vec![physics]);
    }
    assert!(db.tag_id_by_name("Math").unwrap().is_none());
}

#[test]
fn scrubbed_log_is_reachable_by_date_but_not_by_dead_tag() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open_at(&dir.path().join("solodo.db")).unwrap();

    let math = db.add_tag("Math").unwrap();
    db.append_log(ts(10, 9), Some(ts(10, 10)), &["Math".into()], None)
        .unwrap();

    db.delete_tag("Math").unwrap();

    let logs = db.all_logs().unwrap();
    assert_eq!(logs.len(), 1);
    assert!(logs[0].tag_ids.is_empty());

    // No tag filter: the log still shows up.
    assert_eq!(filter_logs(&logs, &LogFilter::default()).len(), 1);

    // Filtering on the deleted tag's id can never match it again.
    let by_dead_tag = LogFilter {
        tag_ids: vec![math],
        ..Default::default()
    };
    assert!(filter_logs(&logs, &by_dead_tag).is_empty());
}

#[test]
fn vocabulary_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("solodo.db");

    {
        let db = Database::open_at(&path).unwrap();
        db.add_tag("Math").unwrap();
        db.add_tag("History").unwrap();
    }

    let db = Database::open_at(&path).unwrap();
    let names: Vec<_> = db.all_tags().unwrap().into_iter().map(|t| t.name).collect();
    assert_eq!(names, vec!["Math".to_string(), "History".to_string()]);
}
