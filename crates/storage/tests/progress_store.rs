#![forbid(unsafe_code)]

use sd_core::{ExerciseId, ProgressRecord, ProgressStore, StoreError};
use sd_storage::{AttemptOutcome, RecordAttemptRequest, SqliteProgressStore, StorageError};
use std::path::PathBuf;

fn temp_dir(test_name: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let dir = base.join(format!("sd_storage_{test_name}_{pid}_{nonce}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn sample_record() -> ProgressRecord {
    let mut record = ProgressRecord::default();
    record.mark_completed(ExerciseId::new(1));
    record.mark_completed(ExerciseId::new(2));
    record.set_last_active(ExerciseId::new(3));
    record
}

#[test]
fn record_round_trips_across_reopen() {
    let storage_dir = temp_dir("record_round_trips_across_reopen");

    {
        let mut store = SqliteProgressStore::open(&storage_dir).expect("open store");
        assert_eq!(
            store.load_record().expect("initial load"),
            ProgressRecord::default()
        );
        store.save_record(&sample_record()).expect("save");
    }

    let store = SqliteProgressStore::open(&storage_dir).expect("reopen store");
    assert_eq!(store.load_record().expect("load"), sample_record());
    assert_eq!(store.storage_dir(), storage_dir.as_path());
}

#[test]
fn save_overwrites_the_single_record() {
    let storage_dir = temp_dir("save_overwrites_the_single_record");
    let mut store = SqliteProgressStore::open(&storage_dir).expect("open store");

    store.save_record(&sample_record()).expect("first save");

    let mut updated = sample_record();
    updated.mark_completed(ExerciseId::new(3));
    updated.set_last_active(ExerciseId::new(4));
    store.save_record(&updated).expect("second save");

    assert_eq!(store.load_record().expect("load"), updated);
}

#[test]
fn corrupt_record_is_reported_not_swallowed() {
    let storage_dir = temp_dir("corrupt_record_is_reported_not_swallowed");
    {
        let mut store = SqliteProgressStore::open(&storage_dir).expect("open store");
        store.save_record(&sample_record()).expect("save");
    }

    let conn =
        rusqlite::Connection::open(storage_dir.join("sqldrill.db")).expect("open raw connection");
    conn.execute("UPDATE progress SET record_json = '{broken'", [])
        .expect("corrupt the record");
    drop(conn);

    let mut store = SqliteProgressStore::open(&storage_dir).expect("reopen store");
    assert!(matches!(
        store.load_record(),
        Err(StorageError::Json(_))
    ));
    // At the session boundary the same failure reads as a corrupt record.
    assert!(matches!(store.load(), Err(StoreError::Corrupt(_))));
}

#[test]
fn attempt_journal_appends_and_lists_in_seq_order() {
    let storage_dir = temp_dir("attempt_journal_appends_and_lists_in_seq_order");
    let mut store = SqliteProgressStore::open(&storage_dir).expect("open store");

    let first = store
        .record_attempt(RecordAttemptRequest {
            exercise_id: ExerciseId::new(1),
            ts_ms: 100,
            outcome: AttemptOutcome::Entered,
            detail: None,
        })
        .expect("record entered");
    let second = store
        .record_attempt(RecordAttemptRequest {
            exercise_id: ExerciseId::new(1),
            ts_ms: 200,
            outcome: AttemptOutcome::Mismatch,
            detail: Some("SELECT 1;".to_string()),
        })
        .expect("record mismatch");
    let third = store
        .record_attempt(RecordAttemptRequest {
            exercise_id: ExerciseId::new(2),
            ts_ms: 300,
            outcome: AttemptOutcome::Passed,
            detail: Some("SELECT 2;".to_string()),
        })
        .expect("record passed");
    assert!(first.seq < second.seq && second.seq < third.seq);

    let all = store.list_attempts(None, 10).expect("list all");
    let seqs: Vec<i64> = all.iter().map(|row| row.seq).collect();
    assert_eq!(seqs, vec![first.seq, second.seq, third.seq]);

    let for_one = store
        .list_attempts(Some(ExerciseId::new(1)), 10)
        .expect("list filtered");
    assert_eq!(for_one.len(), 2);
    assert!(
        for_one
            .iter()
            .all(|row| row.exercise_id == ExerciseId::new(1))
    );
    assert_eq!(for_one[1].outcome, AttemptOutcome::Mismatch);
    assert_eq!(for_one[1].detail.as_deref(), Some("SELECT 1;"));

    // A tight limit keeps the newest window, still oldest first within it.
    let capped = store.list_attempts(None, 1).expect("list capped");
    assert_eq!(capped.len(), 1);
    assert_eq!(capped[0].seq, third.seq);
}

#[test]
fn clear_record_keeps_the_journal() {
    let storage_dir = temp_dir("clear_record_keeps_the_journal");
    let mut store = SqliteProgressStore::open(&storage_dir).expect("open store");

    store.save_record(&sample_record()).expect("save");
    store
        .record_attempt(RecordAttemptRequest {
            exercise_id: ExerciseId::new(1),
            ts_ms: 100,
            outcome: AttemptOutcome::Passed,
            detail: None,
        })
        .expect("record attempt");

    assert!(store.clear_record().expect("clear"));
    assert_eq!(
        store.load_record().expect("load"),
        ProgressRecord::default()
    );
    assert_eq!(store.list_attempts(None, 10).expect("list").len(), 1);
    assert!(!store.clear_record().expect("second clear"));
}

#[test]
fn schema_is_versioned_in_meta() {
    let storage_dir = temp_dir("schema_is_versioned_in_meta");
    let _store = SqliteProgressStore::open(&storage_dir).expect("open store");

    let conn =
        rusqlite::Connection::open(storage_dir.join("sqldrill.db")).expect("open raw connection");
    let version: String = conn
        .query_row(
            "SELECT value FROM meta WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .expect("schema_version present");
    assert_eq!(version, "v1");
}
