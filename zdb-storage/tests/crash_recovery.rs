//! Crash-recovery tests for the Database facade: anything committed via
//! `set`/`delete` before a `close` must be observable after reopening the
//! same path, reconstructed entirely from the WAL.

use tempfile::tempdir;
use zdb_storage::Database;

#[test]
fn committed_writes_survive_close_and_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("graph.db");

    {
        let mut db = Database::open_default(&path).unwrap();
        db.set(1, b"alpha").unwrap();
        db.set(2, b"beta").unwrap();
        db.close().unwrap();
    }

    let mut db = Database::open_default(&path).unwrap();
    assert_eq!(db.get(1).unwrap(), Some(b"alpha".to_vec()));
    assert_eq!(db.get(2).unwrap(), Some(b"beta".to_vec()));
}

#[test]
fn reopen_without_explicit_close_still_replays_wal() {
    // Dropping a Database without calling close() still leaves a durable
    // WAL on disk (every set/delete appends before touching page 0), so a
    // fresh open must reconstruct the same state.
    let dir = tempdir().unwrap();
    let path = dir.path().join("graph.db");

    {
        let mut db = Database::open_default(&path).unwrap();
        db.set(10, b"x").unwrap();
        db.set(20, b"y").unwrap();
        db.delete(10).unwrap();
    }

    let mut db = Database::open_default(&path).unwrap();
    assert_eq!(db.get(10).unwrap(), None);
    assert_eq!(db.get(20).unwrap(), Some(b"y".to_vec()));
}

#[test]
fn overwriting_a_key_keeps_the_latest_value_across_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("graph.db");

    {
        let mut db = Database::open_default(&path).unwrap();
        db.set(1, b"first").unwrap();
        db.set(1, b"second").unwrap();
        db.set(1, b"third").unwrap();
        db.close().unwrap();
    }

    let mut db = Database::open_default(&path).unwrap();
    assert_eq!(db.get(1).unwrap(), Some(b"third".to_vec()));
}

#[test]
fn delete_of_a_never_written_key_is_idempotent_across_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("graph.db");

    {
        let mut db = Database::open_default(&path).unwrap();
        db.delete(999).unwrap();
        db.close().unwrap();
    }

    let mut db = Database::open_default(&path).unwrap();
    assert_eq!(db.get(999).unwrap(), None);
    db.set(999, b"now exists").unwrap();
    assert_eq!(db.get(999).unwrap(), Some(b"now exists".to_vec()));
}

#[test]
fn for_each_after_reopen_visits_keys_in_ascending_order() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("graph.db");

    {
        let mut db = Database::open_default(&path).unwrap();
        for key in [5, 1, 4, 2, 3] {
            db.set(key, format!("v{key}").as_bytes()).unwrap();
        }
        db.close().unwrap();
    }

    let mut db = Database::open_default(&path).unwrap();
    let mut seen = Vec::new();
    db.for_each(|k, _v| seen.push(k)).unwrap();
    assert_eq!(seen, vec![1, 2, 3, 4, 5]);
}

#[test]
fn range_after_reopen_respects_bounds() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("graph.db");

    {
        let mut db = Database::open_default(&path).unwrap();
        for key in 0..10u64 {
            db.set(key, b"v").unwrap();
        }
        db.close().unwrap();
    }

    let mut db = Database::open_default(&path).unwrap();
    let mut seen = Vec::new();
    db.range(3, 6, |k, _v| seen.push(k)).unwrap();
    assert_eq!(seen, vec![3, 4, 5, 6]);
}
