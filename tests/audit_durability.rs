//! Durability and identity guarantees of the file-backed audit store across
//! process restarts and partial writes.

use std::fs::OpenOptions;
use std::io::Write;

use riskgate::audit::{AuditStore, FileAuditStore, NewAuditEntry};
use riskgate::subject::Subject;

fn entry(reason: &str) -> NewAuditEntry {
    NewAuditEntry::new(Subject::new().with("cibil_score", 480.0), reason)
        .with_debt_to_income(55.0)
        .with_notified(true)
        .with_probability(Some(0.7))
}

#[test]
fn records_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = FileAuditStore::open(dir.path()).unwrap();
        store.append(entry("first")).unwrap();
        store.append(entry("second")).unwrap();
    }

    let store = FileAuditStore::open(dir.path()).unwrap();
    let records = store.list(10, 0).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].reason, "second");
    assert_eq!(records[1].reason, "first");

    let stats = store.stats().unwrap();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.notified_count, 2);
}

#[test]
fn ids_stay_monotonic_across_reopen_and_purge() {
    let dir = tempfile::tempdir().unwrap();
    let first_batch_max = {
        let store = FileAuditStore::open(dir.path()).unwrap();
        store.append(entry("a")).unwrap();
        store.append(entry("b")).unwrap().id
    };

    let store = FileAuditStore::open(dir.path()).unwrap();
    assert_eq!(store.purge().unwrap(), 2);
    let after_purge = store.append(entry("c")).unwrap().id;
    assert!(after_purge > first_batch_max);

    // And again after another restart.
    drop(store);
    let store = FileAuditStore::open(dir.path()).unwrap();
    let after_reopen = store.append(entry("d")).unwrap().id;
    assert!(after_reopen > after_purge);
}

#[test]
fn reserved_but_unwritten_id_is_skipped_not_reused() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = FileAuditStore::open(dir.path()).unwrap();
        store.append(entry("before crash")).unwrap();
    }

    // Model a crash between the meta write and the record write: the meta
    // file already points past an id that never made it into the log.
    std::fs::write(dir.path().join("meta.json"), b"{\"next_id\":10}").unwrap();

    let store = FileAuditStore::open(dir.path()).unwrap();
    let record = store.append(entry("after crash")).unwrap();
    assert_eq!(record.id, 10);
    assert_eq!(store.stats().unwrap().total, 2);
}

#[test]
fn torn_trailing_write_does_not_poison_the_log() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = FileAuditStore::open(dir.path()).unwrap();
        store.append(entry("intact")).unwrap();
        store.append(entry("also intact")).unwrap();
    }

    let mut file = OpenOptions::new()
        .append(true)
        .open(dir.path().join("records.jsonl"))
        .unwrap();
    file.write_all(b"{\"id\":3,\"timestamp\":\"2026-").unwrap();

    let store = FileAuditStore::open(dir.path()).unwrap();
    let records = store.list(10, 0).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(store.stats().unwrap().total, 2);

    // Appends keep working past the torn tail.
    let next = store.append(entry("recovered")).unwrap();
    assert_eq!(next.id, 3);
    assert_eq!(store.list(10, 0).unwrap().len(), 3);
}

#[test]
fn unreadable_meta_falls_back_to_log_contents() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = FileAuditStore::open(dir.path()).unwrap();
        store.append(entry("a")).unwrap();
        store.append(entry("b")).unwrap();
    }

    std::fs::write(dir.path().join("meta.json"), b"not json").unwrap();

    let store = FileAuditStore::open(dir.path()).unwrap();
    let record = store.append(entry("c")).unwrap();
    assert_eq!(record.id, 3);
}

#[test]
fn timestamps_never_decrease_in_append_order() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileAuditStore::open(dir.path()).unwrap();
    for i in 0..10 {
        store.append(entry(&format!("r{}", i))).unwrap();
    }

    let mut records = store.list(100, 0).unwrap();
    records.reverse(); // oldest first
    for pair in records.windows(2) {
        assert!(pair[1].timestamp >= pair[0].timestamp);
        assert!(pair[1].id > pair[0].id);
    }
}
