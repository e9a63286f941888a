//! # Audit store
//!
//! Append-only persistence for adverse-decision records. The file-backed
//! store keeps a JSON-lines record log plus a sidecar meta file holding the
//! next id; the id is reserved in meta *before* the record is written, so a
//! crash between the two skips an id rather than reusing one. Both writes
//! are fsynced.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::observability::Logger;

use super::errors::{AuditError, AuditResult};
use super::record::{AuditRecord, NewAuditEntry, Stats};

const RECORDS_FILE: &str = "records.jsonl";
const META_FILE: &str = "meta.json";

/// Append-only audit log.
///
/// Implementations assign ids that are strictly increasing and never reused,
/// even across a purge, and timestamps that never run backwards within one
/// store handle.
pub trait AuditStore: Send + Sync {
    /// Prepare backing storage. Idempotent.
    fn init_schema(&self) -> AuditResult<()>;

    /// Append one record, returning it with its assigned id and timestamp.
    fn append(&self, entry: NewAuditEntry) -> AuditResult<AuditRecord>;

    /// Records newest-first, `offset` applied before `limit`.
    fn list(&self, limit: usize, offset: usize) -> AuditResult<Vec<AuditRecord>>;

    /// Aggregates over all records.
    fn stats(&self) -> AuditResult<Stats>;

    /// Delete all records, returning how many were removed. Ids are not
    /// reset.
    fn purge(&self) -> AuditResult<u64>;
}

#[derive(Debug, Serialize, Deserialize)]
struct Meta {
    next_id: u64,
}

struct Inner {
    next_id: u64,
    last_timestamp: DateTime<Utc>,
}

/// Durable file-backed store: `records.jsonl` + `meta.json` in one
/// directory.
pub struct FileAuditStore {
    dir: PathBuf,
    inner: Mutex<Inner>,
}

impl FileAuditStore {
    /// Open (or create) a store in `dir`, reconciling the meta file with
    /// whatever the record log actually contains.
    pub fn open(dir: impl Into<PathBuf>) -> AuditResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| AuditError::io("creating audit directory", e))?;

        let meta_next = match fs::read(dir.join(META_FILE)) {
            Ok(bytes) => match serde_json::from_slice::<Meta>(&bytes) {
                Ok(meta) => meta.next_id,
                Err(e) => {
                    Logger::warn("audit.meta_unreadable", &[("error", &e.to_string())]);
                    1
                }
            },
            Err(_) => 1,
        };

        let mut max_id = 0u64;
        let mut last_timestamp = DateTime::<Utc>::MIN_UTC;
        for record in read_records(&dir.join(RECORDS_FILE))? {
            max_id = max_id.max(record.id);
            last_timestamp = last_timestamp.max(record.timestamp);
        }

        let store = Self {
            dir,
            inner: Mutex::new(Inner {
                next_id: meta_next.max(max_id + 1),
                last_timestamp,
            }),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn records_path(&self) -> PathBuf {
        self.dir.join(RECORDS_FILE)
    }

    fn meta_path(&self) -> PathBuf {
        self.dir.join(META_FILE)
    }

    /// Write meta via a temp file and rename, fsyncing before the swap.
    fn persist_meta(&self, next_id: u64) -> AuditResult<()> {
        let tmp = self.dir.join(format!("{}.tmp", META_FILE));
        let bytes = serde_json::to_vec(&Meta { next_id })?;
        let mut file =
            File::create(&tmp).map_err(|e| AuditError::io("creating meta temp file", e))?;
        file.write_all(&bytes)
            .map_err(|e| AuditError::io("writing meta", e))?;
        file.sync_all()
            .map_err(|e| AuditError::io("syncing meta", e))?;
        fs::rename(&tmp, self.meta_path()).map_err(|e| AuditError::io("installing meta", e))?;
        Ok(())
    }
}

impl AuditStore for FileAuditStore {
    fn init_schema(&self) -> AuditResult<()> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| AuditError::io("creating audit directory", e))?;
        if !self.records_path().exists() {
            File::create(self.records_path())
                .map_err(|e| AuditError::io("creating record log", e))?;
        }
        if !self.meta_path().exists() {
            let next_id = self.inner.lock().unwrap_or_else(|p| p.into_inner()).next_id;
            self.persist_meta(next_id)?;
        }
        Ok(())
    }

    fn append(&self, entry: NewAuditEntry) -> AuditResult<AuditRecord> {
        let mut inner = self.inner.lock().unwrap_or_else(|p| p.into_inner());

        let id = inner.next_id;
        // Reserve the id durably before the record exists: a crash here
        // skips an id, it never hands it out twice.
        self.persist_meta(id + 1)?;

        // Clock may step backwards (NTP); clamp so record order and
        // timestamp order agree.
        let timestamp = Utc::now().max(inner.last_timestamp);
        let record = entry.into_record(id, timestamp);
        let line = serde_json::to_string(&record)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.records_path())
            .map_err(|e| AuditError::io("opening record log", e))?;
        file.write_all(line.as_bytes())
            .map_err(|e| AuditError::io("appending record", e))?;
        file.write_all(b"\n")
            .map_err(|e| AuditError::io("appending record", e))?;
        file.sync_all()
            .map_err(|e| AuditError::io("syncing record log", e))?;

        inner.next_id = id + 1;
        inner.last_timestamp = timestamp;
        Ok(record)
    }

    fn list(&self, limit: usize, offset: usize) -> AuditResult<Vec<AuditRecord>> {
        let _inner = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        let mut records = read_records(&self.records_path())?;
        records.reverse();
        Ok(records.into_iter().skip(offset).take(limit).collect())
    }

    fn stats(&self) -> AuditResult<Stats> {
        let _inner = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        let records = read_records(&self.records_path())?;
        Ok(Stats::from_records(&records))
    }

    fn purge(&self) -> AuditResult<u64> {
        let _inner = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        let purged = read_records(&self.records_path())?.len() as u64;
        let file = File::create(self.records_path())
            .map_err(|e| AuditError::io("truncating record log", e))?;
        file.sync_all()
            .map_err(|e| AuditError::io("syncing record log", e))?;
        Ok(purged)
    }
}

/// Read every parseable record; a torn or corrupt line is skipped with a
/// warning rather than poisoning the whole log.
fn read_records(path: &Path) -> AuditResult<Vec<AuditRecord>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(AuditError::io("opening record log", e)),
    };

    let mut records = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| AuditError::io("reading record log", e))?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<AuditRecord>(&line) {
            Ok(record) => records.push(record),
            Err(e) => Logger::warn(
                "audit.skip_line",
                &[
                    ("error", e.to_string().as_str()),
                    ("line", (index + 1).to_string().as_str()),
                ],
            ),
        }
    }
    Ok(records)
}

/// In-memory store for tests and embedding.
#[derive(Default)]
pub struct MemoryAuditStore {
    inner: Mutex<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    records: Vec<AuditRecord>,
    next_id: u64,
    last_timestamp: Option<DateTime<Utc>>,
}

impl MemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuditStore for MemoryAuditStore {
    fn init_schema(&self) -> AuditResult<()> {
        Ok(())
    }

    fn append(&self, entry: NewAuditEntry) -> AuditResult<AuditRecord> {
        let mut inner = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        inner.next_id += 1;
        let id = inner.next_id;
        let timestamp = match inner.last_timestamp {
            Some(last) => Utc::now().max(last),
            None => Utc::now(),
        };
        let record = entry.into_record(id, timestamp);
        inner.last_timestamp = Some(timestamp);
        inner.records.push(record.clone());
        Ok(record)
    }

    fn list(&self, limit: usize, offset: usize) -> AuditResult<Vec<AuditRecord>> {
        let inner = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        Ok(inner
            .records
            .iter()
            .rev()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    fn stats(&self) -> AuditResult<Stats> {
        let inner = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        Ok(Stats::from_records(&inner.records))
    }

    fn purge(&self) -> AuditResult<u64> {
        let mut inner = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        let purged = inner.records.len() as u64;
        inner.records.clear();
        Ok(purged)
    }
}
