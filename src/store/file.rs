//! File Store Module
//!
//! Durable store kept as an append-only JSON-lines log.
//!
//! Every mutation is written to the file before the call returns, and the
//! in-memory index changes only after the write succeeds. A failed append is
//! truncated away so it cannot reach disk with a later write. On open the
//! log is replayed into the index; a torn final line left by a crash is cut
//! off with a warning.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::{PersistentStore, StoreError, StoreRecord};

// == Log Record ==
/// One line of the log.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
enum LogRecord {
    Put {
        key: Vec<u8>,
        value: Vec<u8>,
        created_at: DateTime<Utc>,
    },
    Del {
        key: Vec<u8>,
    },
}

#[derive(Debug)]
struct Inner {
    /// Log opened for append, written unbuffered
    log: File,
    index: HashMap<Vec<u8>, StoreRecord>,
    /// Set when a failed append could not be rolled back
    broken: bool,
}

// == File Store ==
/// A [`PersistentStore`] that survives restarts.
#[derive(Debug)]
pub struct FileStore {
    inner: Mutex<Inner>,
    path: PathBuf,
    fsync: bool,
}

impl FileStore {
    // == Open ==
    /// Opens or creates the log at `path` and replays it.
    ///
    /// With `fsync` set, each append is synced to disk before returning.
    pub fn open(path: impl AsRef<Path>, fsync: bool) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let index = replay(&path)?;
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        info!(path = %path.display(), keys = index.len(), "file store opened");

        Ok(Self {
            inner: Mutex::new(Inner {
                log: file,
                index,
                broken: false,
            }),
            path,
            fsync,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Full record for `key`, including its creation time.
    pub fn record(&self, key: &[u8]) -> Option<StoreRecord> {
        self.inner.lock().index.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // == Compact ==
    /// Rewrites the log with one `put` per live key, dropping overwritten
    /// values and deletes.
    pub fn compact(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();

        let tmp = self.path.with_extension("compact");
        {
            let mut out = BufWriter::new(File::create(&tmp)?);
            for (key, record) in &inner.index {
                let line = serde_json::to_vec(&LogRecord::Put {
                    key: key.clone(),
                    value: record.value.clone(),
                    created_at: record.created_at,
                })?;
                out.write_all(&line)?;
                out.write_all(b"\n")?;
            }
            out.flush()?;
            out.get_ref().sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;

        inner.log = OpenOptions::new().append(true).open(&self.path)?;
        inner.broken = false;

        info!(keys = inner.index.len(), "file store compacted");
        Ok(())
    }

    /// Writes one record as a single line. On failure the log is cut back
    /// to its previous length, so a rejected record never becomes durable.
    fn append(&self, inner: &mut Inner, record: &LogRecord) -> Result<(), StoreError> {
        if inner.broken {
            return Err(StoreError::Unavailable(format!(
                "log {} has an unrecoverable partial write",
                self.path.display()
            )));
        }

        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let offset = inner.log.metadata()?.len();
        if let Err(e) = write_line(&mut inner.log, &line, self.fsync) {
            if let Err(rollback) = truncate_to(&self.path, offset) {
                // The rejected bytes may still be in the file; refuse
                // further writes until the log is compacted or reopened.
                inner.broken = true;
                error!(
                    path = %self.path.display(),
                    error = %rollback,
                    "failed to roll back rejected log write"
                );
            } else {
                warn!(path = %self.path.display(), error = %e, "log write failed, rolled back");
            }
            return Err(e.into());
        }
        Ok(())
    }
}

impl PersistentStore for FileStore {
    fn create_or_update(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();

        let created_at = inner
            .index
            .get(key)
            .map(|r| r.created_at)
            .unwrap_or_else(Utc::now);
        let record = LogRecord::Put {
            key: key.to_vec(),
            value: value.to_vec(),
            created_at,
        };
        self.append(&mut inner, &record)?;

        inner.index.insert(
            key.to_vec(),
            StoreRecord {
                value: value.to_vec(),
                created_at,
            },
        );
        Ok(())
    }

    fn read(&self, key: &[u8]) -> Result<Vec<u8>, StoreError> {
        self.inner
            .lock()
            .index
            .get(key)
            .map(|r| r.value.clone())
            .ok_or(StoreError::NotFound)
    }

    fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if !inner.index.contains_key(key) {
            return Err(StoreError::NotFound);
        }

        self.append(&mut inner, &LogRecord::Del { key: key.to_vec() })?;
        inner.index.remove(key);
        Ok(())
    }
}

fn write_line(log: &mut File, line: &[u8], fsync: bool) -> io::Result<()> {
    log.write_all(line)?;
    if fsync {
        log.sync_data()?;
    }
    Ok(())
}

/// Cuts the file at `path` back to `len` bytes through a fresh handle.
fn truncate_to(path: &Path, len: u64) -> io::Result<()> {
    let file = OpenOptions::new().write(true).open(path)?;
    file.set_len(len)?;
    file.sync_data()
}

// == Replay ==
/// Rebuilds the index from the log, truncating a torn tail.
fn replay(path: &Path) -> Result<HashMap<Vec<u8>, StoreRecord>, StoreError> {
    let mut index = HashMap::new();

    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(index),
        Err(e) => return Err(e.into()),
    };

    let mut reader = BufReader::new(file);
    let mut line = String::new();
    let mut valid_len: u64 = 0;
    let mut entries = 0usize;

    loop {
        line.clear();
        let read = reader.read_line(&mut line)?;
        if read == 0 {
            break;
        }

        let complete = line.ends_with('\n');
        let text = line.trim_end();
        if text.is_empty() {
            valid_len += read as u64;
            continue;
        }

        match serde_json::from_str::<LogRecord>(text) {
            Ok(_) if !complete => {
                // Parsed, but the newline never made it; drop it so the
                // next append starts on a fresh line.
                warn!(path = %path.display(), "unterminated final log record, discarding");
                break;
            }
            Ok(LogRecord::Put {
                key,
                value,
                created_at,
            }) => {
                index.insert(key, StoreRecord { value, created_at });
            }
            Ok(LogRecord::Del { key }) => {
                index.remove(&key);
            }
            Err(e) => {
                if complete && has_more(&mut reader)? {
                    return Err(e.into());
                }
                warn!(path = %path.display(), error = %e, "torn final log record, discarding");
                break;
            }
        }
        valid_len += read as u64;
        entries += 1;
    }

    let actual_len = fs::metadata(path)?.len();
    if valid_len < actual_len {
        truncate_to(path, valid_len)?;
    }

    debug!(entries, keys = index.len(), "file store replayed");
    Ok(index)
}

fn has_more(reader: &mut BufReader<File>) -> Result<bool, StoreError> {
    Ok(!reader.fill_buf()?.is_empty())
}
