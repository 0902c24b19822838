//! Durable dedup ledger.
//!
//! Each scope directory holds one append-only `cache.txt` listing the
//! source identities already handled there, one per line. The file is
//! the only record: every check re-reads it.
//!
//! Operations on the same scope directory are serialized by a lock owned
//! by that directory. Different directories do not contend.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use thiserror::Error;

use crate::{debug, log};

/// Default ledger file name inside a scope directory.
pub const LEDGER_FILE: &str = "cache.txt";

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("scope directory does not exist: {}", .0.display())]
    MissingScope(PathBuf),

    #[error("failed to open ledger `{}`", .0.display())]
    Open(PathBuf, #[source] io::Error),

    #[error("failed to read ledger `{}`", .0.display())]
    Read(PathBuf, #[source] io::Error),

    #[error("failed to append to ledger `{}`", .0.display())]
    Append(PathBuf, #[source] io::Error),
}

/// Per-directory record of source identities already processed.
pub struct DedupLedger {
    file_name: String,
    locks: DashMap<PathBuf, Arc<Mutex<()>>>,
}

impl DedupLedger {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            locks: DashMap::new(),
        }
    }

    /// Path of the ledger file for a scope directory.
    pub fn ledger_path(&self, scope_dir: &Path) -> PathBuf {
        scope_dir.join(&self.file_name)
    }

    /// Returns true if `identity` was already recorded under `scope_dir`,
    /// otherwise records it and returns false.
    ///
    /// Ledger failures never stop the caller: they are logged and the
    /// identity is reported as not seen, so the work still happens.
    pub fn seen_or_record(&self, identity: &str, scope_dir: &Path) -> bool {
        match self.try_seen_or_record(identity, scope_dir) {
            Ok(seen) => seen,
            Err(e) => {
                log!("error"; "{:#}", anyhow::Error::new(e));
                false
            }
        }
    }

    pub fn try_seen_or_record(
        &self,
        identity: &str,
        scope_dir: &Path,
    ) -> Result<bool, LedgerError> {
        let lock = self.lock_for(scope_dir);
        let _guard = lock.lock();

        if !scope_dir.is_dir() {
            return Err(LedgerError::MissingScope(scope_dir.to_path_buf()));
        }

        let path = self.ledger_path(scope_dir);
        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&path)
            .map_err(|e| LedgerError::Open(path.clone(), e))?;

        let scan = scan(&file, identity).map_err(|e| LedgerError::Read(path.clone(), e))?;
        if scan.found {
            debug!("ledger"; "match found for \"{}\" in {}", identity, path.display());
            return Ok(true);
        }

        // One write, so the entry lands whole
        let mut entry = Vec::with_capacity(identity.len() + 2);
        if scan.unterminated {
            entry.push(b'\n');
        }
        entry.extend_from_slice(identity.as_bytes());
        entry.push(b'\n');
        file.write_all(&entry).map_err(|e| LedgerError::Append(path.clone(), e))?;
        debug!("ledger"; "appended \"{}\" to {}", identity, path.display());
        Ok(false)
    }

    /// Read-only lookup. A missing ledger file means nothing is recorded.
    #[cfg(test)]
    pub fn contains(&self, identity: &str, scope_dir: &Path) -> Result<bool, LedgerError> {
        let lock = self.lock_for(scope_dir);
        let _guard = lock.lock();

        let path = self.ledger_path(scope_dir);
        match File::open(&path) {
            Ok(file) => scan(&file, identity)
                .map(|scan| scan.found)
                .map_err(|e| LedgerError::Read(path, e)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(LedgerError::Open(path, e)),
        }
    }

    /// Lock guarding one scope directory, created on first use.
    fn lock_for(&self, scope_dir: &Path) -> Arc<Mutex<()>> {
        let key = scope_dir
            .canonicalize()
            .unwrap_or_else(|_| scope_dir.to_path_buf());
        self.locks.entry(key).or_default().value().clone()
    }
}

impl Default for DedupLedger {
    fn default() -> Self {
        Self::new(LEDGER_FILE)
    }
}

/// Result of reading a ledger through.
struct Scan {
    found: bool,
    /// The file is non-empty and its last line lacks a `\n`.
    unterminated: bool,
}

/// Scan a ledger line by line for an exact byte match.
///
/// Lines are compared as raw bytes, so a line that is not UTF-8 is just
/// a line that never matches.
fn scan(file: &File, identity: &str) -> io::Result<Scan> {
    let mut reader = BufReader::new(file);
    let mut line = Vec::new();
    let mut unterminated = false;

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            return Ok(Scan {
                found: false,
                unterminated,
            });
        }
        unterminated = line.last() != Some(&b'\n');
        if !unterminated {
            line.pop();
        }
        if line == identity.as_bytes() {
            return Ok(Scan {
                found: true,
                unterminated,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::thread;
    use tempfile::TempDir;

    #[test]
    fn test_first_check_records_then_hits() {
        let dir = TempDir::new().unwrap();
        let ledger = DedupLedger::default();

        assert!(!ledger.seen_or_record("icon", dir.path()));
        assert!(ledger.seen_or_record("icon", dir.path()));
        assert!(ledger.seen_or_record("icon", dir.path()));

        let content = fs::read_to_string(dir.path().join(LEDGER_FILE)).unwrap();
        assert_eq!(content, "icon\n");
    }

    #[test]
    fn test_survives_new_instance() {
        let dir = TempDir::new().unwrap();
        assert!(!DedupLedger::default().seen_or_record("logo", dir.path()));
        // A fresh ledger (as after a restart) sees the persisted entry
        assert!(DedupLedger::default().seen_or_record("logo", dir.path()));
    }

    #[test]
    fn test_exact_line_match_only() {
        let dir = TempDir::new().unwrap();
        let ledger = DedupLedger::default();

        assert!(!ledger.seen_or_record("icon-large", dir.path()));
        assert!(!ledger.seen_or_record("icon", dir.path()));
        assert!(!ledger.seen_or_record("large", dir.path()));
        assert!(ledger.contains("icon", dir.path()).unwrap());
    }

    #[test]
    fn test_scope_directories_are_independent() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        let ledger = DedupLedger::default();

        assert!(!ledger.seen_or_record("icon", a.path()));
        assert!(!ledger.seen_or_record("icon", b.path()));
        assert!(ledger.seen_or_record("icon", a.path()));
    }

    #[test]
    fn test_missing_scope_fails_closed() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let ledger = DedupLedger::default();

        assert!(matches!(
            ledger.try_seen_or_record("icon", &missing),
            Err(LedgerError::MissingScope(_))
        ));
        // Degrades to "not seen", and stays that way
        assert!(!ledger.seen_or_record("icon", &missing));
        assert!(!ledger.seen_or_record("icon", &missing));
        assert!(!missing.exists());
    }

    #[test]
    fn test_scope_that_is_a_file_fails_closed() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("plain");
        fs::write(&file, "x").unwrap();

        assert!(!DedupLedger::default().seen_or_record("icon", &file));
    }

    #[test]
    fn test_contains_without_ledger_file() {
        let dir = TempDir::new().unwrap();
        assert!(!DedupLedger::default().contains("icon", dir.path()).unwrap());
    }

    #[test]
    fn test_concurrent_records_once() {
        let dir = TempDir::new().unwrap();
        let ledger = Arc::new(DedupLedger::default());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                let path = dir.path().to_path_buf();
                thread::spawn(move || ledger.seen_or_record("shared", &path))
            })
            .collect();
        let fresh = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|seen| !seen)
            .count();

        assert_eq!(fresh, 1);
        let content = fs::read_to_string(dir.path().join(LEDGER_FILE)).unwrap();
        assert_eq!(content.lines().count(), 1);
    }

    #[test]
    fn test_non_utf8_line_does_not_block_lookup() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(LEDGER_FILE);
        fs::write(&path, b"caf\xe9\nlogo\n").unwrap();
        let ledger = DedupLedger::default();

        assert!(ledger.seen_or_record("logo", dir.path()));
        assert!(!ledger.seen_or_record("icon", dir.path()));
        assert!(ledger.seen_or_record("icon", dir.path()));
        assert_eq!(fs::read(&path).unwrap(), b"caf\xe9\nlogo\nicon\n");
    }

    #[test]
    fn test_unterminated_last_line_is_kept_separate() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(LEDGER_FILE);
        fs::write(&path, "icon").unwrap();
        let ledger = DedupLedger::default();

        assert!(!ledger.seen_or_record("logo", dir.path()));
        assert_eq!(fs::read_to_string(&path).unwrap(), "icon\nlogo\n");
        assert!(ledger.seen_or_record("icon", dir.path()));
        assert!(ledger.seen_or_record("logo", dir.path()));
    }

    #[test]
    fn test_custom_file_name() {
        let dir = TempDir::new().unwrap();
        let ledger = DedupLedger::new("seen.lst");
        ledger.seen_or_record("icon", dir.path());
        assert!(dir.path().join("seen.lst").exists());
        assert!(!dir.path().join(LEDGER_FILE).exists());
    }
}
