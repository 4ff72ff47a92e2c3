//! Recent-file store - bounded local persistence of uploaded file bytes.
//!
//! Keeps at most the 5 most recent files, one per date, as
//! `{date, fileName, data(base64)}` entries in one JSON file under a
//! dot-directory. Every write is load -> insert -> prune -> save, so the
//! store never exceeds the cap after any sequence of writes. Single
//! process only; concurrent writers are not coordinated.

use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{CacheError, CacheResult};

/// Directory where the store lives (relative to current dir).
const DEFAULT_STORE_DIR: &str = ".shelfload";

/// File name of the JSON store inside the store directory.
const STORE_FILE: &str = "recent-files.json";

/// Maximum number of entries kept after a write.
pub const MAX_RECENT_FILES: usize = 5;

/// One cached file: raw bytes as base64, keyed by date.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentFile {
    pub date: NaiveDate,
    pub file_name: String,
    data: String,
}

impl RecentFile {
    pub fn new(date: NaiveDate, file_name: impl Into<String>, bytes: &[u8]) -> Self {
        Self { date, file_name: file_name.into(), data: B64.encode(bytes) }
    }

    /// Decode the stored bytes.
    pub fn bytes(&self) -> CacheResult<Vec<u8>> {
        B64.decode(&self.data).map_err(|e| CacheError::Decode(e.to_string()))
    }

    /// Size of the stored payload in bytes.
    pub fn byte_len(&self) -> usize {
        // 4 base64 chars encode 3 bytes; padding rounds the estimate down.
        self.data.len() / 4 * 3
    }
}

/// Disk-backed recent-file store.
pub struct RecentFileStore {
    path: PathBuf,
}

impl RecentFileStore {
    /// Store in the default dot-directory.
    pub fn new() -> Self {
        Self::with_dir(DEFAULT_STORE_DIR)
    }

    /// Store in a custom directory.
    pub fn with_dir(dir: impl AsRef<Path>) -> Self {
        Self { path: dir.as_ref().join(STORE_FILE) }
    }

    /// Load all entries, oldest first. A missing store is empty, not an
    /// error.
    pub fn load(&self) -> CacheResult<Vec<RecentFile>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)?;
        let mut entries: Vec<RecentFile> = serde_json::from_str(&content)?;
        entries.sort_by_key(|e| e.date);
        Ok(entries)
    }

    /// Record a file for `date`, replacing any entry with the same date,
    /// then prune to the [`MAX_RECENT_FILES`] most recent dates and save.
    ///
    /// Returns the entries that survive the prune.
    pub fn record(
        &self,
        date: NaiveDate,
        file_name: &str,
        bytes: &[u8],
    ) -> CacheResult<Vec<RecentFile>> {
        let mut entries = self.load()?;
        entries.retain(|e| e.date != date);
        entries.push(RecentFile::new(date, file_name, bytes));
        entries.sort_by_key(|e| e.date);

        let keep_from = entries.len().saturating_sub(MAX_RECENT_FILES);
        let kept = entries.split_off(keep_from);

        self.save(&kept)?;
        Ok(kept)
    }

    /// Re-apply the prune without adding anything.
    pub fn prune(&self) -> CacheResult<Vec<RecentFile>> {
        let mut entries = self.load()?;
        let keep_from = entries.len().saturating_sub(MAX_RECENT_FILES);
        let kept = entries.split_off(keep_from);
        self.save(&kept)?;
        Ok(kept)
    }

    fn save(&self, entries: &[RecentFile]) -> CacheResult<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let content = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl Default for RecentFileStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    #[test]
    fn test_missing_store_is_empty() {
        let dir = tempdir().unwrap();
        let store = RecentFileStore::with_dir(dir.path());
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_bytes_roundtrip() {
        let dir = tempdir().unwrap();
        let store = RecentFileStore::with_dir(dir.path());

        store.record(date(1), "stock.csv", b"sku,qty\n1,2\n").unwrap();
        let entries = store.load().unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].file_name, "stock.csv");
        assert_eq!(entries[0].bytes().unwrap(), b"sku,qty\n1,2\n");
    }

    #[test]
    fn test_never_exceeds_cap() {
        let dir = tempdir().unwrap();
        let store = RecentFileStore::with_dir(dir.path());

        for day in 1..=7 {
            let kept = store.record(date(day), "f.csv", b"x").unwrap();
            assert!(kept.len() <= MAX_RECENT_FILES);
        }

        // After 7 distinct dates, exactly the 5 most recent remain.
        let entries = store.load().unwrap();
        let dates: Vec<NaiveDate> = entries.iter().map(|e| e.date).collect();
        assert_eq!(dates, (3..=7).map(date).collect::<Vec<_>>());
    }

    #[test]
    fn test_out_of_order_writes_keep_most_recent_dates() {
        let dir = tempdir().unwrap();
        let store = RecentFileStore::with_dir(dir.path());

        for day in [9, 2, 7, 1, 8, 3, 6] {
            store.record(date(day), "f.csv", b"x").unwrap();
        }

        let dates: Vec<u32> = store
            .load()
            .unwrap()
            .iter()
            .map(|e| e.date.format("%d").to_string().parse().unwrap())
            .collect();
        assert_eq!(dates, vec![3, 6, 7, 8, 9]);
    }

    #[test]
    fn test_same_date_replaces() {
        let dir = tempdir().unwrap();
        let store = RecentFileStore::with_dir(dir.path());

        store.record(date(1), "morning.csv", b"a").unwrap();
        store.record(date(1), "evening.csv", b"b").unwrap();

        let entries = store.load().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].file_name, "evening.csv");
        assert_eq!(entries[0].bytes().unwrap(), b"b");
    }

    #[test]
    fn test_prune_enforces_cap_on_legacy_store() {
        let dir = tempdir().unwrap();
        let store = RecentFileStore::with_dir(dir.path());

        // Write an over-long store by hand, as an old version might have.
        let entries: Vec<RecentFile> =
            (1..=9).map(|d| RecentFile::new(date(d), "f.csv", b"x")).collect();
        fs::create_dir_all(dir.path()).unwrap();
        fs::write(
            dir.path().join(STORE_FILE),
            serde_json::to_string(&entries).unwrap(),
        )
        .unwrap();

        let kept = store.prune().unwrap();
        assert_eq!(kept.len(), MAX_RECENT_FILES);
        assert_eq!(store.load().unwrap().len(), MAX_RECENT_FILES);
    }
}
