use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::entry::{RatingsEntry, parse_ratings};
use crate::error::{Error, Result};

/// Immutable, sorted view of the ratings at one point in time.
pub type Snapshot = Arc<[RatingsEntry]>;

/// Shared app-id to ratings index.
///
/// Readers take a [`Snapshot`] and search it without holding the lock; a
/// refresh swaps in a whole new snapshot, so a reader never observes a
/// partially built index.
#[derive(Debug, Default)]
pub struct RatingsIndex {
    entries: Mutex<Option<Snapshot>>,
}

impl RatingsIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `entries` as the current index. Entries need not be sorted.
    pub fn replace(&self, mut entries: Vec<RatingsEntry>) {
        entries.sort_by(|a, b| a.app_id.cmp(&b.app_id));
        let count = entries.len();
        *self.lock() = Some(entries.into());
        debug!(count, "ratings index replaced");
    }

    pub fn clear(&self) {
        *self.lock() = None;
    }

    pub fn snapshot(&self) -> Option<Snapshot> {
        self.lock().clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.lock().is_some()
    }

    pub fn len(&self) -> usize {
        self.snapshot().map_or(0, |s| s.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn lookup(&self, app_id: &str) -> Option<RatingsEntry> {
        let snapshot = self.snapshot()?;
        find(&snapshot, app_id).cloned()
    }

    /// Look up the first of `app_ids` that has an entry.
    pub fn lookup_any<'a, I>(&self, app_ids: I) -> Option<RatingsEntry>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let snapshot = self.snapshot()?;
        app_ids.into_iter().find_map(|id| find(&snapshot, id)).cloned()
    }

    /// Parse the ratings document at `path` and install it.
    pub async fn load_file(&self, path: &Path) -> Result<usize> {
        let data = tokio::fs::read(path).await.map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let entries = parse_ratings(&data)?;
        let count = entries.len();
        self.replace(entries);
        Ok(count)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Snapshot>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn find<'s>(entries: &'s [RatingsEntry], app_id: &str) -> Option<&'s RatingsEntry> {
    entries
        .binary_search_by(|e| e.app_id.as_str().cmp(app_id))
        .ok()
        .map(|i| &entries[i])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, five: u32) -> RatingsEntry {
        RatingsEntry::new(id, [0, 0, 0, 0, 0, five])
    }

    #[test]
    fn lookup_before_load_is_none() {
        let index = RatingsIndex::new();
        assert!(!index.is_loaded());
        assert!(index.lookup("app.A").is_none());
    }

    #[test]
    fn lookup_finds_unsorted_input() {
        let index = RatingsIndex::new();
        index.replace(vec![entry("app.C", 3), entry("app.A", 1), entry("app.B", 2)]);

        assert_eq!(index.len(), 3);
        assert_eq!(index.lookup("app.B").unwrap().star_counts[5], 2);
        assert!(index.lookup("app.D").is_none());
    }

    #[test]
    fn lookup_any_takes_first_match() {
        let index = RatingsIndex::new();
        index.replace(vec![entry("org.example.App", 1), entry("org.example.App.desktop", 2)]);

        let found = index
            .lookup_any(["missing", "org.example.App.desktop", "org.example.App"])
            .unwrap();
        assert_eq!(found.app_id, "org.example.App.desktop");
        assert!(index.lookup_any(["x", "y"]).is_none());
    }

    #[test]
    fn snapshot_survives_replace() {
        let index = RatingsIndex::new();
        index.replace(vec![entry("app.A", 1)]);
        let before = index.snapshot().unwrap();

        index.replace(vec![entry("app.B", 2)]);

        assert_eq!(before.len(), 1);
        assert_eq!(before[0].app_id, "app.A");
        assert!(index.lookup("app.A").is_none());
        assert!(index.lookup("app.B").is_some());
    }
}
