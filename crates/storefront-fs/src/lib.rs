//! Filesystem primitives for the storefront download cache.
//!
//! - [`ReplaceFile`]: stage bytes beside a destination, then commit or discard
//! - [`ValidatorStore`]: remember HTTP cache validators for cached files
//! - [`atomic_write`] / [`atomic_read`]: whole-file helpers
//! - [`file_age`]: how long ago a cached file was last refreshed

mod atomic_write;
mod error;
mod replace;
mod validators;

pub use atomic_write::{AtomicWriteOptions, atomic_read, atomic_write};
pub use error::{Error, Result};
pub use replace::ReplaceFile;
pub use validators::{SidecarValidators, ValidatorStore, Validators};

use std::path::Path;
use std::time::{Duration, SystemTime};

/// Time since `path` was last modified.
///
/// Returns [`Duration::MAX`] when the file is missing, unreadable or dated in
/// the future, so that any cache-age comparison treats it as stale.
pub fn file_age(path: impl AsRef<Path>) -> Duration {
    std::fs::metadata(path)
        .and_then(|metadata| metadata.modified())
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok())
        .unwrap_or(Duration::MAX)
}

pub(crate) fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_age_of_fresh_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fresh");
        std::fs::write(&path, "x").unwrap();
        assert!(file_age(&path) < Duration::from_secs(60));
    }

    #[test]
    fn test_file_age_of_missing_file() {
        let dir = tempdir().unwrap();
        assert_eq!(file_age(dir.path().join("missing")), Duration::MAX);
    }

    #[test]
    fn test_file_age_of_future_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("future");
        let file = std::fs::File::create(&path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(3600)).unwrap();
        assert_eq!(file_age(&path), Duration::MAX);
    }

    #[test]
    fn test_parent_dir() {
        assert_eq!(parent_dir(Path::new("file")), Path::new("."));
        assert_eq!(parent_dir(Path::new("a/file")), Path::new("a"));
    }
}
