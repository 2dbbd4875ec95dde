use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;

use crate::{AtomicWriteOptions, Error, Result, atomic_write};

/// HTTP cache validators remembered for a locally cached file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validators {
    pub etag: Option<String>,
    pub last_modified: Option<SystemTime>,
}

impl Validators {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn etag(mut self, etag: impl Into<String>) -> Self {
        let etag = etag.into();
        self.etag = (!etag.is_empty()).then_some(etag);
        self
    }

    #[must_use]
    pub fn last_modified(mut self, last_modified: SystemTime) -> Self {
        self.last_modified = Some(last_modified);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.etag.is_none() && self.last_modified.is_none()
    }
}

/// Where the validators of cached files are kept.
pub trait ValidatorStore: Send + Sync {
    /// Validators for `path`, or none if the file is not cached.
    fn load(&self, path: &Path) -> Validators;

    /// Remember the server's ETag for `path`; `None` forgets it.
    fn store_etag(&self, path: &Path, etag: Option<&str>) -> Result<()>;
}

/// Keeps the ETag in a hidden `.<name>.etag` file beside the cached file and
/// uses the cached file's own modification time as its Last-Modified date.
///
/// The modification time is only meaningful because cached files are never
/// written except by a download, so it records when the server was last
/// asked for the resource.
#[derive(Clone, Copy, Debug, Default)]
pub struct SidecarValidators;

impl SidecarValidators {
    pub fn sidecar_path(path: &Path) -> Option<PathBuf> {
        let name = path.file_name()?.to_string_lossy();
        Some(crate::parent_dir(path).join(format!(".{name}.etag")))
    }
}

impl ValidatorStore for SidecarValidators {
    fn load(&self, path: &Path) -> Validators {
        let Ok(metadata) = fs::metadata(path) else {
            return Validators::default();
        };

        let etag = Self::sidecar_path(path)
            .and_then(|sidecar| fs::read_to_string(sidecar).ok())
            .map(|etag| etag.trim().to_string())
            .filter(|etag| !etag.is_empty());

        Validators {
            etag,
            last_modified: metadata.modified().ok(),
        }
    }

    fn store_etag(&self, path: &Path, etag: Option<&str>) -> Result<()> {
        let sidecar = Self::sidecar_path(path).ok_or_else(|| Error::NoFileName {
            path: path.to_path_buf(),
        })?;

        match etag.filter(|etag| !etag.is_empty()) {
            Some(etag) => {
                debug!(path = %path.display(), etag, "storing etag");
                atomic_write(&sidecar, etag.as_bytes(), AtomicWriteOptions::new())
            }
            None => match fs::remove_file(&sidecar) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(source) => Err(Error::Write {
                    path: sidecar,
                    source,
                }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_has_no_validators() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ratings.json");
        std::fs::write(SidecarValidators::sidecar_path(&path).unwrap(), "\"abc\"").unwrap();

        assert!(SidecarValidators.load(&path).is_empty());
    }

    #[test]
    fn stored_etag_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ratings.json");
        std::fs::write(&path, "{}").unwrap();

        SidecarValidators.store_etag(&path, Some("\"abc\"")).unwrap();
        let validators = SidecarValidators.load(&path);

        assert_eq!(validators.etag.as_deref(), Some("\"abc\""));
        assert!(validators.last_modified.is_some());
    }

    #[test]
    fn storing_none_forgets_etag() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ratings.json");
        std::fs::write(&path, "{}").unwrap();

        SidecarValidators.store_etag(&path, Some("v1")).unwrap();
        SidecarValidators.store_etag(&path, None).unwrap();
        SidecarValidators.store_etag(&path, Some("")).unwrap();

        assert_eq!(SidecarValidators.load(&path).etag, None);
    }

    #[test]
    fn empty_etag_is_ignored() {
        assert_eq!(Validators::new().etag("").etag, None);
        assert_eq!(Validators::new().etag("x").etag.as_deref(), Some("x"));
    }
}
