use std::fs;
use std::io::Write;
use std::path::Path;

use crate::{Error, Result};

#[derive(Clone, Copy, Debug, Default)]
pub struct AtomicWriteOptions {
    pub permissions: Option<u32>,
    pub sync: bool,
}

impl AtomicWriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn permissions(mut self, mode: u32) -> Self {
        self.permissions = Some(mode);
        self
    }

    #[must_use]
    pub fn sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }
}

/// Write `content` to a temporary sibling of `path` and rename it into place.
///
/// Readers of `path` observe either the old content or the new content, never
/// a partially written file.
pub fn atomic_write(
    path: impl AsRef<Path>,
    content: &[u8],
    options: AtomicWriteOptions,
) -> Result<()> {
    let path = path.as_ref();
    let parent = crate::parent_dir(path);
    let write_err = |source| Error::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".storefront.")
        .suffix(".tmp")
        .tempfile_in(parent)
        .map_err(write_err)?;

    tmp.write_all(content).map_err(write_err)?;

    #[cfg(unix)]
    if let Some(mode) = options.permissions {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(tmp.path(), fs::Permissions::from_mode(mode)).map_err(write_err)?;
    }

    if options.sync {
        tmp.as_file().sync_all().map_err(write_err)?;
    }

    tmp.persist(path).map_err(|e| Error::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;

    Ok(())
}

pub fn atomic_read(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    fs::read(path).map_err(|e| Error::Read {
        path: path.to_path_buf(),
        source: e,
    })
}
