use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{ProbeError, Result};

/// Local scratch directory for one session. Wiped on open so leftovers from a
/// crashed run never leak into this one; removed again on drop.
#[derive(Debug)]
pub struct StagingDir {
    path: PathBuf,
}

impl StagingDir {
    pub fn open(path: &Path) -> Result<Self> {
        wipe(path).map_err(|e| {
            ProbeError::Staging(format!("clearing {}: {e}", path.display()))
        })?;
        fs::create_dir_all(path).map_err(|e| {
            ProbeError::Staging(format!("creating {}: {e}", path.display()))
        })?;
        debug!(path = %path.display(), "staging directory ready");
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reserve `name` inside the staging directory. The file (if created) is
    /// deleted when the guard drops.
    pub fn file(&self, name: &str) -> StagedFile {
        StagedFile {
            path: self.path.join(name),
        }
    }
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        if let Err(e) = wipe(&self.path) {
            warn!(path = %self.path.display(), error = %e, "failed to remove staging directory");
        }
    }
}

fn wipe(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Scoped staging file; deleted on every exit path.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => {
                warn!(path = %self.path.display(), error = %e, "failed to remove staged file");
            }
            _ => {}
        }
    }
}
