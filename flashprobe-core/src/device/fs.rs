use std::fs::{self, File};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::DeviceFs;
use crate::config::ProbeConfig;
use crate::domain::{DeviceTarget, PurgeReport};
use crate::error::{ProbeError, Result};

/// Test directory on a mounted filesystem.
#[derive(Debug, Clone)]
pub struct FsDevice {
    dir: PathBuf,
}

impl FsDevice {
    pub fn new(target: &DeviceTarget, cfg: &ProbeConfig) -> Self {
        Self {
            dir: target.root_path.join(&cfg.test_dir_name),
        }
    }

    fn path_of(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}

/// File writer whose flush syncs data to the medium; write-back caches on
/// removable media would otherwise hide a short device.
struct SyncOnFlush {
    file: File,
    path: PathBuf,
}

impl Write for SyncOnFlush {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }
    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()?;
        self.file.sync_data().map_err(|e| {
            io::Error::new(e.kind(), format!("sync {}: {e}", self.path.display()))
        })
    }
}

impl DeviceFs for FsDevice {
    fn dir(&self) -> &Path {
        &self.dir
    }

    fn reset(&self) -> Result<()> {
        match fs::remove_dir_all(&self.dir) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => {
                return Err(ProbeError::medium(&self.dir, e));
            }
            _ => {}
        }
        fs::create_dir_all(&self.dir).map_err(|e| ProbeError::medium(&self.dir, e))
    }

    fn create(&self, name: &str) -> Result<Box<dyn Write + '_>> {
        let path = self.path_of(name);
        let file = File::create(&path).map_err(|e| ProbeError::medium(&path, e))?;
        Ok(Box::new(SyncOnFlush { file, path }))
    }

    fn open(&self, name: &str) -> Result<Box<dyn Read + '_>> {
        let path = self.path_of(name);
        let file = File::open(&path).map_err(|e| ProbeError::medium(&path, e))?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn exists(&self, name: &str) -> bool {
        self.path_of(name).is_file()
    }

    fn size(&self, name: &str) -> Result<u64> {
        let path = self.path_of(name);
        let md = fs::metadata(&path).map_err(|e| ProbeError::medium(&path, e))?;
        Ok(md.len())
    }

    fn remove(&self, name: &str) -> Result<()> {
        let path = self.path_of(name);
        fs::remove_file(&path).map_err(|e| ProbeError::medium(&path, e))
    }

    fn remove_all(&self) -> Result<PurgeReport> {
        let mut report = PurgeReport::default();
        if !self.dir.exists() {
            return Ok(report);
        }
        for e in WalkDir::new(&self.dir).follow_links(false) {
            let e = e.map_err(|e| ProbeError::Io(io::Error::other(e)))?;
            if e.file_type().is_file() {
                report.files_removed += 1;
                report.bytes_removed += e.metadata().map(|m| m.len()).unwrap_or(0);
            }
        }
        fs::remove_dir_all(&self.dir).map_err(|e| ProbeError::medium(&self.dir, e))?;
        Ok(report)
    }
}
