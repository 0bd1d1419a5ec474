// Shared test helpers

#![allow(dead_code)]

use std::io::{self, Read, Write};
use std::path::Path;

use flashprobe_core::device::{DeviceFs, FsDevice};
use flashprobe_core::domain::{DeviceTarget, PurgeReport};
use flashprobe_core::error::{ProbeError, Result};
use flashprobe_core::ProbeConfig;

pub const KIB: u64 = 1024;

/// Small sizes so a full write/verify cycle runs in milliseconds.
pub fn small_config(root: &Path) -> ProbeConfig {
    ProbeConfig {
        chunk_size: 10 * KIB,
        quick_test_size: 2 * KIB,
        buffer_size: 4096,
        copy_buffer_size: 1000,
        hash_block_size: 3000,
        safety_margin: 1.0,
        staging_dir: root.join("stage"),
        ..ProbeConfig::default()
    }
}

pub fn target(root: &Path, available: u64) -> DeviceTarget {
    let mount = root.join("mnt");
    std::fs::create_dir_all(&mount).expect("mount dir");
    DeviceTarget {
        name: "SIMULATED".into(),
        root_path: mount,
        total_capacity_bytes: available,
        available_bytes: available,
        is_removable: true,
    }
}

pub fn chunk_index(name: &str) -> Option<usize> {
    name.strip_prefix("test_")?.strip_suffix(".bin")?.parse().ok()
}

/// Device that accepts chunk files below `fail_from` and fails writes to the
/// rest part-way through, like a card whose real capacity ran out. Reads of
/// `fail_read` break off mid-stream; `fail_purge` makes deletion fail.
pub struct FailingDevice {
    pub inner: FsDevice,
    pub fail_from: Option<usize>,
    pub fail_quick: bool,
    pub fail_read: Option<&'static str>,
    pub fail_purge: bool,
}

impl FailingDevice {
    pub fn new(inner: FsDevice) -> Self {
        Self {
            inner,
            fail_from: None,
            fail_quick: false,
            fail_read: None,
            fail_purge: false,
        }
    }

    fn rejects(&self, name: &str) -> bool {
        if name == "quicktest.bin" {
            return self.fail_quick;
        }
        match (chunk_index(name), self.fail_from) {
            (Some(i), Some(k)) => i >= k,
            _ => false,
        }
    }
}

struct FailAfter<W: Write> {
    inner: W,
    left: usize,
}

impl<W: Write> Write for FailAfter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.left == 0 {
            return Err(io::Error::other("no space left on device (simulated)"));
        }
        let n = buf.len().min(self.left);
        let k = self.inner.write(&buf[..n])?;
        self.left -= k;
        Ok(k)
    }
    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

struct BreakAfter<R: Read> {
    inner: R,
    left: usize,
}

impl<R: Read> Read for BreakAfter<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.left == 0 {
            return Err(io::Error::other("input/output error (simulated)"));
        }
        let n = buf.len().min(self.left);
        let k = self.inner.read(&mut buf[..n])?;
        self.left -= k;
        Ok(k)
    }
}

impl DeviceFs for FailingDevice {
    fn dir(&self) -> &Path {
        self.inner.dir()
    }
    fn reset(&self) -> Result<()> {
        self.inner.reset()
    }
    fn create(&self, name: &str) -> Result<Box<dyn Write + '_>> {
        let w = self.inner.create(name)?;
        if self.rejects(name) {
            Ok(Box::new(FailAfter { inner: w, left: 1500 }))
        } else {
            Ok(w)
        }
    }
    fn open(&self, name: &str) -> Result<Box<dyn Read + '_>> {
        let r = self.inner.open(name)?;
        if self.fail_read == Some(name) {
            Ok(Box::new(BreakAfter { inner: r, left: 2500 }))
        } else {
            Ok(r)
        }
    }
    fn exists(&self, name: &str) -> bool {
        self.inner.exists(name)
    }
    fn size(&self, name: &str) -> Result<u64> {
        self.inner.size(name)
    }
    fn remove(&self, name: &str) -> Result<()> {
        self.inner.remove(name)
    }
    fn remove_all(&self) -> Result<PurgeReport> {
        if self.fail_purge {
            return Err(ProbeError::medium(
                self.inner.dir(),
                io::Error::other("read-only file system (simulated)"),
            ));
        }
        self.inner.remove_all()
    }
}

pub fn is_format(e: &ProbeError) -> bool {
    matches!(e, ProbeError::Format(_))
}
