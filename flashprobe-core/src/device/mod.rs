use std::io::{Read, Write};
use std::path::Path;

use crate::config::ProbeConfig;
use crate::domain::{DeviceTarget, PurgeReport};
use crate::error::Result;

pub mod fs;

pub use fs::FsDevice;

/// The test directory on a target device. All names are plain file names
/// relative to [`DeviceFs::dir`].
pub trait DeviceFs {
    fn dir(&self) -> &Path;

    /// Remove any previous test artifacts and recreate an empty directory.
    fn reset(&self) -> Result<()>;

    /// Open `name` for writing, truncating it. `flush` on the returned writer
    /// must not return until the data reached stable storage.
    fn create(&self, name: &str) -> Result<Box<dyn Write + '_>>;

    fn open(&self, name: &str) -> Result<Box<dyn Read + '_>>;

    fn exists(&self, name: &str) -> bool;

    fn size(&self, name: &str) -> Result<u64>;

    fn remove(&self, name: &str) -> Result<()>;

    /// Delete the whole test directory.
    fn remove_all(&self) -> Result<PurgeReport>;
}

pub enum Backend {
    Fs,
}

pub fn open_device(
    backend: Backend,
    target: &DeviceTarget,
    cfg: &ProbeConfig,
) -> Result<Box<dyn DeviceFs>> {
    match backend {
        Backend::Fs => Ok(Box::new(FsDevice::new(target, cfg))),
    }
}
