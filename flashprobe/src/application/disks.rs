use std::path::Path;

use flashprobe_core::DeviceTarget;
use flashprobe_core::error::{ProbeError, Result};
use sysinfo::Disks;

/// Every mounted filesystem sysinfo can see.
pub fn mounted() -> Vec<DeviceTarget> {
    let disks = Disks::new_with_refreshed_list();
    disks
        .list()
        .iter()
        .map(|d| {
            let name = d.name().to_string_lossy().into_owned();
            DeviceTarget {
                name: if name.is_empty() {
                    d.mount_point().display().to_string()
                } else {
                    name
                },
                root_path: d.mount_point().to_path_buf(),
                total_capacity_bytes: d.total_space(),
                available_bytes: d.available_space(),
                is_removable: d.is_removable(),
            }
        })
        .collect()
}

/// The filesystem holding `path`: the mount with the longest matching prefix.
/// The returned target is rooted at `path` itself so a test can live in a
/// subdirectory of the mount.
pub fn resolve(mounts: &[DeviceTarget], path: &Path) -> Option<DeviceTarget> {
    mounts
        .iter()
        .filter(|m| path.starts_with(&m.root_path))
        .max_by_key(|m| m.root_path.components().count())
        .map(|m| DeviceTarget {
            root_path: path.to_path_buf(),
            ..m.clone()
        })
}

pub fn target_for(path: &Path) -> Result<DeviceTarget> {
    let canonical = path
        .canonicalize()
        .map_err(|e| ProbeError::Config(format!("{}: {e}", path.display())))?;
    if !canonical.is_dir() {
        return Err(ProbeError::Config(format!(
            "{} is not a directory",
            canonical.display()
        )));
    }
    resolve(&mounted(), &canonical).ok_or_else(|| {
        ProbeError::Config(format!(
            "no mounted filesystem contains {}",
            canonical.display()
        ))
    })
}
