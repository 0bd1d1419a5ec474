use serde::Serialize;

use crate::capacity::verifier::CapacityVerifier;
use crate::config::ProbeConfig;
use crate::device::DeviceFs;
use crate::error::Result;
use crate::hash::Digest;

#[derive(Clone, Debug, Serialize)]
pub struct LedgerRow {
    pub name: String,
    pub digest: Digest,
    pub present: bool,
    /// On-device size; `None` when absent or unreadable.
    pub size: Option<u64>,
}

/// Ledger entries in write order, annotated with what is on the device now.
pub fn list(device: &dyn DeviceFs, cfg: &ProbeConfig) -> Result<Vec<LedgerRow>> {
    let ledger = CapacityVerifier::new(cfg.clone(), device).load_ledger()?;
    Ok(ledger
        .records()
        .iter()
        .map(|r| {
            let present = device.exists(&r.name);
            LedgerRow {
                name: r.name.clone(),
                digest: r.digest,
                present,
                size: present.then(|| device.size(&r.name).ok()).flatten(),
            }
        })
        .collect())
}
