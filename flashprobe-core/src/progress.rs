use tracing::info;

use crate::config::ProbeConfig;

/// Coarse byte-progress reporter. Emits one `info` event per `step` bytes and
/// stays silent for totals at or below `threshold`, so reporting never paces
/// the I/O it decorates.
#[derive(Debug)]
pub struct Progress {
    label: &'static str,
    name: String,
    total: u64,
    step: u64,
    done: u64,
    next_mark: u64,
    enabled: bool,
}

impl Progress {
    pub fn new(label: &'static str, name: &str, total: u64, threshold: u64, step: u64) -> Self {
        let step = step.max(1);
        Self {
            label,
            name: name.to_string(),
            total,
            step,
            done: 0,
            next_mark: step,
            enabled: total > threshold,
        }
    }

    pub fn from_config(label: &'static str, name: &str, total: u64, cfg: &ProbeConfig) -> Self {
        Self::new(label, name, total, cfg.progress_threshold, cfg.progress_step)
    }

    /// A reporter that never emits.
    pub fn silent() -> Self {
        Self::new("", "", 0, u64::MAX, u64::MAX)
    }

    pub fn advance(&mut self, n: u64) {
        self.done += n;
        if !self.enabled || self.done < self.next_mark {
            return;
        }
        while self.next_mark <= self.done {
            self.next_mark = self.next_mark.saturating_add(self.step);
        }
        let pct = if self.total == 0 {
            100.0
        } else {
            self.done as f64 * 100.0 / self.total as f64
        };
        info!(
            stage = self.label,
            file = %self.name,
            done = self.done,
            total = self.total,
            "{:.1}%",
            pct.min(100.0)
        );
    }

    pub fn done(&self) -> u64 {
        self.done
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}
