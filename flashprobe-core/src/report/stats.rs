use crate::domain::{AggregatedSample, SpeedSample};

/// Drop every sample carrying `label` (the quick test).
pub fn exclude(samples: &[SpeedSample], label: &str) -> Vec<SpeedSample> {
    samples.iter().filter(|s| s.label != label).cloned().collect()
}

/// Throughput averaged over bytes rather than over samples. Falls back to the
/// plain mean when every sample is empty. `None` for no samples.
pub fn weighted_mean(samples: &[SpeedSample]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let total: u64 = samples.iter().map(|s| s.size_bytes).sum();
    if total == 0 {
        let sum: f64 = samples.iter().map(|s| s.speed_mbps).sum();
        return Some(sum / samples.len() as f64);
    }
    let acc: f64 = samples
        .iter()
        .map(|s| s.speed_mbps * s.size_bytes as f64)
        .sum();
    Some(acc / total as f64)
}

pub fn min_max(samples: &[SpeedSample]) -> Option<(f64, f64)> {
    samples.iter().fold(None, |acc, s| match acc {
        None => Some((s.speed_mbps, s.speed_mbps)),
        Some((lo, hi)) => Some((lo.min(s.speed_mbps), hi.max(s.speed_mbps))),
    })
}

/// Collapse `samples` into at most `cap` bars. Up to `cap` samples map one to
/// one; beyond that contiguous runs of `ceil(len / cap)` samples form a band
/// labelled `first-last` by the numeric labels it spans.
pub fn aggregate(samples: &[SpeedSample], cap: usize) -> Vec<AggregatedSample> {
    let cap = cap.max(1);
    if samples.len() <= cap {
        return samples
            .iter()
            .map(|s| AggregatedSample {
                label: s.label.clone(),
                total_size: s.size_bytes,
                weighted_avg_speed: s.speed_mbps,
                min_speed: s.speed_mbps,
                max_speed: s.speed_mbps,
            })
            .collect();
    }

    let group = samples.len().div_ceil(cap);
    samples
        .chunks(group)
        .enumerate()
        .map(|(gi, band)| {
            let (lo, hi) = min_max(band).unwrap_or((0.0, 0.0));
            let mean = weighted_mean(band).unwrap_or(0.0).clamp(lo, hi);
            AggregatedSample {
                label: band_label(band, gi + 1),
                total_size: band.iter().map(|s| s.size_bytes).sum(),
                weighted_avg_speed: mean,
                min_speed: lo,
                max_speed: hi,
            }
        })
        .collect()
}

fn band_label(band: &[SpeedSample], ordinal: usize) -> String {
    let ids: Vec<u64> = band
        .iter()
        .filter_map(|s| s.label.parse::<u64>().ok())
        .collect();
    match (ids.iter().min(), ids.iter().max()) {
        (Some(a), Some(b)) if a == b => a.to_string(),
        (Some(a), Some(b)) => format!("{a}-{b}"),
        _ => ordinal.to_string(),
    }
}
