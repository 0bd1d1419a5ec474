//! Text bar chart of per-chunk throughput.
//!
//! Each bar is solid up to its (band) mean, light between mean and max, with
//! `T` / `┴` whiskers at the max and min rows. A dashed line marks the overall
//! size-weighted mean across bars and gaps.

use std::fmt::Write as _;

use crate::config::ProbeConfig;
use crate::domain::{AggregatedSample, SpeedSample};
use crate::report::stats::{aggregate, exclude, min_max, weighted_mean};

const BAR_WIDTH: usize = 2;
const GAP_WIDTH: usize = 5;
const LEGEND_PER_ROW: usize = 3;
const LEGEND_COL: usize = 30;

#[derive(Clone, Debug)]
pub struct ChartOptions {
    pub title: String,
    pub unit: String,
    pub max_bars: usize,
    pub height: usize,
}

impl ChartOptions {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            unit: "MB/s".to_string(),
            max_bars: 10,
            height: 16,
        }
    }

    pub fn from_config(title: impl Into<String>, cfg: &ProbeConfig) -> Self {
        Self {
            max_bars: cfg.max_display_bars,
            height: cfg.chart_height,
            ..Self::new(title)
        }
    }
}

/// Top of the vertical scale: 10% above the larger of the observed max and
/// the mean, rounded up to a multiple of 5.
pub fn scale_top(observed_max: f64, mean: f64) -> f64 {
    // 50.0 * 1.1 is 55.000000000000007; drop the noise before ceil.
    let padded = (observed_max.max(mean) * 1.1 * 1e9).round() / 1e9;
    (padded / 5.0).ceil() * 5.0
}

/// Render `samples` (minus any labelled `exclude_label`). Returns an empty
/// string when nothing is left to plot.
pub fn render(samples: &[SpeedSample], exclude_label: &str, opts: &ChartOptions) -> String {
    let samples = exclude(samples, exclude_label);
    let (Some(mean), Some((lo, hi))) = (weighted_mean(&samples), min_max(&samples)) else {
        return String::new();
    };
    let bars = aggregate(&samples, opts.max_bars);
    let grouped = samples.len() > opts.max_bars.max(1);
    let unit = &opts.unit;
    let rows = opts.height.max(2);

    let mut out = String::new();
    let _ = writeln!(out, "{}", opts.title);
    let _ = writeln!(out, "{}", "=".repeat(opts.title.chars().count()));
    let _ = writeln!(out, "Min: {lo:.2} {unit}, Max: {hi:.2} {unit}");
    let _ = writeln!(out, "Mean: {mean:.2} {unit}");
    if grouped {
        let _ = writeln!(
            out,
            "({} samples grouped into {} bars)",
            samples.len(),
            bars.len()
        );
        write_legend(&mut out, &bars);
    }
    out.push('\n');

    let top = scale_top(hi, mean);
    let range = if top > 0.0 { top } else { 1.0 };
    let level = |v: f64| -> usize {
        let h = (v / range * (rows - 1) as f64).round();
        h.clamp(0.0, (rows - 1) as f64) as usize
    };
    let mean_row = level(mean);
    let heights: Vec<(usize, usize, usize)> = bars
        .iter()
        .map(|b| {
            (
                level(b.weighted_avg_speed),
                level(b.min_speed),
                level(b.max_speed),
            )
        })
        .collect();

    for y in (0..rows).rev() {
        let speed = y as f64 / (rows - 1) as f64 * range;
        let _ = write!(out, "{speed:>6.1} {unit} │");
        for (i, &(bar, min, max)) in heights.iter().enumerate() {
            let glyph = if y == max {
                'T'
            } else if y == min && min != bar {
                '┴'
            } else if y <= bar {
                '█'
            } else if y <= max {
                '░'
            } else if y == mean_row {
                '─'
            } else {
                ' '
            };
            for _ in 0..BAR_WIDTH {
                out.push(glyph);
            }
            if i + 1 < heights.len() {
                let fill = if y == mean_row { '─' } else { ' ' };
                for _ in 0..GAP_WIDTH {
                    out.push(fill);
                }
            }
        }
        out.push('\n');
    }

    // Axis, ticks and labels line up under the `│` of the value column.
    let indent = format!("{:>6.1} {unit} ", 0.0).chars().count();
    let n = bars.len();
    let axis_len = n * BAR_WIDTH + n.saturating_sub(1) * GAP_WIDTH;
    let _ = writeln!(out, "{}└{}→", " ".repeat(indent), "─".repeat(axis_len));

    let labels: Vec<(String, Option<String>)> = bars.iter().map(|b| split_label(&b.label)).collect();
    let mut ticks = " ".repeat(indent + 1);
    for (i, (_, end)) in labels.iter().enumerate() {
        ticks.push(if end.is_some() { '┬' } else { '│' });
        ticks.push_str(&" ".repeat(BAR_WIDTH - 1));
        if i + 1 < n {
            ticks.push_str(&" ".repeat(GAP_WIDTH));
        }
    }
    let _ = writeln!(out, "{}", ticks.trim_end());

    let (top_line, bottom_line) = label_lines(&labels);
    let pad = " ".repeat(indent + 1);
    let _ = writeln!(out, "{pad}{top_line}");
    if labels.iter().any(|(_, end)| end.is_some()) {
        let _ = writeln!(out, "{pad}{bottom_line}");
    }

    out.push('\n');
    let _ = writeln!(out, "─── Overall mean: {mean:.2} {unit}");
    let _ = writeln!(out, "█ Solid blocks end at each bar's mean");
    let _ = writeln!(out, "░ Light blocks span mean to max");
    let _ = writeln!(out, "T┴ Whiskers mark each bar's max and min");
    out
}

fn split_label(label: &str) -> (String, Option<String>) {
    match label.split_once('-') {
        Some((a, b)) => (a.to_string(), Some(b.to_string())),
        None => (label.to_string(), None),
    }
}

fn write_legend(out: &mut String, bars: &[AggregatedSample]) {
    out.push_str("\nBars:\n");
    for (i, b) in bars.iter().enumerate() {
        let item = match split_label(&b.label) {
            (a, Some(z)) => format!("{a}-{z} = chunks {a} to {z}"),
            (a, None) => format!("{a} = chunk {a}"),
        };
        let _ = write!(out, "{item:<width$}", width = LEGEND_COL);
        if (i + 1) % LEGEND_PER_ROW == 0 {
            out.push('\n');
        }
    }
    if bars.len() % LEGEND_PER_ROW != 0 {
        out.push('\n');
    }
}

/// Start labels on the first line at each bar's column; range ends on the
/// second line as `└end`. Later labels shift right whenever either line would
/// run into the previous label.
fn label_lines(labels: &[(String, Option<String>)]) -> (String, String) {
    let mut top: Vec<char> = Vec::new();
    let mut bottom: Vec<char> = Vec::new();
    let mut shift = 0usize;
    let mut min_next = 0usize;

    for (i, (start, end)) in labels.iter().enumerate() {
        let natural = i * (BAR_WIDTH + GAP_WIDTH) + shift;
        let pos = natural.max(min_next);
        shift += pos - natural;

        put(&mut top, pos, start.chars());
        let mut next = pos + start.chars().count() + 1;
        if let Some(end) = end {
            put(&mut bottom, pos, std::iter::once('└').chain(end.chars()));
            next = next.max(pos + 1 + end.chars().count() + 2);
        }
        min_next = next;
    }

    let finish = |v: Vec<char>| v.into_iter().collect::<String>().trim_end().to_string();
    (finish(top), finish(bottom))
}

fn put(line: &mut Vec<char>, at: usize, text: impl Iterator<Item = char>) {
    for (k, c) in text.enumerate() {
        let idx = at + k;
        if line.len() <= idx {
            line.resize(idx + 1, ' ');
        }
        line[idx] = c;
    }
}
