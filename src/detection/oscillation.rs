//! Oscillation detector: rolling count of direction reversals
//!
//! The direction of each step is the sign of the first difference of the
//! measured curve (rising, flat, falling). A reversal is counted at sample
//! `i` when the steps ending at `i` and `i - 1` both exist and differ.
//! Counts are summed over a right-aligned window and compared with a
//! linearly interpolated percentile of all complete-window counts.

use std::cmp::Ordering;

use super::LoopSignals;
use crate::types::{is_good, IssueKind, IssueRecord};

/// Direction of the step `prev → next`, `None` across a sentinel.
fn step_direction(prev: f64, next: f64) -> Option<Ordering> {
    if is_good(prev) && is_good(next) {
        next.partial_cmp(&prev)
    } else {
        None
    }
}

/// `changes[i]` is true when the direction reverses at sample `i`.
fn direction_changes(measured: &[f64]) -> Vec<bool> {
    let directions: Vec<Option<Ordering>> = std::iter::once(None)
        .chain(measured.windows(2).map(|w| step_direction(w[0], w[1])))
        .collect();

    (0..measured.len())
        .map(|i| {
            i >= 2
                && matches!(
                    (directions[i - 1], directions[i]),
                    (Some(a), Some(b)) if a != b
                )
        })
        .collect()
}

/// Right-aligned inclusive window sums; `counts[k]` belongs to sample `k + window - 1`.
fn window_counts(changes: &[bool], window: usize) -> Vec<usize> {
    if window == 0 || changes.len() < window {
        return Vec::new();
    }
    let mut counts = Vec::with_capacity(changes.len() - window + 1);
    let mut running = changes[..window].iter().filter(|&&c| c).count();
    counts.push(running);
    for i in window..changes.len() {
        running += usize::from(changes[i]);
        running -= usize::from(changes[i - window]);
        counts.push(running);
    }
    counts
}

/// Percentile by linear interpolation between closest ranks
/// (`h = (n - 1) * p`). `None` for an empty slice.
fn linear_percentile(values: &mut [f64], percentile: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let h = (values.len() - 1) as f64 * percentile.clamp(0.0, 1.0);
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(values.len() - 1);
    Some(values[lo] + (h - lo as f64) * (values[hi] - values[lo]))
}

/// Flag samples whose window holds more reversals than the `percentile`
/// of all windows, or whose window is saturated (every step reversed).
///
/// A uniformly oscillating series has every count equal to the threshold,
/// so the saturation rule is what lets it be flagged at all.
pub fn detect_oscillation(signals: LoopSignals<'_>, window: usize, percentile: f64) -> IssueRecord {
    let measured = &signals.measured[..signals.len()];
    let counts = window_counts(&direction_changes(measured), window);
    let mut sorted: Vec<f64> = counts.iter().map(|&c| c as f64).collect();
    let Some(threshold) = linear_percentile(&mut sorted, percentile) else {
        return IssueRecord::empty(IssueKind::Oscillation);
    };

    let points = counts
        .iter()
        .enumerate()
        .filter(|&(_, &count)| count as f64 > threshold || count >= window)
        .map(|(k, _)| k + window - 1)
        .filter(|&i| is_good(measured[i]))
        .map(|i| {
            let sp = signals.setpoint[i];
            let deviation = if is_good(sp) { measured[i] - sp } else { 0.0 };
            signals.flag(i, deviation)
        })
        .collect();

    IssueRecord::new(IssueKind::Oscillation, points)
}
