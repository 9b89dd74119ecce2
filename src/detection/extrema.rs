//! Peak-based detectors: overshoot at local maxima, undershoot at local minima

use super::LoopSignals;
use crate::types::{is_good, IssueKind, IssueRecord};

/// Indices that are strict local extrema of `values`.
///
/// Boundary samples are never extrema, plateaus are not peaks, and a
/// sentinel at the sample or either neighbour disqualifies it.
fn strict_extrema(values: &[f64], maxima: bool) -> Vec<usize> {
    if values.len() < 3 {
        return Vec::new();
    }
    (1..values.len() - 1)
        .filter(|&i| {
            let (prev, here, next) = (values[i - 1], values[i], values[i + 1]);
            if !(is_good(prev) && is_good(here) && is_good(next)) {
                return false;
            }
            if maxima {
                here > prev && here > next
            } else {
                here < prev && here < next
            }
        })
        .collect()
}

/// Local maxima of the measured curve that sit above the setpoint.
///
/// `amount = measured - setpoint`.
pub fn detect_overshoot(signals: LoopSignals<'_>) -> IssueRecord {
    let len = signals.len();
    let points = strict_extrema(&signals.measured[..len], true)
        .into_iter()
        .filter(|&i| is_good(signals.setpoint[i]))
        .filter_map(|i| {
            let amount = signals.measured[i] - signals.setpoint[i];
            (amount > 0.0).then(|| signals.flag(i, amount))
        })
        .collect();
    IssueRecord::new(IssueKind::Overshoot, points)
}

/// Local minima of the measured curve that sit below the setpoint.
///
/// `amount = setpoint - measured`.
pub fn detect_undershoot(signals: LoopSignals<'_>) -> IssueRecord {
    let len = signals.len();
    let points = strict_extrema(&signals.measured[..len], false)
        .into_iter()
        .filter(|&i| is_good(signals.setpoint[i]))
        .filter_map(|i| {
            let amount = signals.setpoint[i] - signals.measured[i];
            (amount > 0.0).then(|| signals.flag(i, amount))
        })
        .collect();
    IssueRecord::new(IssueKind::Undershoot, points)
}
