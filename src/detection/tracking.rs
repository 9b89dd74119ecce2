//! Setpoint-tracking detectors: settling band violations and sluggish response

use super::LoopSignals;
use crate::types::{is_good, IssueKind, IssueRecord};

/// Samples outside the settling band `|measured - setpoint| > tolerance × |setpoint|`.
///
/// `amount = measured - setpoint`. The band uses `|setpoint|` so a negative
/// setpoint still yields a non-empty band.
pub fn detect_settling(signals: LoopSignals<'_>, tolerance: f64) -> IssueRecord {
    let points = (0..signals.len())
        .filter_map(|i| {
            let (sp, m) = (signals.setpoint[i], signals.measured[i]);
            if !(is_good(sp) && is_good(m)) {
                return None;
            }
            let error = m - sp;
            (error.abs() > tolerance * sp.abs()).then(|| signals.flag(i, error))
        })
        .collect();
    IssueRecord::new(IssueKind::Settling, points)
}

/// Samples below setpoint while the valve is in its low regime.
///
/// `amount = setpoint - measured`. Without a valve band nothing is flagged.
pub fn detect_sluggish(signals: LoopSignals<'_>) -> IssueRecord {
    let Some(band) = signals.band else {
        return IssueRecord::empty(IssueKind::Sluggish);
    };
    let points = (0..signals.len())
        .filter_map(|i| {
            let (sp, m) = (signals.setpoint[i], signals.measured[i]);
            if !(is_good(sp) && is_good(m)) {
                return None;
            }
            (m < sp && band.is_low(signals.valve[i])).then(|| signals.flag(i, sp - m))
        })
        .collect();
    IssueRecord::new(IssueKind::Sluggish, points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ValveBand, NO_GOOD_DATA};

    #[test]
    fn test_settling_band_edges() {
        let setpoint = [500.0; 4];
        // 15.0 is exactly on the 3 % edge and stays inside
        let measured = [515.0, 516.0, 485.0, 484.0];
        let valve = [50.0; 4];
        let record = detect_settling(
            LoopSignals {
                setpoint: &setpoint,
                measured: &measured,
                valve: &valve,
                band: None,
            },
            0.03,
        );
        let idx: Vec<usize> = record.indices().collect();
        assert_eq!(idx, vec![1, 3]);
        assert!((record.points[1].amount + 16.0).abs() < 1e-9);
    }

    #[test]
    fn test_settling_skips_sentinels() {
        let setpoint = [500.0, NO_GOOD_DATA, 500.0];
        let measured = [NO_GOOD_DATA, 500.0, 500.0];
        let valve = [50.0; 3];
        let record = detect_settling(
            LoopSignals {
                setpoint: &setpoint,
                measured: &measured,
                valve: &valve,
                band: None,
            },
            0.03,
        );
        assert!(record.is_empty());
    }

    #[test]
    fn test_sluggish_ramp_with_closed_valve() {
        let setpoint = vec![500.0; 21];
        let measured: Vec<f64> = (0..21).map(|i| 400.0 + 10.0 * f64::from(i)).collect();
        let valve = vec![0.0; 21];
        let record = detect_sluggish(LoopSignals {
            setpoint: &setpoint,
            measured: &measured,
            valve: &valve,
            band: Some(ValveBand::new(30.0, 70.0)),
        });
        // 400..490 are below setpoint; 500 is not
        assert_eq!(record.len(), 10);
        assert!(record.indices().all(|i| measured[i] < 500.0));
    }

    #[test]
    fn test_sluggish_requires_band() {
        let record = detect_sluggish(LoopSignals {
            setpoint: &[500.0],
            measured: &[400.0],
            valve: &[0.0],
            band: None,
        });
        assert!(record.is_empty());
    }
}
