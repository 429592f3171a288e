//! STAGE 2: NUTRIENT STATUS CLASSIFICATION
//!
//! Maps one (value, threshold band) pair to a status and a 0-100
//! severity. Pure and total: missing values classify as Unknown, a
//! missing band classifies as OK, and degenerate bands clamp to a
//! defined severity instead of dividing by zero.

use serde::{Deserialize, Serialize};

use crate::ruleset::Threshold;

/// Classification outcome for one metric in one tissue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "OK")]
    Ok,
    Watch,
    Action,
    Unknown,
}

impl Status {
    /// OK-or-better for cross-leaf pattern matching: no active finding.
    pub fn is_ok_like(&self) -> bool {
        matches!(self, Status::Ok | Status::Unknown)
    }

    pub fn display_text(&self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::Watch => "Watch",
            Status::Action => "Action",
            Status::Unknown => "Unknown",
        }
    }
}

/// Which side of the optimal band a finding sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Low,
    High,
}

impl Direction {
    pub fn word(&self) -> &'static str {
        match self {
            Direction::Low => "low",
            Direction::High => "high",
        }
    }
}

/// Full classification result for one (value, band) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResult {
    pub status: Status,
    /// 0-100; always 0 when status is OK or Unknown.
    pub severity: u8,
    pub reason: String,
    pub direction: Option<Direction>,
}

impl StatusResult {
    pub fn no_data() -> Self {
        Self {
            status: Status::Unknown,
            severity: 0,
            reason: "No data".to_string(),
            direction: None,
        }
    }

    pub fn no_threshold() -> Self {
        Self {
            status: Status::Ok,
            severity: 0,
            reason: "No threshold defined".to_string(),
            direction: None,
        }
    }

    fn optimal() -> Self {
        Self {
            status: Status::Ok,
            severity: 0,
            reason: "Optimal".to_string(),
            direction: None,
        }
    }

    /// Whether this result should surface as an issue.
    pub fn is_finding(&self) -> bool {
        matches!(self.status, Status::Watch | Status::Action)
    }
}

/// Severity of an out-of-band value relative to a band edge,
/// `(distance / divisor) * scale`, clamped to `0..=cap`.
///
/// A divisor that is zero or negative means the band edge is degenerate
/// (possible for immobile-element thresholds that start at zero); the
/// severity then clamps straight to `cap` rather than going non-finite.
fn scaled_severity(distance: f64, divisor: f64, scale: f64, cap: u8) -> u8 {
    if divisor <= 0.0 {
        return cap;
    }
    let raw = (distance / divisor * scale).round();
    raw.clamp(0.0, cap as f64) as u8
}

/// Classify one value against one reference band.
pub fn classify(value: Option<f64>, threshold: Option<&Threshold>) -> StatusResult {
    let value = match value {
        Some(v) if v.is_finite() => v,
        _ => return StatusResult::no_data(),
    };
    let t = match threshold {
        Some(t) => t,
        None => return StatusResult::no_threshold(),
    };

    if value < t.low {
        return StatusResult {
            status: Status::Action,
            severity: scaled_severity(t.low - value, t.low, 100.0, 100),
            reason: "Below low threshold".to_string(),
            direction: Some(Direction::Low),
        };
    }
    if value < t.optimal_low {
        // Watch band severity spans 0-50; a degenerate band clamps to 50.
        return StatusResult {
            status: Status::Watch,
            severity: scaled_severity(t.optimal_low - value, t.optimal_low - t.low, 50.0, 50),
            reason: "Below optimal range".to_string(),
            direction: Some(Direction::Low),
        };
    }
    if value > t.high {
        return StatusResult {
            status: Status::Action,
            severity: scaled_severity(value - t.high, t.high, 100.0, 100),
            reason: "Above high threshold".to_string(),
            direction: Some(Direction::High),
        };
    }
    if value > t.optimal_high {
        return StatusResult {
            status: Status::Watch,
            severity: scaled_severity(value - t.optimal_high, t.high - t.optimal_high, 50.0, 50),
            reason: "Above optimal range".to_string(),
            direction: Some(Direction::High),
        };
    }

    StatusResult::optimal()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn band() -> Threshold {
        Threshold::new(2000.0, 3000.0, 5000.0, 6500.0)
    }

    #[test]
    fn missing_value_is_unknown() {
        let r = classify(None, Some(&band()));
        assert_eq!(r.status, Status::Unknown);
        assert_eq!(r.severity, 0);
        assert_eq!(r.reason, "No data");
        assert_eq!(r.direction, None);

        let r = classify(Some(f64::NAN), Some(&band()));
        assert_eq!(r.status, Status::Unknown);
    }

    #[test]
    fn missing_threshold_is_ok() {
        let r = classify(Some(1234.0), None);
        assert_eq!(r.status, Status::Ok);
        assert_eq!(r.severity, 0);
        assert_eq!(r.reason, "No threshold defined");
    }

    #[test]
    fn action_low_boundary_case() {
        // round((2000 - 1500) / 2000 * 100) = 25
        let r = classify(Some(1500.0), Some(&band()));
        assert_eq!(r.status, Status::Action);
        assert_eq!(r.severity, 25);
        assert_eq!(r.direction, Some(Direction::Low));
    }

    #[test]
    fn watch_low_band() {
        // round((3000 - 2500) / (3000 - 2000) * 50) = 25
        let r = classify(Some(2500.0), Some(&band()));
        assert_eq!(r.status, Status::Watch);
        assert_eq!(r.severity, 25);
        assert_eq!(r.direction, Some(Direction::Low));
    }

    #[test]
    fn watch_high_band() {
        // round((5750 - 5000) / (6500 - 5000) * 50) = 25
        let r = classify(Some(5750.0), Some(&band()));
        assert_eq!(r.status, Status::Watch);
        assert_eq!(r.severity, 25);
        assert_eq!(r.direction, Some(Direction::High));
    }

    #[test]
    fn action_high_capped_at_100() {
        // round((20000 - 6500) / 6500 * 100) = 208 -> capped
        let r = classify(Some(20000.0), Some(&band()));
        assert_eq!(r.status, Status::Action);
        assert_eq!(r.severity, 100);
        assert_eq!(r.direction, Some(Direction::High));
    }

    #[test]
    fn optimal_midpoint_is_ok() {
        let t = band();
        let mid = (t.optimal_low + t.optimal_high) / 2.0;
        let r = classify(Some(mid), Some(&t));
        assert_eq!(r.status, Status::Ok);
        assert_eq!(r.severity, 0);
        assert_eq!(r.reason, "Optimal");
    }

    #[test]
    fn band_edges_are_not_findings() {
        let t = band();
        assert_eq!(classify(Some(t.optimal_low), Some(&t)).status, Status::Ok);
        assert_eq!(classify(Some(t.optimal_high), Some(&t)).status, Status::Ok);
        // low itself falls in the Watch band (low <= v < optimal_low)
        assert_eq!(classify(Some(t.low), Some(&t)).status, Status::Watch);
        // high itself falls in the Watch band (optimal_high < v <= high)
        assert_eq!(classify(Some(t.high), Some(&t)).status, Status::Watch);
    }

    #[test]
    fn severity_monotone_within_each_band() {
        let t = band();
        // Watch band then Action band, each monotone on its own scale.
        for values in [
            &[5000.0, 5200.0, 5800.0, 6400.0, 6500.0][..],
            &[6501.0, 7000.0, 9000.0, 15000.0, 30000.0][..],
            &[3000.0, 2600.0, 2200.0, 2000.0][..],
            &[1999.0, 1500.0, 800.0, 100.0][..],
        ] {
            let mut last = 0u8;
            for &value in values {
                let r = classify(Some(value), Some(&t));
                assert!(
                    r.severity >= last,
                    "severity regressed at {value}: {} < {last}",
                    r.severity
                );
                last = r.severity;
            }
        }
        // And the cap holds far outside the band.
        assert_eq!(classify(Some(1e9), Some(&t)).severity, 100);
        assert_eq!(classify(Some(-1e9), Some(&t)).severity, 100);
    }

    #[test]
    fn zero_low_clamps_action_severity() {
        // low = 0: the Action-low formula would divide by zero.
        let t = Threshold::new(0.0, 1.0, 3.0, 5.0);
        let r = classify(Some(-0.5), Some(&t));
        assert_eq!(r.status, Status::Action);
        assert_eq!(r.severity, 100);
    }

    #[test]
    fn zero_high_clamps_action_severity() {
        // A band topping out at zero makes the Action-high divisor zero.
        let t = Threshold::new(-5.0, -3.0, -1.0, 0.0);
        let r = classify(Some(2.0), Some(&t));
        assert_eq!(r.status, Status::Action);
        assert_eq!(r.severity, 100);
        assert_eq!(r.direction, Some(Direction::High));
    }

    #[test]
    fn scaled_severity_guards_degenerate_divisors() {
        assert_eq!(scaled_severity(5.0, 0.0, 50.0, 50), 50);
        assert_eq!(scaled_severity(5.0, -1.0, 100.0, 100), 100);
        assert_eq!(scaled_severity(1.0, 4.0, 100.0, 100), 25);
    }
}
