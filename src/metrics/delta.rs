//! STAGE 3a: NEW vs OLD LEAF DELTA
//!
//! Numeric comparison of the same metric across the two tissues of one
//! sample. When either side is missing the whole record is null rather
//! than a partial number.

use serde::{Deserialize, Serialize};

/// Sign of the new-minus-old difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeltaDirection {
    Up,
    Down,
    #[serde(rename = "none")]
    Flat,
}

/// New-leaf minus old-leaf comparison for one metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    pub delta: Option<f64>,
    pub delta_pct: Option<f64>,
    pub direction: Option<DeltaDirection>,
}

impl Delta {
    /// All-null record for a metric missing on either side.
    pub fn null() -> Self {
        Self::default()
    }

    pub fn is_null(&self) -> bool {
        self.delta.is_none()
    }
}

/// Compare one metric's new-leaf value against its old-leaf value.
pub fn delta(new: Option<f64>, old: Option<f64>) -> Delta {
    let (new, old) = match (new, old) {
        (Some(n), Some(o)) if n.is_finite() && o.is_finite() => (n, o),
        _ => return Delta::null(),
    };

    let diff = new - old;
    let pct = if old != 0.0 {
        diff / old * 100.0
    } else if diff > 0.0 {
        100.0
    } else if diff < 0.0 {
        -100.0
    } else {
        0.0
    };
    let direction = if diff > 0.0 {
        DeltaDirection::Up
    } else if diff < 0.0 {
        DeltaDirection::Down
    } else {
        DeltaDirection::Flat
    };

    Delta {
        delta: Some(diff),
        delta_pct: Some(pct),
        direction: Some(direction),
    }
}
