//! STAGE 3b: CROSS-LEAF BIOLOGICAL SIGNALS
//!
//! Interprets the joint (new-leaf status, old-leaf status) pattern for
//! one nutrient as a named physiological signal. The rules overlap at
//! boundary inputs, so they are checked strictly in order and the first
//! match wins; both-leaf patterns outrank single-leaf ones.

use serde::{Deserialize, Serialize};

use crate::metrics::classify::{Direction, StatusResult};

/// The six recognized cross-leaf patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalKind {
    #[serde(rename = "SUPPLY LOW")]
    SupplyLow,
    #[serde(rename = "EXCESS")]
    Excess,
    #[serde(rename = "NEW LIMIT")]
    NewLimit,
    #[serde(rename = "REMOB")]
    Remob,
    #[serde(rename = "NEW BUILD")]
    NewBuild,
    #[serde(rename = "OLD BUILD")]
    OldBuild,
}

impl SignalKind {
    pub fn code(&self) -> &'static str {
        match self {
            SignalKind::SupplyLow => "SUPPLY LOW",
            SignalKind::Excess => "EXCESS",
            SignalKind::NewLimit => "NEW LIMIT",
            SignalKind::Remob => "REMOB",
            SignalKind::NewBuild => "NEW BUILD",
            SignalKind::OldBuild => "OLD BUILD",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            SignalKind::SupplyLow => "#c0392b",
            SignalKind::Excess => "#8e44ad",
            SignalKind::NewLimit => "#e67e22",
            SignalKind::Remob => "#d35400",
            SignalKind::NewBuild => "#2980b9",
            SignalKind::OldBuild => "#7f8c8d",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SignalKind::SupplyLow => "Low in both tissues: whole-plant deficiency",
            SignalKind::Excess => "High in both tissues: accumulation in both",
            SignalKind::NewLimit => "Low in new growth only: transport to new growth limited",
            SignalKind::Remob => "Low in old growth only: remobilizing from old leaves",
            SignalKind::NewBuild => "High in new growth only: accumulating in new growth",
            SignalKind::OldBuild => "High in old growth only: stored in old tissue",
        }
    }
}

/// A recognized cross-leaf pattern with its display attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LeafSignal {
    pub signal: SignalKind,
    pub color: &'static str,
    pub description: &'static str,
}

impl From<SignalKind> for LeafSignal {
    fn from(signal: SignalKind) -> Self {
        Self {
            signal,
            color: signal.color(),
            description: signal.description(),
        }
    }
}

fn is_low(r: &StatusResult) -> bool {
    r.is_finding() && r.direction == Some(Direction::Low)
}

fn is_high(r: &StatusResult) -> bool {
    r.is_finding() && r.direction == Some(Direction::High)
}

/// Classify the joint new/old status pattern for one nutrient.
///
/// Returns `None` when no recognized pattern applies (e.g. both OK, or
/// the pathological low-vs-high split that no rule names).
pub fn signal(new: &StatusResult, old: &StatusResult) -> Option<LeafSignal> {
    let new_low = is_low(new);
    let new_high = is_high(new);
    let new_ok = new.status.is_ok_like();
    let old_low = is_low(old);
    let old_high = is_high(old);
    let old_ok = old.status.is_ok_like();

    // First match wins; do not reorder.
    let kind = if new_low && old_low {
        SignalKind::SupplyLow
    } else if new_high && old_high {
        SignalKind::Excess
    } else if new_low && (old_ok || old_high) {
        SignalKind::NewLimit
    } else if (new_ok || new_high) && old_low {
        SignalKind::Remob
    } else if new_high && old_ok {
        SignalKind::NewBuild
    } else if new_ok && old_high {
        SignalKind::OldBuild
    } else {
        return None;
    };

    Some(kind.into())
}
