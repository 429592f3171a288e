//! STAGE 5: LINEAR TREND DETECTION
//!
//! Fits an ordinary-least-squares slope to one metric's values across
//! dated samples and classifies the overall direction. Needs at least
//! two dated points with the metric present; anything less reports
//! `insufficient` rather than guessing.

use serde::{Deserialize, Serialize};

use crate::ruleset::RatioDefinition;
use crate::sample::{LeafTissue, SampleDate};

/// Stable-band half-width: changes within ±10% read as stable.
const STABLE_CHANGE_PCT: f64 = 10.0;

/// Classified direction of a metric across sample dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
    Insufficient,
}

/// Trend fit for one metric in one tissue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendResult {
    pub trend: TrendDirection,
    /// Last-versus-first percent change (0 when the first value is 0).
    pub change_percent: f64,
    /// OLS slope of value against sample index.
    pub slope: f64,
    /// Values in ascending date order.
    pub values: Vec<f64>,
}

impl TrendResult {
    fn insufficient() -> Self {
        Self {
            trend: TrendDirection::Insufficient,
            change_percent: 0.0,
            slope: 0.0,
            values: Vec::new(),
        }
    }
}

/// Resolve one metric's value in one tissue of one sample; ratio ids
/// evaluate through their definition.
fn resolve(sample: &SampleDate, metric_id: &str, tissue: LeafTissue, ratios: &[RatioDefinition]) -> Option<f64> {
    if let Some(def) = ratios.iter().find(|r| r.id == metric_id) {
        def.evaluate(sample.leaf(tissue))
    } else {
        sample.value(tissue, metric_id)
    }
}

/// Fit a linear trend for one metric across several dated samples.
///
/// Undated samples and samples missing the metric are excluded. Dates
/// are ISO-8601 strings, so lexicographic order is chronological order.
pub fn trend(
    samples: &[SampleDate],
    metric_id: &str,
    tissue: LeafTissue,
    ratios: &[RatioDefinition],
) -> TrendResult {
    let mut points: Vec<(&str, f64)> = samples
        .iter()
        .filter_map(|s| {
            let date = s.date.as_deref()?;
            let value = resolve(s, metric_id, tissue, ratios)?;
            Some((date, value))
        })
        .collect();

    if points.len() < 2 {
        return TrendResult::insufficient();
    }
    points.sort_by(|a, b| a.0.cmp(b.0));

    let values: Vec<f64> = points.iter().map(|(_, v)| *v).collect();
    let n = values.len() as f64;

    // OLS slope of value against sample index 0..n-1.
    let sum_x = (0..values.len()).map(|i| i as f64).sum::<f64>();
    let sum_y = values.iter().sum::<f64>();
    let sum_xy = values.iter().enumerate().map(|(i, v)| i as f64 * v).sum::<f64>();
    let sum_x2 = (0..values.len()).map(|i| (i as f64) * (i as f64)).sum::<f64>();
    let denom = n * sum_x2 - sum_x * sum_x;
    let slope = if denom != 0.0 {
        (n * sum_xy - sum_x * sum_y) / denom
    } else {
        0.0
    };

    let first = values[0];
    let last = values[values.len() - 1];
    let change_percent = if first != 0.0 {
        (last - first) / first * 100.0
    } else {
        0.0
    };

    let trend = if change_percent.abs() <= STABLE_CHANGE_PCT {
        TrendDirection::Stable
    } else if change_percent > 0.0 {
        TrendDirection::Up
    } else {
        TrendDirection::Down
    };

    TrendResult {
        trend,
        change_percent,
        slope,
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ruleset::{Ruleset, StaticRuleset};
    use approx::assert_relative_eq;

    fn dated(date: &str, pairs: &[(&str, f64)]) -> SampleDate {
        let mut s = SampleDate {
            date: Some(date.to_string()),
            ..SampleDate::default()
        };
        for (k, v) in pairs {
            s.new_leaf.insert(k.to_string(), *v);
        }
        s
    }

    #[test]
    fn rising_series_classifies_up() {
        let samples = vec![
            dated("2025-03-01", &[("nitrogen", 10.0)]),
            dated("2025-03-08", &[("nitrogen", 12.0)]),
            dated("2025-03-15", &[("nitrogen", 14.0)]),
            dated("2025-03-22", &[("nitrogen", 20.0)]),
        ];
        let t = trend(&samples, "nitrogen", LeafTissue::NewLeaf, &[]);
        assert_eq!(t.trend, TrendDirection::Up);
        assert_relative_eq!(t.change_percent, 100.0);
        assert_eq!(t.values, vec![10.0, 12.0, 14.0, 20.0]);
        // Hand-computed OLS slope for [10, 12, 14, 20] over x = 0..3.
        assert_relative_eq!(t.slope, 3.2);
    }

    #[test]
    fn unordered_input_sorts_by_date() {
        let samples = vec![
            dated("2025-03-22", &[("nitrogen", 20.0)]),
            dated("2025-03-01", &[("nitrogen", 10.0)]),
        ];
        let t = trend(&samples, "nitrogen", LeafTissue::NewLeaf, &[]);
        assert_eq!(t.values, vec![10.0, 20.0]);
        assert_eq!(t.trend, TrendDirection::Up);
    }

    #[test]
    fn small_drift_reads_stable() {
        let samples = vec![
            dated("2025-03-01", &[("nitrogen", 100.0)]),
            dated("2025-03-08", &[("nitrogen", 95.0)]),
        ];
        let t = trend(&samples, "nitrogen", LeafTissue::NewLeaf, &[]);
        assert_eq!(t.trend, TrendDirection::Stable);
        assert_relative_eq!(t.change_percent, -5.0);
    }

    #[test]
    fn falling_series_classifies_down() {
        let samples = vec![
            dated("2025-03-01", &[("nitrogen", 100.0)]),
            dated("2025-03-08", &[("nitrogen", 60.0)]),
        ];
        let t = trend(&samples, "nitrogen", LeafTissue::NewLeaf, &[]);
        assert_eq!(t.trend, TrendDirection::Down);
    }

    #[test]
    fn zero_first_value_reports_zero_change() {
        let samples = vec![
            dated("2025-03-01", &[("nitrogen", 0.0)]),
            dated("2025-03-08", &[("nitrogen", 50.0)]),
        ];
        let t = trend(&samples, "nitrogen", LeafTissue::NewLeaf, &[]);
        assert_relative_eq!(t.change_percent, 0.0);
        assert_eq!(t.trend, TrendDirection::Stable);
    }

    #[test]
    fn fewer_than_two_usable_points_is_insufficient() {
        // One dated point, one undated, one missing the nutrient.
        let samples = vec![
            dated("2025-03-01", &[("nitrogen", 10.0)]),
            SampleDate::default(),
            dated("2025-03-15", &[("potassium", 3000.0)]),
        ];
        let t = trend(&samples, "nitrogen", LeafTissue::NewLeaf, &[]);
        assert_eq!(t.trend, TrendDirection::Insufficient);
        assert_relative_eq!(t.change_percent, 0.0);
        assert!(t.values.is_empty());
    }

    #[test]
    fn ratio_metric_trends_through_its_definition() {
        let ruleset = StaticRuleset::example();
        let samples = vec![
            dated("2025-03-01", &[("potassium", 2000.0), ("calcium", 1000.0)]),
            dated("2025-03-08", &[("potassium", 4500.0), ("calcium", 1000.0)]),
        ];
        let t = trend(&samples, "k_ca", LeafTissue::NewLeaf, ruleset.ratio_definitions());
        assert_eq!(t.trend, TrendDirection::Up);
        assert_relative_eq!(t.values[0], 2.0);
        assert_relative_eq!(t.values[1], 4.5);
    }
}
