//! Grouped table rows
//!
//! Builds ordered row lists carrying both-leaf values, statuses, delta,
//! and signal for one sample's evaluation. Nutrient mode groups rows by
//! the ruleset's nutrient groups; ratio mode emits one group of the
//! configured ratios.

use serde::{Deserialize, Serialize};

use crate::evaluator::EvaluationResult;
use crate::metrics::{Delta, LeafSignal, StatusResult};
use crate::ruleset::Ruleset;
use crate::sample::{LeafTissue, SampleDate};

/// Which set of rows to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowMode {
    Nutrients,
    Ratios,
}

/// One metric's row: both tissues side by side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub metric_id: String,
    pub label: String,
    pub new_value: Option<f64>,
    pub old_value: Option<f64>,
    pub new_status: StatusResult,
    pub old_status: StatusResult,
    pub delta: Delta,
    pub signal: Option<LeafSignal>,
    pub is_ratio: bool,
}

/// An ordered group of rows under a display heading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowGroup {
    pub key: String,
    pub label: String,
    pub rows: Vec<TableRow>,
}

fn build_row<R: Ruleset + ?Sized>(
    metric_id: &str,
    is_ratio: bool,
    sample: &SampleDate,
    evaluation: &EvaluationResult,
    ruleset: &R,
) -> TableRow {
    let (new_value, old_value) = if is_ratio {
        (
            evaluation.derived.new_leaf.get(metric_id).copied(),
            evaluation.derived.old_leaf.get(metric_id).copied(),
        )
    } else {
        (
            sample.value(LeafTissue::NewLeaf, metric_id),
            sample.value(LeafTissue::OldLeaf, metric_id),
        )
    };

    // Metrics the evaluation never saw present as no-data rows.
    let status_of = |tissue: LeafTissue| {
        evaluation
            .per_nutrient_status
            .get(tissue)
            .get(metric_id)
            .cloned()
            .unwrap_or_else(StatusResult::no_data)
    };

    TableRow {
        metric_id: metric_id.to_string(),
        label: ruleset.metric_label(metric_id).to_string(),
        new_value,
        old_value,
        new_status: status_of(LeafTissue::NewLeaf),
        old_status: status_of(LeafTissue::OldLeaf),
        delta: evaluation.deltas.get(metric_id).copied().unwrap_or_default(),
        signal: evaluation.leaf_signals.get(metric_id).copied(),
        is_ratio,
    }
}

/// Build the grouped rows for one mode.
pub fn build_table_rows<R: Ruleset + ?Sized>(
    mode: RowMode,
    sample: &SampleDate,
    evaluation: &EvaluationResult,
    ruleset: &R,
) -> Vec<RowGroup> {
    match mode {
        RowMode::Nutrients => ruleset
            .nutrient_groups()
            .iter()
            .map(|group| RowGroup {
                key: group.key.clone(),
                label: group.label.clone(),
                rows: group
                    .members
                    .iter()
                    .map(|id| build_row(id, false, sample, evaluation, ruleset))
                    .collect(),
            })
            .collect(),
        RowMode::Ratios => {
            let rows = ruleset
                .ratio_definitions()
                .iter()
                .map(|def| build_row(&def.id, true, sample, evaluation, ruleset))
                .collect();
            vec![RowGroup {
                key: "ratios".to_string(),
                label: "Ratios".to_string(),
                rows,
            }]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::evaluate;
    use crate::metrics::Status;
    use crate::ruleset::StaticRuleset;
    use crate::sample::Context;
    use approx::assert_relative_eq;

    fn fixture() -> (SampleDate, StaticRuleset, Context) {
        let mut sample = SampleDate::default();
        for (k, v) in [
            ("nitrogen", 4200.0),
            ("potassium", 4000.0),
            ("calcium", 2000.0),
            ("magnesium", 400.0),
        ] {
            sample.new_leaf.insert(k.to_string(), v);
        }
        for (k, v) in [("nitrogen", 4100.0), ("potassium", 4400.0)] {
            sample.old_leaf.insert(k.to_string(), v);
        }
        let context = Context {
            crop: "tomato".to_string(),
            ..Context::default()
        };
        (sample, StaticRuleset::example(), context)
    }

    #[test]
    fn nutrient_rows_follow_group_declaration_order() {
        let (sample, ruleset, context) = fixture();
        let evaluation = evaluate(&sample, &ruleset, &context);
        let groups = build_table_rows(RowMode::Nutrients, &sample, &evaluation, &ruleset);

        let keys: Vec<&str> = groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["macro", "micro", "energy"]);

        let macro_ids: Vec<&str> = groups[0].rows.iter().map(|r| r.metric_id.as_str()).collect();
        assert_eq!(
            macro_ids,
            vec!["nitrogen", "phosphorus", "potassium", "calcium", "magnesium"]
        );
        assert_eq!(groups[0].rows[0].label, "Nitrogen");
    }

    #[test]
    fn unmeasured_member_presents_as_no_data_row() {
        let (sample, ruleset, context) = fixture();
        let evaluation = evaluate(&sample, &ruleset, &context);
        let groups = build_table_rows(RowMode::Nutrients, &sample, &evaluation, &ruleset);

        let phosphorus = &groups[0].rows[1];
        assert!(phosphorus.new_value.is_none());
        assert_eq!(phosphorus.new_status.status, Status::Unknown);
        assert!(phosphorus.delta.is_null());
        assert!(phosphorus.signal.is_none());
    }

    #[test]
    fn ratio_mode_emits_single_group_with_derived_values() {
        let (sample, ruleset, context) = fixture();
        let evaluation = evaluate(&sample, &ruleset, &context);
        let groups = build_table_rows(RowMode::Ratios, &sample, &evaluation, &ruleset);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key, "ratios");
        let k_ca = &groups[0].rows[0];
        assert!(k_ca.is_ratio);
        assert_eq!(k_ca.metric_id, "k_ca");
        assert_relative_eq!(k_ca.new_value.unwrap(), 2.0);
        // Old leaf lacks calcium: ratio unresolved there.
        assert!(k_ca.old_value.is_none());
    }
}
