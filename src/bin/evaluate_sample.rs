//! Evaluate one sap sample record and print a system summary
//!
//! Stands in for the external UI layer: loads a raw sample JSON (and
//! optionally a ruleset JSON) from disk, runs the evaluation, and
//! prints the verdicts ranked by score.
//!
//! Usage: evaluate_sample <sample.json> [ruleset.json] [crop]

use anyhow::{Context as _, Result};
use std::path::Path;

use sap_analyzer_rust::{
    evaluate, Context, RawSample, Ruleset, SampleDate, StaticRuleset, Status,
};

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let sample_path = args
        .get(1)
        .context("usage: evaluate_sample <sample.json> [ruleset.json] [crop]")?;

    let raw: RawSample = serde_json::from_str(
        &std::fs::read_to_string(sample_path)
            .with_context(|| format!("failed to read sample file {sample_path}"))?,
    )
    .context("failed to parse sample JSON")?;
    let sample = SampleDate::parse(&raw);

    let ruleset = match args.get(2) {
        Some(path) => StaticRuleset::from_path(Path::new(path))?,
        None => {
            println!("No ruleset given - using built-in example ruleset");
            StaticRuleset::example()
        }
    };

    let context = Context {
        crop: args.get(3).cloned().unwrap_or_else(|| "tomato".to_string()),
        ..Context::default()
    };

    println!("\nEvaluating sample (ruleset {})...", ruleset.version());
    println!("  Crop: {}", context.crop);
    println!("  Date: {}", sample.date.as_deref().unwrap_or("undated"));
    println!(
        "  Readings: {} new leaf, {} old leaf\n",
        sample.new_leaf.len(),
        sample.old_leaf.len()
    );

    let result = evaluate(&sample, &ruleset, &context);

    let mut systems: Vec<_> = ruleset
        .system_groups()
        .iter()
        .filter_map(|g| result.system_status.get(&g.key).map(|s| (g, s)))
        .collect();
    systems.sort_by(|a, b| b.1.score.total_cmp(&a.1.score));

    println!(
        "{:<20} {:<8} {:<6} {:>6}  {}",
        "System", "Status", "Conf", "Score", "Reason"
    );
    for (group, status) in &systems {
        println!(
            "{:<20} {:<8} {:<6} {:>6.1}  {}",
            group.label,
            status.status.display_text(),
            format!("{:?}", status.confidence),
            status.score,
            status.reason
        );
    }

    let findings: usize = result
        .system_status
        .values()
        .map(|s| s.issues.len())
        .sum();
    println!("\n{} issue(s) across all systems", findings);

    for (id, sig) in &result.leaf_signals {
        println!("  {}: {} - {}", id, sig.signal.code(), sig.description);
    }

    let action = result
        .system_status
        .values()
        .any(|s| s.status == Status::Action);
    if action {
        println!("\nAt least one system needs action.");
    }

    Ok(())
}
