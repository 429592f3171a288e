//! Criterion bench for the full evaluation pipeline.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use sap_analyzer_rust::{evaluate, evaluate_batch, Context, SampleDate, StaticRuleset};

fn sample() -> SampleDate {
    let mut s = SampleDate {
        date: Some("2025-05-02".to_string()),
        ..SampleDate::default()
    };
    for (k, v) in [
        ("nitrogen", 4200.0),
        ("phosphorus", 300.0),
        ("potassium", 1500.0),
        ("calcium", 1800.0),
        ("magnesium", 400.0),
        ("iron", 2.5),
        ("manganese", 5.0),
        ("zinc", 2.0),
        ("sugars", 8.0),
    ] {
        s.new_leaf.insert(k.to_string(), v);
    }
    for (k, v) in [
        ("nitrogen", 4100.0),
        ("phosphorus", 280.0),
        ("potassium", 1800.0),
        ("calcium", 2000.0),
        ("magnesium", 450.0),
        ("iron", 3.0),
        ("manganese", 6.0),
        ("zinc", 2.2),
        ("sugars", 7.0),
    ] {
        s.old_leaf.insert(k.to_string(), v);
    }
    s
}

fn bench_evaluate(c: &mut Criterion) {
    let ruleset = StaticRuleset::example();
    let context = Context {
        crop: "tomato".to_string(),
        ..Context::default()
    };
    let s = sample();

    c.bench_function("evaluate_single", |b| {
        b.iter(|| evaluate(black_box(&s), &ruleset, &context))
    });

    let batch: Vec<SampleDate> = (0..256).map(|_| sample()).collect();
    c.bench_function("evaluate_batch_256", |b| {
        b.iter(|| evaluate_batch(black_box(&batch), &ruleset, &context))
    });
}

criterion_group!(benches, bench_evaluate);
criterion_main!(benches);
