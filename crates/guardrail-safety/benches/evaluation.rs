use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use guardrail_safety::{pii_rule, redact, GuardrailsEngine, Rule, RuleKind};

// ============================================================================
// Benchmark 1: Content check against growing rule sets
// ============================================================================

fn benchmark_check_content(c: &mut Criterion) {
    let mut group = c.benchmark_group("check_content");
    group.sample_size(100);

    let message = "this message is long enough to be representative of a chat turn \
                   and mentions nothing that any keyword rule should flag";

    for num_rules in [2usize, 10, 50, 200].iter() {
        let engine = GuardrailsEngine::builder()
            .rules((0..*num_rules).map(|i| {
                Rule::new(
                    format!("rule_{}", i),
                    "generated",
                    RuleKind::keywords([format!("token{}", i), format!("other{}", i)]),
                )
            }))
            .build()
            .unwrap_or_default();

        group.bench_with_input(BenchmarkId::from_parameter(num_rules), num_rules, |b, _| {
            b.iter(|| engine.check_content(black_box(message), None));
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark 2: Pattern rules and redaction
// ============================================================================

fn benchmark_pii(c: &mut Criterion) {
    let mut group = c.benchmark_group("pii");
    let text = "Reach me at jane.doe@example.com or 555-123-4567, card 1234 5678 9012 3456";

    let engine = GuardrailsEngine::builder()
        .rule(pii_rule())
        .build()
        .unwrap_or_default();

    group.bench_function("pattern_rule", |b| {
        b.iter(|| engine.check_content(black_box(text), None));
    });
    group.bench_function("redact", |b| {
        b.iter(|| redact(black_box(text)));
    });

    group.finish();
}

// ============================================================================
// Benchmark 3: Output validation
// ============================================================================

fn benchmark_validate_output(c: &mut Criterion) {
    let engine = GuardrailsEngine::new();
    let output = "a".repeat(9_000);

    c.bench_function("validate_output", |b| {
        b.iter(|| engine.validate_output(black_box(&output), None));
    });
}

criterion_group!(
    benches,
    benchmark_check_content,
    benchmark_pii,
    benchmark_validate_output
);
criterion_main!(benches);
