use criterion::{black_box, criterion_group, criterion_main, Criterion};
use perf_search::{Distribution, ObjectiveGenerator, ParameterKind, SearchDomain};
use serde_json::json;

fn sample_domain() -> SearchDomain {
    let mut domain = SearchDomain::new();
    for model in ["llama", "mistral"] {
        domain
            .add_parameter(model, "concurrency", ParameterKind::exponential(0, 8).unwrap())
            .unwrap();
        domain
            .add_parameter(model, "batch_size", ParameterKind::linear(1, 16, 1).unwrap())
            .unwrap();
        domain
            .add_parameter(
                model,
                "instance_count",
                ParameterKind::Categorical(vec![json!(1), json!(2), json!(4)]),
            )
            .unwrap();
        domain
            .add_parameter(model, "endpoint_type", ParameterKind::Fixed(json!("chat")))
            .unwrap();
        domain
            .add_parameter(
                model,
                "input_sequence_length",
                ParameterKind::Distribution(Distribution::new(550.0, 50.0)),
            )
            .unwrap();
    }
    domain
}

fn bench_generation(c: &mut Criterion) {
    let domain = sample_domain();
    let generator = ObjectiveGenerator::new(&domain);
    c.bench_function("objective_count", |b| {
        b.iter(|| black_box(generator.count()));
    });
    c.bench_function("objective_enumeration", |b| {
        b.iter(|| {
            let total = generator.objectives().map(|obj| obj.values().len()).sum::<usize>();
            black_box(total);
        });
    });
    c.bench_function("objective_grid_keys", |b| {
        b.iter(|| {
            for obj in generator.objectives().take(64) {
                black_box(obj.grid_key());
            }
        });
    });
}

criterion_group!(benches, bench_generation);
criterion_main!(benches);
