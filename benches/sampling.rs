use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use pse::{
    Distribution, DistributionKind, Sampler, StorageKind, Value, VariableId, VariableSpec,
    VariableStore,
};

fn started_store(spec: VariableSpec) -> (VariableStore, VariableId) {
    let mut store = VariableStore::new();
    store.init().unwrap();
    let id = store.register(spec).unwrap();
    store.start(1, 1).unwrap();
    (store, id)
}

fn bench_sampler(c: &mut Criterion) {
    let mut group = c.benchmark_group("sampler");
    group.throughput(Throughput::Elements(1));

    let cases = [
        ("bernoulli", DistributionKind::Bernoulli, vec![0.5]),
        ("poisson_self", DistributionKind::PoissonSelf, vec![]),
        ("normal_self", DistributionKind::NormalSelf, vec![2.3]),
        ("gamma", DistributionKind::Gamma, vec![1.5, 2.0]),
        ("beta", DistributionKind::Beta, vec![2.0, 5.0]),
    ];
    for (label, kind, params) in cases {
        let dist = Distribution::with(kind, &params);
        let mut sampler = Sampler::from_seeds(7, 11);
        group.bench_function(label, |b| {
            b.iter(|| {
                sampler
                    .sample_any(black_box(12.0), &dist.params, dist.kind)
                    .unwrap()
            });
        });
    }
    group.finish();
}

fn bench_observe(c: &mut Criterion) {
    let mut group = c.benchmark_group("observe");
    group.throughput(Throughput::Elements(1));

    let (mut store, id) = started_store(
        VariableSpec::new("distance", StorageKind::Double)
            .stochastic(Distribution::with(DistributionKind::NormalSelf, &[2.3]))
            .read_and_alter(true),
    );
    store.prepare(id, Value::Double(12.4), 0).unwrap();
    let mut out = store.template(id).unwrap();
    group.bench_function("scalar_read_and_alter", |b| {
        b.iter(|| store.observe(id, 0, &mut out).unwrap());
    });

    let (mut store, id) = started_store(
        VariableSpec::new("grid", StorageKind::Double)
            .array(4096)
            .stochastic(Distribution::with(DistributionKind::Normal, &[0.0, 1.0])),
    );
    let mut out = store.template(id).unwrap();
    let mut index = 0;
    group.bench_function("array_element", |b| {
        b.iter(|| {
            index = (index + 1) % 4096;
            store.observe(id, index, &mut out).unwrap();
        });
    });

    let (mut store, id) = started_store(
        VariableSpec::new("callsign", StorageKind::String)
            .array(8)
            .stochastic(Distribution::with(DistributionKind::UniformIntSelf, &[]))
            .array_distribution(Distribution::with(DistributionKind::UniformDoubleBounded, &[0.0, 16.0]))
            .read_and_alter(true),
    );
    store.prepare(id, Value::from("ALPHA-BRAVO-7"), 0).unwrap();
    let mut out = store.template(id).unwrap();
    group.bench_function("string_mutation", |b| {
        b.iter(|| store.observe(id, 0, &mut out).unwrap());
    });

    group.finish();
}

criterion_group!(benches, bench_sampler, bench_observe);
criterion_main!(benches);
