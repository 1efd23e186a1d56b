//! Benchmarks for classifier training and candidate scoring
//!
//! Run with: cargo bench --bench selection_benchmarks

use std::sync::Arc;

use active_transfer_core::{
    BinaryModel, DataSet, EvidencePolicy, Gamma, Gaussian, Marginals, ProbabilisticClassifier,
    RiskObjective, SelectionPolicy, ToyData, ToyDataConfig, UncertaintyPolicy, VoiPolicy,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn toy(residents: usize, examples: usize) -> DataSet {
    let mut toy = ToyData::new(ToyDataConfig {
        num_residents: residents,
        num_features: 5,
        seed: 7,
        ..ToyDataConfig::default()
    })
    .unwrap();
    toy.generate(0.2, examples).unwrap()
}

fn priors() -> Marginals {
    Marginals::isotropic(5, Gaussian::standard(), Gamma::default())
}

fn bench_train(c: &mut Criterion) {
    let mut group = c.benchmark_group("binary_model_train");
    let model = BinaryModel::default();

    for residents in [1, 5, 20].iter() {
        let data = toy(*residents, 50);
        group.bench_with_input(BenchmarkId::from_parameter(residents), residents, |b, _| {
            b.iter(|| black_box(model.train(&data, &priors(), 10).unwrap()));
        });
    }

    group.finish();
}

fn bench_voi(c: &mut Criterion) {
    let mut group = c.benchmark_group("voi_estimate_candidates");
    let classifier = Arc::new(BinaryModel::default());

    for pool in [10, 50, 200].iter() {
        let data = toy(1, *pool);
        let probabilities = classifier.predict_probabilities(&data, &priors(), 0).unwrap();
        let policy =
            VoiPolicy::new(data, Arc::clone(&classifier), RiskObjective::default(), false).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(pool), pool, |b, _| {
            b.iter(|| black_box(policy.estimate_candidates(&probabilities, &priors()).unwrap()));
        });
    }

    group.finish();
}

fn bench_cheap_policies(c: &mut Criterion) {
    let classifier = Arc::new(BinaryModel::default());
    let data = toy(1, 200);
    let probabilities = classifier.predict_probabilities(&data, &priors(), 0).unwrap();

    let mut uncertainty = UncertaintyPolicy::new(data.clone(), false).unwrap();
    c.bench_function("uncertainty_arg_max_200", |b| {
        b.iter(|| black_box(uncertainty.arg_max_voi(&probabilities, &priors()).unwrap()));
    });

    let mut evidence = EvidencePolicy::new(data, classifier, false).unwrap();
    c.bench_function("evidence_arg_max_200", |b| {
        b.iter(|| black_box(evidence.arg_max_voi(&probabilities, &priors()).unwrap()));
    });
}

criterion_group!(benches, bench_train, bench_voi, bench_cheap_policies);
criterion_main!(benches);
