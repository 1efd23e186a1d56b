use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use active_transfer_core::model::ModelResult;
use active_transfer_core::{
    create_learners, ActiveError, Bernoulli, BinaryModel, DataSet, EvidencePolicy, Experiment,
    ExperimentConfig, Gamma, Gaussian, LearnerKind, Marginals, ModelError, Partition,
    ProbabilisticClassifier, RandomPolicy, RiskObjective, SelectionPolicy, ToyData, ToyDataConfig,
    UncertaintyPolicy, VoiPolicy,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Classifier whose training never converges.
#[derive(Default)]
struct ImproperClassifier {
    train_calls: AtomicUsize,
}

impl ProbabilisticClassifier for ImproperClassifier {
    fn train(&self, _: &DataSet, _: &Marginals, _: usize) -> ModelResult<Marginals> {
        self.train_calls.fetch_add(1, Ordering::SeqCst);
        Err(ModelError::improper("mock inference"))
    }

    fn predict(&self, dataset: &DataSet, _: &Marginals) -> ModelResult<Vec<Vec<Bernoulli>>> {
        Ok((0..dataset.num_residents())
            .map(|r| vec![Bernoulli::from_prob(0.6); dataset.num_examples(r)])
            .collect())
    }

    fn compute_evidence(&self, _: &DataSet, _: &Marginals) -> ModelResult<Bernoulli> {
        Ok(Bernoulli::from_log_odds(-1.0))
    }
}

fn line_pool(n: usize) -> DataSet {
    let features = (0..n).map(|i| vec![i as f64 / n as f64 - 0.5, 1.0]).collect();
    let labels = (0..n).map(|i| i % 2 == 0).collect();
    DataSet::new(vec![features], vec![labels]).unwrap()
}

fn priors() -> Marginals {
    Marginals::isotropic(2, Gaussian::standard(), Gamma::default())
}

#[test]
fn partition_stays_disjoint_and_exhaustive() {
    let mut rng = StdRng::seed_from_u64(5);
    for _ in 0..20 {
        let len = rng.gen_range(1..30);
        let mut partition = Partition::new(len);
        for _ in 0..40 {
            let index = rng.gen_range(0..len + 3);
            let was_labeled = partition.is_labeled(index);
            match partition.move_to_labeled(index) {
                Ok(()) => assert!(!was_labeled && index < len),
                Err(ActiveError::AlreadyLabeled { .. }) => assert!(was_labeled),
                Err(ActiveError::IndexOutOfRange { .. }) => assert!(index >= len),
                Err(other) => panic!("unexpected error {other}"),
            }
            assert!(partition.is_consistent());
            let all: BTreeSet<usize> = partition
                .labeled()
                .union(partition.unlabeled())
                .copied()
                .collect();
            assert_eq!(all, (0..len).collect());
        }
    }
}

#[test]
fn voi_selection_has_no_side_effects() {
    let mut policy = VoiPolicy::new(
        line_pool(6),
        Arc::new(BinaryModel::default()),
        RiskObjective::default(),
        false,
    )
    .unwrap();
    policy.update_model(1).unwrap();
    policy.update_model(4).unwrap();

    let labeled = policy.partition().labeled().clone();
    let unlabeled = policy.partition().unlabeled().clone();
    let labels = policy.state().labels().to_vec();
    let probabilities = [0.2, 0.4, 0.5, 0.55, 0.7, 0.9];

    let first = policy.arg_max_voi(&probabilities, &priors()).unwrap();
    let second = policy.arg_max_voi(&probabilities, &priors()).unwrap();

    assert_eq!(first, second);
    assert_eq!(policy.partition().labeled(), &labeled);
    assert_eq!(policy.partition().unlabeled(), &unlabeled);
    assert_eq!(policy.state().labels(), labels.as_slice());
}

#[test]
fn evidence_selection_leaves_partition_unchanged() {
    let mut policy = EvidencePolicy::new(line_pool(8), Arc::new(BinaryModel::default()), false)
        .unwrap()
        .with_shortlist_size(4);
    policy.update_model(0).unwrap();
    let before = policy.partition().clone();
    let labels = policy.state().labels().to_vec();

    policy.arg_max_voi(&[0.5; 8], &priors()).unwrap();

    assert_eq!(policy.partition(), &before);
    assert_eq!(policy.state().labels(), labels.as_slice());
}

#[test]
fn uncertainty_selects_most_uncertain() {
    let mut forward = UncertaintyPolicy::new(line_pool(3), false).unwrap();
    assert_eq!(forward.arg_max_voi(&[0.1, 0.5, 0.9], &priors()).unwrap().index, 1);

    let mut reversed = UncertaintyPolicy::new(line_pool(3), true).unwrap();
    let extreme = reversed.arg_max_voi(&[0.1, 0.5, 0.9], &priors()).unwrap().index;
    assert!(extreme == 0 || extreme == 2);
    // exactly tied extremes: the lower index wins
    assert_eq!(reversed.arg_max_voi(&[0.25, 0.5, 0.75], &priors()).unwrap().index, 0);
}

#[test]
fn random_policy_is_uniform() {
    const DRAWS: usize = 5000;
    let mut policy = RandomPolicy::new(line_pool(5), 0).unwrap();
    let mut counts = [0usize; 5];
    for _ in 0..DRAWS {
        let selection = policy.arg_max_voi(&[0.5; 5], &priors()).unwrap();
        counts[selection.index] += 1;
    }

    let expected = DRAWS as f64 / 5.0;
    let chi_square: f64 = counts
        .iter()
        .map(|&c| (c as f64 - expected).powi(2) / expected)
        .sum();
    // 4 degrees of freedom, p = 0.0005
    assert!(chi_square < 20.0, "chi-square {} for {:?}", chi_square, counts);
}

#[test]
fn transfer_seed_labels_one_of_each_class() {
    let data = DataSet::new(
        vec![(0..5).map(|i| vec![i as f64]).collect()],
        vec![vec![true, false, true, false, true]],
    )
    .unwrap();
    let mut policy = UncertaintyPolicy::new(data, false).unwrap();
    assert!(policy.partition().labeled().is_empty());

    let seeded = policy.transfer_seed(1, 0).unwrap();

    let labels = policy.state().labels().to_vec();
    let labeled = policy.partition().labeled();
    assert_eq!(seeded.len(), 2);
    assert_eq!(labeled.len(), 2);
    assert_eq!(policy.partition().unlabeled().len(), 3);
    assert_eq!(labeled.iter().filter(|&&i| labels[i]).count(), 1);
    assert_eq!(labeled.iter().filter(|&&i| !labels[i]).count(), 1);
}

#[test]
fn voi_falls_back_to_priors_when_training_is_improper() {
    let classifier = Arc::new(ImproperClassifier::default());
    let mut policy = VoiPolicy::new(
        line_pool(4),
        Arc::clone(&classifier),
        RiskObjective::default(),
        false,
    )
    .unwrap();
    let probabilities = [0.6; 4];

    let estimates = policy.estimate_candidates(&probabilities, &priors()).unwrap();
    assert_eq!(estimates.len(), 4);
    assert_eq!(classifier.train_calls.load(Ordering::SeqCst), 8);

    // priors predict 0.6 everywhere, exactly as the live state does
    let current = policy.current_risk(&probabilities).unwrap();
    for e in &estimates {
        let labeled_true = 1.0 * (1.0 - 0.6);
        let labeled_false = 1.0 * 0.6;
        let rest = 3.0 * 2.0 * 0.6 * 0.4;
        assert!((e.risk_if_true - (labeled_true + rest)).abs() < 1e-12);
        assert!((e.risk_if_false - (labeled_false + rest)).abs() < 1e-12);
        assert!(e.value < current);
    }

    assert!(policy.arg_max_voi(&probabilities, &priors()).is_ok());
}

#[test]
fn evidence_falls_back_to_priors_when_training_is_improper() {
    let classifier = Arc::new(ImproperClassifier::default());
    let mut policy = EvidencePolicy::new(line_pool(4), Arc::clone(&classifier), false).unwrap();
    let selection = policy.arg_max_voi(&[0.6; 4], &priors()).unwrap();
    assert!(selection.index < 4);
    assert_eq!(selection.value, 1.0);
    assert!(classifier.train_calls.load(Ordering::SeqCst) > 0);
}

#[test]
fn active_loop_stops_once_pool_is_empty() {
    let mut toy = ToyData::new(ToyDataConfig {
        num_residents: 2,
        num_features: 2,
        seed: 3,
        ..ToyDataConfig::default()
    })
    .unwrap();
    let train = toy.generate(0.0, 4).unwrap();
    let holdout = toy.generate(0.0, 10).unwrap();

    let config = ExperimentConfig::default();
    let classifier = Arc::new(BinaryModel::default());
    let priors = config.model.priors(train.num_features());
    let mut learners =
        create_learners(LearnerKind::Voi, &train, Arc::clone(&classifier), &config).unwrap();
    let mut experiment = Experiment::new("VOI+", classifier, &config);

    experiment
        .run_active(&train, &holdout, 10, &priors, &mut learners)
        .unwrap();
    assert_eq!(experiment.journal().entries().len(), 8);
    assert!(learners.iter().all(|l| l.is_exhausted()));

    // a second run over exhausted pools selects nothing and still succeeds
    let before: Vec<Partition> = learners.iter().map(|l| l.partition().clone()).collect();
    experiment
        .run_active(&train, &holdout, 10, &priors, &mut learners)
        .unwrap();
    assert!(experiment.journal().entries().is_empty());
    let after: Vec<Partition> = learners.iter().map(|l| l.partition().clone()).collect();
    assert_eq!(before, after);

    let mut direct = RandomPolicy::new(train.resident_subset(0).unwrap(), 0).unwrap();
    for i in 0..4 {
        direct.update_model(i).unwrap();
    }
    assert!(matches!(
        direct.arg_max_voi(&[0.5; 4], &priors),
        Err(ActiveError::EmptyUnlabeledPool)
    ));
}
