//! Toy Active Transfer Experiment
//!
//! Trains a community model on synthetic residents, compares plain online
//! learning with online learning from the community prior, then runs the
//! active learners with and without transfer.
//!
//! Run with:
//! ```
//! RUST_LOG=info cargo run --example toy_active --release
//! ```

use std::sync::Arc;

use active_transfer_core::{
    create_learners, BinaryModel, DataSet, Experiment, ExperimentConfig, LearnerKind, Marginals,
    ToyData, ToyDataConfig,
};
use anyhow::Result;
use tracing_subscriber::EnvFilter;

const NOISY_EXAMPLE_PROPORTION: f64 = 0.9;
const NUM_FEATURES: usize = 10;
const TRAIN_EXAMPLES: usize = 200;
const HOLDOUT_EXAMPLES: usize = 1000;

struct ToySets {
    community: DataSet,
    online: (DataSet, DataSet),
    active: (DataSet, DataSet),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║  Toy Active Transfer - community prior vs. flat prior        ║");
    println!("║  Learners: Random, US, CS, VOI+, VOI-                        ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let config = load_config();
    let classifier = Arc::new(config.model.classifier());
    let priors = config.model.priors(NUM_FEATURES);

    let sets = generate()?;
    println!("Data generated");

    println!("Training community model");
    let mut community = Experiment::new("Community", Arc::clone(&classifier), &config);
    let community_posteriors = community.run_batch(&sets.community, &priors)?.community();

    println!("\n=== Transfer ===");
    let (train, holdout) = &sets.online;
    for (name, prior) in [("Online", &priors), ("Community", &community_posteriors)] {
        let mut experiment = Experiment::new(name, Arc::clone(&classifier), &config);
        experiment.run_online(train, holdout, prior)?;
        let summary = experiment.summary();
        println!(
            "  {:<10} final holdout accuracy {:.3}",
            name, summary.final_accuracy
        );
    }

    active_transfer(&classifier, &config, &sets.active, "Toy Active", &priors)?;
    println!("\nNote that transfer is very effective here, so active selection adds little");
    active_transfer(
        &classifier,
        &config,
        &sets.active,
        "Toy Active Transfer",
        &community_posteriors,
    )?;

    Ok(())
}

fn load_config() -> ExperimentConfig {
    ExperimentConfig::load_from_file("config/experiment.toml").unwrap_or_else(|err| {
        eprintln!("Falling back to default config: {err}");
        ExperimentConfig::default()
    })
}

fn generate() -> Result<ToySets> {
    let toy = |seed: u64| {
        ToyData::new(ToyDataConfig {
            num_residents: 5,
            num_features: NUM_FEATURES,
            seed,
            ..ToyDataConfig::default()
        })
    };

    let community = toy(0)?.generate(0.0, TRAIN_EXAMPLES)?;

    let mut online = toy(1)?;
    let online_sets = (
        online.generate(0.0, TRAIN_EXAMPLES)?,
        online.generate(0.0, HOLDOUT_EXAMPLES)?,
    );

    let mut active = toy(2)?;
    let active_sets = (
        active.generate(NOISY_EXAMPLE_PROPORTION, TRAIN_EXAMPLES)?,
        active.generate(0.0, HOLDOUT_EXAMPLES)?,
    );

    Ok(ToySets {
        community,
        online: online_sets,
        active: active_sets,
    })
}

fn active_transfer(
    classifier: &Arc<BinaryModel>,
    config: &ExperimentConfig,
    (train, holdout): &(DataSet, DataSet),
    title: &str,
    priors: &Marginals,
) -> Result<()> {
    println!("\n=== {} ===", title);
    let kinds = [
        LearnerKind::Random,
        LearnerKind::Uncertainty,
        LearnerKind::Certainty,
        LearnerKind::Voi,
        LearnerKind::VoiReversed,
    ];

    for kind in kinds {
        println!("Testing {} ({})", title, kind);
        let mut learners = create_learners(kind, train, Arc::clone(classifier), config)?;
        let mut experiment = Experiment::new(kind.label(), Arc::clone(classifier), config);
        experiment.run_active(
            train,
            holdout,
            config.experiment.active_steps,
            priors,
            &mut learners,
        )?;

        let summary = experiment.summary();
        println!(
            "  {:<8} rounds {:>3}  final holdout accuracy {:.3}",
            summary.experiment, summary.rounds, summary.final_accuracy
        );
    }

    Ok(())
}
