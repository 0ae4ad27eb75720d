//! Five-fold cross-validation on synthetic sphere volumes, followed by
//! mean and vote ensembles of the five fold models on a held-out set.
//!
//! The "models" are stand-ins that return a noisy copy of the ground truth;
//! training itself lives outside this crate.
//!
//! Run with `RUST_LOG=debug cargo run --example cross_validation` to see
//! the fold and ensemble events.

use std::error::Error;

use kfold_ensemble::{
    mean_dice, seeded_rng,
    synthetic::{corrupt_label, SphereVolume},
    AsDiscrete, CrossValidationBuilder, Ensemble, Float, MeanEnsemble, Sample, Tensor, Transform,
    VoteEnsemble,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const TRAIN_CASES: usize = 30;
const TEST_CASES: usize = 8;
const NFOLDS: usize = 5;

struct Case {
    id: u64,
    sample: Sample,
    label: Tensor,
}

struct StandInModel {
    seed: u64,
    flip_probability: Float,
}

impl StandInModel {
    // pretend to fit on `train`; a bigger training set gives a better model
    fn fit(fold: usize, train: &[&Case]) -> Self {
        Self {
            seed: 1000 + fold as u64,
            flip_probability: 2.0 / train.len() as Float,
        }
    }

    // foreground probability map shaped [batch=1, channel=1, d, h, w]
    fn predict(&self, case: &Case) -> Result<Tensor, Box<dyn Error>> {
        let mut rng = seeded_rng(self.seed ^ case.id);
        let mut out = corrupt_label(&case.label, self.flip_probability, &mut rng)?;
        let noise = Tensor::randn(out.shape(), 0.0, 0.05, &mut rng);
        for (p, n) in out.data.iter_mut().zip(&noise.data) {
            *p = (0.1 + 0.8 * *p + n).clamp(0.0, 1.0);
        }
        let shape = batched(out.shape());
        Ok(out.reshape(&shape)?)
    }
}

fn batched(shape: &[usize]) -> Vec<usize> {
    let mut batched = vec![1];
    batched.extend_from_slice(shape);
    batched
}

fn make_cases(volume: &SphereVolume, ids: std::ops::Range<u64>) -> Vec<Case> {
    ids.map(|id| {
        let (_, label) = volume.generate(id);
        Case {
            id,
            sample: Sample::numbered("synthetic", id as usize),
            label,
        }
    })
    .collect()
}

fn mean_of(values: &[Float]) -> Float {
    values.iter().sum::<Float>() / values.len().max(1) as Float
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let volume = SphereVolume::builder()
        .size(32, 32, 32)
        .num_objects(6)
        .radius(3, 8)
        .noise_std(0.05)
        .build()?;

    let cases = make_cases(&volume, 0..TRAIN_CASES as u64);
    let test = make_cases(&volume, TRAIN_CASES as u64..(TRAIN_CASES + TEST_CASES) as u64);

    let cv = CrossValidationBuilder::new()
        .nfolds(NFOLDS)
        .seed(12345)
        .build(cases)?;
    info!(sizes = ?cv.assignment().fold_sizes(), "folds assigned");

    let threshold = AsDiscrete::Threshold(0.5);
    let mut models = Vec::with_capacity(NFOLDS);
    for split in cv.splits() {
        let model = StandInModel::fit(split.fold, &split.train);

        let mut scores = Vec::with_capacity(split.val.len());
        for case in &split.val {
            let pred = threshold.apply(&model.predict(case)?)?;
            let label = case.label.clone().reshape(&batched(case.label.shape()))?;
            if let Some(dice) = mean_dice(&pred, &label, true)? {
                scores.push(dice);
            }
        }
        info!(
            fold = split.fold,
            train = split.train.len(),
            val = split.val.len(),
            first_val = %split.val[0].sample.image.display(),
            dice = mean_of(&scores),
            "fold validated"
        );
        models.push(model);
    }

    let mean = MeanEnsemble::with_weights(vec![0.95, 0.94, 0.95, 0.94, 0.90]);
    let vote = VoteEnsemble::new();
    let mut mean_scores = Vec::with_capacity(test.len());
    let mut vote_scores = Vec::with_capacity(test.len());
    for case in &test {
        let members = models
            .iter()
            .map(|model| model.predict(case))
            .collect::<Result<Vec<_>, _>>()?;
        let label = case.label.clone().reshape(&batched(case.label.shape()))?;

        let averaged = threshold.apply(&mean.combine(&members)?)?;
        if let Some(dice) = mean_dice(&averaged, &label, true)? {
            mean_scores.push(dice);
        }

        let discrete = members
            .iter()
            .map(|member| threshold.apply(member))
            .collect::<Result<Vec<_>, _>>()?;
        let voted = vote.combine(&discrete)?;
        if let Some(dice) = mean_dice(&voted, &label, true)? {
            vote_scores.push(dice);
        }
    }

    info!(dice = mean_of(&mean_scores), "mean ensemble");
    info!(dice = mean_of(&vote_scores), "vote ensemble");
    Ok(())
}
