//! Many independent trials, one dataset.
//!
//! Seeds are drawn without replacement from a master stream, each trial index
//! gets its own seed, builds its own game and stream from it, and writes its
//! own unit. Nothing is shared between trials, so they run on the rayon pool
//! in any order. Once all have finished the units are merged.

use std::fs;
use std::path::PathBuf;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::experiments::merge::{MERGE_BATCH_SIZE, MergeReport, merge_trial_units};
use crate::game::{Game, GameSpec};
use crate::mechanics::stoch;
use crate::systems::fictitious_play::{RecordTo, run_trial};
use crate::systems::sdk::{TrialConfig, TrialOutcome};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub num_trials: usize,
    pub trial: TrialConfig,
    /// Merged dataset path; units are written beside it.
    pub output: PathBuf,
    /// Seed of the stream the trial seeds are drawn from. Random when unset.
    pub master_seed: Option<u64>,
    pub merge_batch_size: usize,
    pub spec: GameSpec,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            num_trials: 1_000,
            trial: TrialConfig { max_iterations: 100_000, window_size: 10, epsilon: 1e-4 },
            output: PathBuf::from("outputs").join("mega.jsonl"),
            master_seed: None,
            merge_batch_size: MERGE_BATCH_SIZE,
            spec: GameSpec::default(),
        }
    }
}

impl BatchConfig {
    pub fn with_trials(mut self, num_trials: usize) -> Self {
        self.num_trials = num_trials;
        self
    }

    pub fn with_trial(mut self, trial: TrialConfig) -> Self {
        self.trial = trial;
        self
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    pub fn with_master_seed(mut self, seed: u64) -> Self {
        self.master_seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.trial.validate()?;
        if self.num_trials as u64 > stoch::SEED_SPACE {
            return Err(Error::InvalidConfig(format!(
                "{} trials exceed the {} available seeds",
                self.num_trials,
                stoch::SEED_SPACE
            )));
        }
        if self.merge_batch_size == 0 {
            return Err(Error::InvalidConfig("merge_batch_size must be at least 1".into()));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchReport {
    pub master_seed: u64,
    /// Seed assigned to each trial index.
    pub seeds: Vec<u64>,
    pub converged: usize,
    pub did_not_converge: usize,
    /// Trial indices whose unit could not be produced.
    pub failed: Vec<usize>,
    pub merge: MergeReport,
}

/// Seeds for trial indices `0..num_trials`, drawn from `master_seed`.
pub fn assign_seeds(master_seed: u64, num_trials: usize) -> Result<Vec<u64>> {
    let mut rng = stoch::stream(master_seed);
    stoch::sample_seeds(&mut rng, num_trials)
        .ok_or_else(|| Error::InvalidConfig(format!("cannot draw {num_trials} distinct seeds")))
}

pub fn run_batch(cfg: &BatchConfig) -> Result<BatchReport> {
    run_batch_with_progress(cfg, |_| {})
}

/// [`run_batch`], calling `on_trial(index)` as each trial finishes (from pool
/// threads, in completion order).
pub fn run_batch_with_progress<F>(cfg: &BatchConfig, on_trial: F) -> Result<BatchReport>
where
    F: Fn(usize) + Sync,
{
    cfg.validate()?;
    let dir = crate::dataset::output_dir(&cfg.output);
    fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;

    let master_seed = cfg.master_seed.unwrap_or_else(rand::random);
    let seeds = assign_seeds(master_seed, cfg.num_trials)?;
    log::info!(
        "running {} trials (master seed {master_seed}, max_iterations {}, window {}, epsilon {:e})",
        cfg.num_trials,
        cfg.trial.max_iterations,
        cfg.trial.window_size,
        cfg.trial.epsilon,
    );

    let outcomes: Vec<Result<TrialOutcome>> = seeds
        .par_iter()
        .enumerate()
        .map(|(i, &seed)| {
            let game = Game::generate(seed, &cfg.spec);
            let rec = RecordTo { game_id: Some(i as u64), output: cfg.output.clone() };
            let outcome = run_trial(&game, &cfg.trial, seed, Some(&rec));
            on_trial(i);
            outcome
        })
        .collect();

    let mut report = BatchReport { master_seed, ..Default::default() };
    for (i, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(o) if o.converged() => report.converged += 1,
            Ok(_) => report.did_not_converge += 1,
            Err(e) => {
                log::warn!("trial {i} (seed {}) failed: {e}", seeds[i]);
                report.failed.push(i);
            }
        }
    }
    log::info!(
        "trials done: {} converged, {} did not converge, {} failed",
        report.converged,
        report.did_not_converge,
        report.failed.len()
    );

    report.merge = merge_trial_units(&cfg.output, cfg.merge_batch_size)?;
    report.seeds = seeds;
    Ok(report)
}
