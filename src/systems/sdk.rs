// src/systems/sdk.rs

//! # Trial SDK
//!
//! Shared vocabulary for running one fictitious-play trial:
//!
//! - [`TrialConfig`]: iteration cap, window capacity and tolerance.
//! - [`TrialOutcome`]: what a trial hands back. Exhausting the budget is a
//!   variant of its own, not a magic number.
//! - [`Trajectory`]: the per-round record, kept columnar (parallel vectors)
//!   and expanded into [`TrajectoryRow`]s only when persisted.
//!
//! ## Iteration accounting
//! Round 0 is the random opening. Loop index `i` runs `1..=max_iterations`;
//! after round `i` each player has `i + 1` observed actions. A trial that
//! stops at loop index `i` reports `iteration = i + 1`, and its trajectory has
//! exactly that many rows (iterations `0..=i`). A trial that never stops
//! reports `max_iterations + 1`, the effective budget.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::dataset::TrajectoryRow;
use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrialConfig {
    pub max_iterations: u64,
    pub window_size: usize,
    pub epsilon: f64,
}

impl Default for TrialConfig {
    fn default() -> Self {
        Self { max_iterations: 1_000, window_size: 10, epsilon: 1e-3 }
    }
}

impl TrialConfig {
    pub fn with_max_iterations(mut self, max_iterations: u64) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Configured cap plus one, so the cap itself is played.
    pub fn effective_budget(&self) -> u64 {
        self.max_iterations.saturating_add(1)
    }

    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(Error::InvalidConfig("window_size must be at least 1".into()));
        }
        if self.max_iterations == 0 {
            return Err(Error::InvalidConfig("max_iterations must be at least 1".into()));
        }
        if self.max_iterations == u64::MAX {
            return Err(Error::InvalidConfig(format!(
                "max_iterations must be below {}; the cap itself is played",
                u64::MAX
            )));
        }
        if usize::try_from(self.max_iterations).is_err() {
            return Err(Error::InvalidConfig(format!(
                "max_iterations {} does not fit this platform",
                self.max_iterations
            )));
        }
        Ok(())
    }
}

/// End state of one trial.
#[derive(Clone, Debug, PartialEq)]
pub enum TrialOutcome {
    /// Both windows settled. Counts are first-action tallies over `iteration` rounds.
    Converged { iteration: u64, rowena_count: u64, colin_count: u64 },
    /// Budget exhausted; `iteration` equals the effective budget.
    DidNotConverge { iteration: u64 },
    /// A trajectory was persisted to `path` instead of returning counts.
    Recorded { converged: bool, iteration: u64, path: PathBuf },
}

impl TrialOutcome {
    pub fn converged(&self) -> bool {
        match self {
            TrialOutcome::Converged { .. } => true,
            TrialOutcome::DidNotConverge { .. } => false,
            TrialOutcome::Recorded { converged, .. } => *converged,
        }
    }

    pub fn iteration(&self) -> u64 {
        match self {
            TrialOutcome::Converged { iteration, .. }
            | TrialOutcome::DidNotConverge { iteration }
            | TrialOutcome::Recorded { iteration, .. } => *iteration,
        }
    }
}

/// Columnar record of one trial plus the configuration that produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct Trajectory {
    pub game_id: u64,
    pub game: [[i64; 2]; 4],
    pub seed: u64,
    pub max_iteration: u64,
    pub epsilon: f64,
    pub window_size: usize,
    pub converged: bool,
    pub iteration: Vec<u64>,
    pub rowena_probabilities: Vec<f64>,
    pub colin_probabilities: Vec<f64>,
}

impl Trajectory {
    pub fn new(game_id: u64, game: [[i64; 2]; 4], seed: u64, cfg: &TrialConfig) -> Self {
        let cap = usize::try_from(cfg.effective_budget()).unwrap_or(usize::MAX).min(1 << 16);
        Self {
            game_id,
            game,
            seed,
            max_iteration: cfg.effective_budget(),
            epsilon: cfg.epsilon,
            window_size: cfg.window_size,
            converged: false,
            iteration: Vec::with_capacity(cap),
            rowena_probabilities: Vec::with_capacity(cap),
            colin_probabilities: Vec::with_capacity(cap),
        }
    }

    /// Append one round. The three columns only ever grow together.
    pub fn push(&mut self, iteration: u64, rowena: f64, colin: f64) {
        self.iteration.push(iteration);
        self.rowena_probabilities.push(rowena);
        self.colin_probabilities.push(colin);
    }

    pub fn len(&self) -> usize {
        debug_assert_eq!(self.iteration.len(), self.rowena_probabilities.len());
        debug_assert_eq!(self.iteration.len(), self.colin_probabilities.len());
        self.iteration.len()
    }

    pub fn is_empty(&self) -> bool {
        self.iteration.is_empty()
    }

    /// One row per round, echoing game and configuration on every row.
    pub fn rows(&self) -> impl Iterator<Item = TrajectoryRow> + '_ {
        self.iteration
            .iter()
            .zip(&self.rowena_probabilities)
            .zip(&self.colin_probabilities)
            .map(move |((&iteration, &rowena), &colin)| TrajectoryRow {
                iteration,
                game_id: self.game_id,
                game: self.game,
                seed: self.seed,
                max_iteration: self.max_iteration,
                epsilon: self.epsilon,
                window_size: self.window_size,
                rowena_probabilities: rowena,
                colin_probabilities: colin,
            })
    }
}
