//! Fictitious play on one 2×2 zero-sum game.
//!
//! Each round both players best-respond to the opponent's empirical
//! probability of the first action so far. A trial stops once the last
//! `window_size` empirical probabilities of *both* players sit within
//! `epsilon`, or once the budget runs out.
//!
//! The loop is [`refine_det`] with
//! - θ = action tallies and the latest window spreads,
//! - simulate = both best responses,
//! - measure = first-action indicators,
//! - update = bump tallies, slide windows, record the round,
//! - converged = both spreads under `epsilon`, gated on full windows.

use std::path::PathBuf;

use crate::dataset::{self, unit_path};
use crate::error::{Error, Result};
use crate::game::Game;
use crate::mechanics::{Action, ConvergenceWindow, Role, best_response, stoch};
use crate::refine_det;
use crate::systems::sdk::{Trajectory, TrialConfig, TrialOutcome};

/// Where a recorded trial persists its trajectory.
#[derive(Clone, Debug)]
pub struct RecordTo {
    /// Trial identifier; required whenever a trajectory is recorded.
    pub game_id: Option<u64>,
    /// Batch output destination; the unit lands next to it (see [`unit_path`]).
    pub output: PathBuf,
}

/// θ for one trial. `rounds` actions observed per player so far.
#[derive(Clone, Copy, Debug)]
struct Empirical {
    rounds: u64,
    rowena: u64,
    colin: u64,
    spread: (f64, f64),
}

impl Empirical {
    #[inline]
    fn probs(&self) -> (f64, f64) {
        let n = self.rounds as f64;
        (self.rowena as f64 / n, self.colin as f64 / n)
    }
}

/// Both players' best responses for the next round.
#[derive(Clone, Copy, Debug)]
struct Play {
    rowena: Action,
    colin: Action,
}

struct Finished {
    state: Empirical,
    converged: bool,
}

fn play(
    game: &Game,
    cfg: &TrialConfig,
    seed: u64,
    mut trajectory: Option<&mut Trajectory>,
) -> Result<Finished> {
    cfg.validate()?;

    let mut rng = stoch::stream(seed);
    let a0 = stoch::coin(&mut rng);
    let b0 = stoch::coin(&mut rng);

    let theta0 = Empirical {
        rounds: 1,
        rowena: a0.first_indicator(),
        colin: b0.first_indicator(),
        spread: (0.0, 0.0),
    };

    let mut windows = [
        ConvergenceWindow::new(cfg.window_size),
        ConvergenceWindow::new(cfg.window_size),
    ];
    let (r0, c0) = theta0.probs();
    windows[0].push(r0);
    windows[1].push(c0);
    if let Some(t) = trajectory.as_deref_mut() {
        t.push(0, r0, c0);
    }

    let p1 = game.payoffs(Role::Row);
    let p2 = game.payoffs(Role::Column);
    let report_every = (cfg.effective_budget() / 10).max(1);
    let gate = cfg.window_size as u64;
    let epsilon = cfg.epsilon;

    let simulate = |th: &Empirical| {
        let (q_rowena, q_colin) = th.probs();
        Play {
            rowena: best_response(&p1, Role::Row, q_colin),
            colin: best_response(&p2, Role::Column, q_rowena),
        }
    };

    let measure = |p: &Play| (p.rowena.first_indicator(), p.colin.first_indicator());

    let update = |th: &Empirical, &(dr, dc): &(u64, u64)| {
        let i = th.rounds;
        let mut next = Empirical {
            rounds: i + 1,
            rowena: th.rowena + dr,
            colin: th.colin + dc,
            spread: th.spread,
        };
        let (r, c) = next.probs();
        windows[0].push(r);
        windows[1].push(c);
        next.spread = (windows[0].spread(), windows[1].spread());
        if let Some(t) = trajectory.as_deref_mut() {
            t.push(i, r, c);
        }
        if i % report_every == 0 {
            log::trace!(
                "game {seed} iteration {i}: rowena {r:.4} colin {c:.4} spread ({:.2e}, {:.2e})",
                next.spread.0,
                next.spread.1,
            );
        }
        next
    };

    // Loop index i = rounds - 1; only judge once i > W so both windows are full.
    let converged = |_prev: &Empirical, next: &Empirical| {
        next.rounds - 1 > gate && next.spread.0 < epsilon && next.spread.1 < epsilon
    };

    let out = refine_det(
        theta0,
        simulate,
        measure,
        update,
        converged,
        cfg.max_iterations as usize,
    );

    Ok(Finished { state: out.theta, converged: out.converged })
}

/// Run one trial on `game`, seeding the opening moves from `seed`.
///
/// Without `record`, returns tallies or [`TrialOutcome::DidNotConverge`].
/// With `record`, writes the trajectory unit and returns
/// [`TrialOutcome::Recorded`]; a missing `game_id` fails before any play.
pub fn run_trial(
    game: &Game,
    cfg: &TrialConfig,
    seed: u64,
    record: Option<&RecordTo>,
) -> Result<TrialOutcome> {
    if let Some(rec) = record {
        let game_id = rec.game_id.ok_or(Error::MissingGameId)?;
        let trajectory = simulate_trajectory(game, cfg, seed, game_id)?;
        let path = unit_path(&rec.output, game_id);
        dataset::write_unit(&path, &trajectory)?;
        let outcome = TrialOutcome::Recorded {
            converged: trajectory.converged,
            iteration: trajectory.len() as u64,
            path,
        };
        log::debug!("game {game_id} (seed {seed}): {outcome:?}");
        return Ok(outcome);
    }

    let done = play(game, cfg, seed, None)?;
    let outcome = if done.converged {
        TrialOutcome::Converged {
            iteration: done.state.rounds,
            rowena_count: done.state.rowena,
            colin_count: done.state.colin,
        }
    } else {
        TrialOutcome::DidNotConverge { iteration: cfg.effective_budget() }
    };
    log::debug!("seed {seed}: {outcome:?}");
    Ok(outcome)
}

/// Run one trial and keep the full trajectory in memory.
pub fn simulate_trajectory(
    game: &Game,
    cfg: &TrialConfig,
    seed: u64,
    game_id: u64,
) -> Result<Trajectory> {
    let mut trajectory = Trajectory::new(game_id, game.pairs(), seed, cfg);
    let done = play(game, cfg, seed, Some(&mut trajectory))?;
    trajectory.converged = done.converged;
    debug_assert_eq!(trajectory.len() as u64, done.state.rounds);
    Ok(trajectory)
}
