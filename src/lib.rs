/*!
`fictitious_play` — fictitious play on seeded 2×2 zero-sum games.

What it does
- Builds a 2×2 zero-sum game from a seed (`game::Game::generate`).
- Runs the best-response dynamic on it: each round both players answer the
  opponent's empirical frequency of the first action with a pure best response.
- Stops once both players' last `W` empirical probabilities lie within
  `epsilon` of each other, or once the iteration budget runs out.
- Runs many seeded trials in parallel and merges their trajectories into one
  dataset (`experiments::run_batch`).

How to use (call surface only)
- One trial: `systems::fictitious_play::run_trial(&game, &cfg, seed, None)`.
- A recorded trial: pass `Some(RecordTo { game_id, output })`.
- A batch: `experiments::run_batch(&BatchConfig::default())`.
- Reading results: `dataset::DatasetView::load(path)`.

Underneath, a trial is one instance of the generic refinement loop below:
`θ_{t+1} = update(θ_t, measure(simulate(θ_t)))`, repeated until a stopping
predicate holds.

What it does NOT do
- No N-player or N-action games, no equilibrium solving, no mixed responses.
*/

/// Result of [`refine_det`]: the last parameter token, how many updates were
/// applied, and whether the stopping predicate fired.
#[derive(Clone, Debug)]
pub struct Refined<P> {
    pub theta: P,
    pub iters: usize,
    pub converged: bool,
}

/// Deterministic refinement: θ_{t+1} = update(θ_t, measure(simulate(θ_t))).
pub fn refine_det<P, D, M, Sim, Meas, Upd, Conv>(
    mut theta: P,
    mut simulate: Sim,
    mut measure: Meas,
    mut update: Upd,
    converged: Conv,
    max_iters: usize,
) -> Refined<P>
where
    Sim: FnMut(&P) -> D,
    Meas: FnMut(&D) -> M,
    Upd: FnMut(&P, &M) -> P,
    Conv: Fn(&P, &P) -> bool,
{
    for i in 0..max_iters {
        let data = simulate(&theta);
        let pi = measure(&data);
        let theta_next = update(&theta, &pi);
        if converged(&theta, &theta_next) {
            return Refined { theta: theta_next, iters: i + 1, converged: true };
        }
        theta = theta_next;
    }
    Refined { theta, iters: max_iters, converged: false }
}

pub mod error;
pub mod mechanics;
pub mod game;
pub mod systems;
pub mod dataset;
pub mod experiments;

pub use error::{Error, Result};
pub use game::{Correction, Game, GameSpec};
pub use mechanics::{Action, ConvergenceWindow, Role, best_response};
pub use systems::fictitious_play::{RecordTo, run_trial, simulate_trajectory};
pub use systems::sdk::{Trajectory, TrialConfig, TrialOutcome};
pub use dataset::{DatasetView, TrajectoryRow};
pub use experiments::{
    BatchConfig, BatchReport, MergeReport, merge_trial_units, run_batch, run_batch_with_progress,
};
