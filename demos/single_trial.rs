// demos/single_trial.rs
// Run with:
//   cargo run --example single_trial

use fictitious_play::{Game, TrialConfig, TrialOutcome, run_trial, simulate_trajectory};

fn main() {
    let seed = 104_754_894;

    // An arbitrary 2x2 zero-sum game, pretty-printed.
    let game = Game::from_seed(seed);
    println!("{game}");

    // Lower epsilon means a stricter criterion and usually more iterations.
    let cfg = TrialConfig::default()
        .with_max_iterations(10_000)
        .with_epsilon(1e-3);

    match run_trial(&game, &cfg, seed, None) {
        Ok(TrialOutcome::Converged { iteration, rowena_count, colin_count }) => {
            let n = iteration as f64;
            println!(
                "Converged after {iteration} iterations: ({:.3}, {:.3}), epsilon = {}",
                rowena_count as f64 / n,
                colin_count as f64 / n,
                cfg.epsilon
            );
        }
        Ok(other) => println!("did not converge after {} iterations", other.iteration()),
        Err(e) => eprintln!("trial failed: {e}"),
    }

    // Same trial, kept in memory.
    if let Ok(t) = simulate_trajectory(&game, &cfg, seed, 0) {
        let last = t.len() - 1;
        println!(
            "{} rows; last: iteration {} rowena {:.4} colin {:.4}",
            t.len(),
            t.iteration[last],
            t.rowena_probabilities[last],
            t.colin_probabilities[last]
        );
    }
}
