// demos/small_batch.rs
// Run with:
//   cargo run --example small_batch

use fictitious_play::{BatchConfig, DatasetView, TrialConfig, run_batch};

fn main() {
    let cfg = BatchConfig::default()
        .with_trials(50)
        .with_master_seed(7)
        .with_output("outputs/demo.jsonl")
        .with_trial(TrialConfig::default().with_max_iterations(10_000).with_epsilon(1e-4));

    let report = match run_batch(&cfg) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("batch failed: {e}");
            return;
        }
    };
    println!("== Batch ==");
    println!("converged        -> {}", report.converged);
    println!("did not converge -> {}", report.did_not_converge);
    println!("rows             -> {}", report.merge.rows_written);

    let Ok(view) = DatasetView::load(&cfg.output) else { return };
    println!("== Histogram of convergence iterations ==");
    for bin in view.histogram(8) {
        println!("{:>6}..={:<6} {}", bin.lo, bin.hi, "#".repeat(bin.count));
    }
}
