use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use fictitious_play::experiments::{
    BatchConfig, MERGE_BATCH_SIZE, merge_trial_units, run_batch_with_progress,
};
use fictitious_play::{DatasetView, Game, GameSpec, TrialConfig, TrialOutcome, run_trial};

#[derive(Debug, Parser)]
#[command(name = "fictitious-play", version, about = "Fictitious play on seeded 2x2 zero-sum games")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a batch of seeded trials and merge their trajectories
    Run(RunArgs),
    /// Play one game and print whether and when it converged
    Trial(TrialArgs),
    /// Merge leftover per-trial units into the dataset
    Merge(MergeArgs),
    /// Summarize a merged dataset
    Inspect(InspectArgs),
}

#[derive(Debug, Args)]
struct TrialParams {
    /// Iteration cap; the cap itself is played
    #[arg(long)]
    max_iterations: Option<u64>,
    /// Convergence window capacity
    #[arg(long)]
    window_size: Option<usize>,
    /// Convergence tolerance on each player's window spread
    #[arg(long)]
    epsilon: Option<f64>,
}

impl TrialParams {
    fn apply(&self, mut cfg: TrialConfig) -> TrialConfig {
        if let Some(n) = self.max_iterations {
            cfg = cfg.with_max_iterations(n);
        }
        if let Some(w) = self.window_size {
            cfg = cfg.with_window_size(w);
        }
        if let Some(e) = self.epsilon {
            cfg = cfg.with_epsilon(e);
        }
        cfg
    }
}

#[derive(Debug, Args)]
struct SpecParams {
    /// Lowest payoff a cell can draw
    #[arg(long, allow_hyphen_values = true)]
    min_util: Option<i64>,
    /// Highest payoff a cell can draw
    #[arg(long, allow_hyphen_values = true)]
    max_util: Option<i64>,
    /// Row action labels, comma separated
    #[arg(long, value_delimiter = ',')]
    row_labels: Option<Vec<String>>,
    /// Column action labels, comma separated
    #[arg(long, value_delimiter = ',')]
    column_labels: Option<Vec<String>>,
}

impl SpecParams {
    fn apply(&self, mut spec: GameSpec) -> GameSpec {
        if let Some(lo) = self.min_util {
            spec.min_util = lo;
        }
        if let Some(hi) = self.max_util {
            spec.max_util = hi;
        }
        if let Some(rows) = &self.row_labels {
            spec.row_labels = rows.clone();
        }
        if let Some(cols) = &self.column_labels {
            spec.column_labels = cols.clone();
        }
        spec
    }
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Load the whole batch configuration from a JSON file (flags below override it)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Number of trials
    #[arg(short = 'n', long)]
    trials: Option<usize>,
    /// Merged dataset path; per-trial units are written next to it
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Seed for drawing trial seeds (random when omitted)
    #[arg(long)]
    master_seed: Option<u64>,
    /// Units per merge batch
    #[arg(long)]
    merge_batch_size: Option<usize>,
    #[command(flatten)]
    trial: TrialParams,
    #[command(flatten)]
    spec: SpecParams,
}

#[derive(Debug, Args)]
struct TrialArgs {
    #[arg(long, default_value_t = 132)]
    seed: u64,
    #[command(flatten)]
    trial: TrialParams,
    #[command(flatten)]
    spec: SpecParams,
}

#[derive(Debug, Args)]
struct MergeArgs {
    /// Merged dataset path
    #[arg(short, long, default_value = "outputs/mega.jsonl")]
    output: PathBuf,
    #[arg(long, default_value_t = MERGE_BATCH_SIZE)]
    batch_size: usize,
}

#[derive(Debug, Args)]
struct InspectArgs {
    #[arg(short, long, default_value = "outputs/mega.jsonl")]
    dataset: PathBuf,
    /// Show this game's series tail
    #[arg(long)]
    game_id: Option<u64>,
    /// Histogram bins
    #[arg(long, default_value_t = 10)]
    bins: usize,
    /// Series rows shown for --game-id
    #[arg(long, default_value_t = 10)]
    tail: usize,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    match Cli::parse().command {
        Command::Run(args) => run(args),
        Command::Trial(args) => trial(args),
        Command::Merge(args) => merge(args),
        Command::Inspect(args) => inspect(args),
    }
}

fn run(args: RunArgs) -> Result<()> {
    let mut cfg = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading batch config {}", path.display()))?;
            serde_json::from_str::<BatchConfig>(&text)
                .with_context(|| format!("parsing batch config {}", path.display()))?
        }
        None => BatchConfig::default(),
    };
    if let Some(n) = args.trials {
        cfg.num_trials = n;
    }
    if let Some(out) = args.output {
        cfg.output = out;
    }
    if let Some(seed) = args.master_seed {
        cfg.master_seed = Some(seed);
    }
    if let Some(b) = args.merge_batch_size {
        cfg.merge_batch_size = b;
    }
    cfg.trial = args.trial.apply(cfg.trial);
    cfg.spec = args.spec.apply(cfg.spec);

    let pb = ProgressBar::new(cfg.num_trials as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} Trials [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );
    let started = Instant::now();
    let report = run_batch_with_progress(&cfg, |_| pb.inc(1));
    pb.finish_and_clear();
    let report = report.context("batch failed")?;

    println!();
    println!("{}", "Fictitious Play Convergence Experiments".bright_cyan().bold());
    println!("{}", "=======================================".cyan());
    println!("Trials:           {}", cfg.num_trials);
    println!("Master seed:      {}", report.master_seed);
    println!("Converged:        {}", report.converged.to_string().green());
    println!("Did not converge: {}", report.did_not_converge.to_string().yellow());
    println!("Failed:           {}", report.failed.len().to_string().red());
    println!("Rows written:     {}", report.merge.rows_written);
    println!("Dataset:          {}", report.merge.output.display());
    println!("Total time:       {:?}", started.elapsed());
    for path in &report.merge.skipped {
        println!("  {} {}", "skipped".red(), path.display());
    }
    Ok(())
}

fn trial(args: TrialArgs) -> Result<()> {
    let spec = args.spec.apply(GameSpec::default());
    let cfg = args.trial.apply(TrialConfig::default().with_max_iterations(10_000));
    let game = Game::generate(args.seed, &spec);
    println!("{game}");

    match run_trial(&game, &cfg, args.seed, None)? {
        TrialOutcome::Converged { iteration, rowena_count, colin_count } => {
            let n = iteration as f64;
            println!(
                "{} after {iteration} iterations: ({:.3}, {:.3}), epsilon = {}",
                "Converged".green(),
                rowena_count as f64 / n,
                colin_count as f64 / n,
                cfg.epsilon
            );
        }
        TrialOutcome::DidNotConverge { iteration } => {
            println!("{} after {iteration} iterations", "did not converge".yellow());
        }
        TrialOutcome::Recorded { iteration, path, .. } => {
            println!("recorded {iteration} iterations to {}", path.display());
        }
    }
    Ok(())
}

fn merge(args: MergeArgs) -> Result<()> {
    let report = merge_trial_units(&args.output, args.batch_size)
        .with_context(|| format!("merging units into {}", args.output.display()))?;
    println!(
        "Combined {} units ({} rows) into {}",
        report.merged_units,
        report.rows_written,
        report.output.display()
    );
    for path in &report.skipped {
        println!("  {} {}", "skipped".red(), path.display());
    }
    Ok(())
}

fn inspect(args: InspectArgs) -> Result<()> {
    let view = DatasetView::load(&args.dataset)
        .with_context(|| format!("loading {}", args.dataset.display()))?;
    if view.is_empty() {
        bail!("{} holds no trials", args.dataset.display());
    }

    println!("{}", "Convergence iterations".bright_cyan().bold());
    println!("{} games, {} rows", view.len(), view.rows());
    let hist = view.histogram(args.bins);
    let peak = hist.iter().map(|b| b.count).max().unwrap_or(1).max(1);
    for bin in &hist {
        let bar = "#".repeat(bin.count * 40 / peak);
        println!("{:>8}..={:<8} {:>6} {}", bin.lo, bin.hi, bin.count, bar.green());
    }

    let Some(id) = args.game_id else { return Ok(()) };
    let (Some(meta), Some(series)) = (view.meta(id), view.series(id)) else {
        bail!("game {id} is not in {}", args.dataset.display());
    };
    println!();
    println!("{}", format!("Game {id}").bright_cyan().bold());
    println!(
        "seed {}  max_iteration {}  window {}  epsilon {}",
        meta.seed, meta.max_iteration, meta.window_size, meta.epsilon
    );
    println!("payoffs [u1,u2] (00,01,10,11): {:?}", meta.game);
    println!("{:>10} {:>10} {:>10}", "iteration", "rowena", "colin");
    let skip = series.iteration.len().saturating_sub(args.tail);
    for k in skip..series.iteration.len() {
        println!(
            "{:>10} {:>10.4} {:>10.4}",
            series.iteration[k], series.rowena[k], series.colin[k]
        );
    }
    Ok(())
}
