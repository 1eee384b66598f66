// tests/trial.rs
use fictitious_play::dataset::{read_rows, unit_path};
use fictitious_play::systems::fictitious_play::RecordTo;
use fictitious_play::{
    ConvergenceWindow, Error, Game, Role, TrialConfig, TrialOutcome, run_trial, simulate_trajectory,
};
use tempfile::TempDir;

/// Row's first row and Column's second column are strictly dominant.
fn dominant() -> Game {
    Game::from_payoffs(3, [[5, 3], [1, 0]])
}

/// Matching pennies: best responses keep chasing each other.
fn pennies() -> Game {
    Game::from_payoffs(4, [[1, -1], [-1, 1]])
}

/* ──────────────────────────────────────────────────────────────────────────
Game generation
────────────────────────────────────────────────────────────────────────── */

#[test]
fn seed_132_reproduces_its_matrix() {
    let m = Game::from_seed(132);
    // Pinned: a change here means the generator stream changed between builds.
    assert_eq!(m.u1(), [[-95, 96], [-23, 89]]);
    assert_eq!(m.flat(), [-95, 95, 96, -96, -23, 23, 89, -89]);
    assert_eq!(Game::from_seed(0).u1(), [[21, -100], [-81, -39]]);
    assert_eq!(Game::from_seed(1).u1(), [[32, 7], [-52, 56]]);
    for _ in 0..5 {
        let again = Game::from_seed(132);
        assert_eq!(again.u1(), m.u1());
        assert_eq!(again.flat(), m.flat());
    }
    assert_eq!(m.bounds(), (-100, 100));
    assert!(m.payoffs(Role::Row).iter().all(|u| (-100..=100).contains(u)));
}

#[test]
fn generated_games_are_zero_sum() {
    for seed in [0, 1, 132, 999_999_999, u64::MAX] {
        let g = Game::from_seed(seed);
        let f = g.flat();
        for cell in f.chunks(2) {
            assert_eq!(cell[1], -cell[0]);
        }
    }
}

/* ──────────────────────────────────────────────────────────────────────────
Convergence
────────────────────────────────────────────────────────────────────────── */

#[test]
fn dominant_game_converges_well_before_cap() {
    let cfg = TrialConfig::default()
        .with_window_size(10)
        .with_epsilon(1e-3)
        .with_max_iterations(10_000);
    for seed in 0..8 {
        let out = run_trial(&dominant(), &cfg, seed, None).unwrap();
        assert!(out.converged(), "seed {seed}: {out:?}");
        assert!(out.iteration() < 1_000, "seed {seed}: {out:?}");

        let t = simulate_trajectory(&dominant(), &cfg, seed, 0).unwrap();
        let mut rw = ConvergenceWindow::new(10);
        let mut cw = ConvergenceWindow::new(10);
        for k in t.len() - 10..t.len() {
            rw.push(t.rowena_probabilities[k]);
            cw.push(t.colin_probabilities[k]);
        }
        assert!(rw.spread() < cfg.epsilon && cw.spread() < cfg.epsilon);
        // Dominant actions pull the frequencies toward (1, 0).
        assert!(t.rowena_probabilities[t.len() - 1] > 0.98);
        assert!(t.colin_probabilities[t.len() - 1] < 0.02);
    }
}

#[test]
fn cycling_game_exhausts_budget() {
    let cfg = TrialConfig::default()
        .with_window_size(10)
        .with_epsilon(1e-9)
        .with_max_iterations(200);
    for seed in 0..10 {
        let out = run_trial(&pennies(), &cfg, seed, None).unwrap();
        assert_eq!(out, TrialOutcome::DidNotConverge { iteration: 201 });

        let t = simulate_trajectory(&pennies(), &cfg, seed, 9).unwrap();
        assert!(!t.converged);
        assert_eq!(t.len(), 201);
        assert_eq!(t.max_iteration, 201);
    }
}

#[test]
fn unbounded_iteration_cap_is_rejected() {
    let cfg = TrialConfig::default().with_max_iterations(u64::MAX);
    assert_eq!(cfg.effective_budget(), u64::MAX);
    let err = run_trial(&Game::from_seed(1), &cfg, 1, None).unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)), "{err:?}");

    let dir = TempDir::new().unwrap();
    let rec = RecordTo { game_id: Some(0), output: dir.path().join("mega.jsonl") };
    assert!(run_trial(&Game::from_seed(1), &cfg, 1, Some(&rec)).is_err());
    assert!(simulate_trajectory(&Game::from_seed(1), &cfg, 1, 0).is_err());
}

#[test]
fn convergence_never_reported_inside_first_window() {
    // A huge tolerance would accept any window; only the gate holds it back.
    for w in [1usize, 2, 5, 10, 40] {
        let cfg = TrialConfig::default().with_window_size(w).with_epsilon(2.0);
        for seed in 0..25 {
            let g = Game::from_seed(seed);
            let out = run_trial(&g, &cfg, seed, None).unwrap();
            assert_eq!(out.iteration(), w as u64 + 2, "w={w} seed={seed}");
        }
    }
}

#[test]
fn random_games_keep_trajectory_columns_aligned() {
    let cfg = TrialConfig::default().with_max_iterations(3_000);
    for seed in 100..140 {
        let g = Game::from_seed(seed);
        let t = simulate_trajectory(&g, &cfg, seed, seed).unwrap();
        let plain = run_trial(&g, &cfg, seed, None).unwrap();
        assert_eq!(t.len() as u64, plain.iteration());
        assert_eq!(t.converged, plain.converged());
        assert_eq!(t.rowena_probabilities.len(), t.iteration.len());
        assert_eq!(t.colin_probabilities.len(), t.iteration.len());
        assert!(t.rowena_probabilities.iter().all(|p| (0.0..=1.0).contains(p)));
        assert!(t.colin_probabilities.iter().all(|p| (0.0..=1.0).contains(p)));
        if let TrialOutcome::Converged { iteration, rowena_count, colin_count } = plain {
            let n = iteration as f64;
            assert_eq!(t.rowena_probabilities[t.len() - 1], rowena_count as f64 / n);
            assert_eq!(t.colin_probabilities[t.len() - 1], colin_count as f64 / n);
        }
    }
}

/* ──────────────────────────────────────────────────────────────────────────
Recording
────────────────────────────────────────────────────────────────────────── */

#[test]
fn recorded_trial_writes_one_row_per_round() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("mega.jsonl");
    let cfg = TrialConfig::default().with_max_iterations(5_000);
    let game = Game::from_seed(2024);
    let rec = RecordTo { game_id: Some(6), output: output.clone() };

    let out = run_trial(&game, &cfg, 2024, Some(&rec)).unwrap();
    let TrialOutcome::Recorded { iteration, path, .. } = out else {
        panic!("expected a recorded outcome");
    };
    assert_eq!(path, unit_path(&output, 6));
    assert_eq!(path, dir.path().join("mega_game_6.jsonl"));

    let rows = read_rows(&path).unwrap();
    assert_eq!(rows.len() as u64, iteration);
    for (k, row) in rows.iter().enumerate() {
        assert_eq!(row.iteration, k as u64);
        assert_eq!(row.game_id, 6);
        assert_eq!(row.seed, 2024);
        assert_eq!(row.game, game.pairs());
        assert_eq!(row.max_iteration, 5_001);
        assert_eq!(row.window_size, 10);
        assert_eq!(row.epsilon, 1e-3);
    }
}

#[test]
fn recording_needs_a_game_id() {
    let dir = TempDir::new().unwrap();
    let rec = RecordTo { game_id: None, output: dir.path().join("mega.jsonl") };
    let err = run_trial(&Game::from_seed(1), &TrialConfig::default(), 1, Some(&rec)).unwrap_err();
    assert!(matches!(err, Error::MissingGameId));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn same_seed_gives_byte_identical_units() {
    let (a, b) = (TempDir::new().unwrap(), TempDir::new().unwrap());
    let cfg = TrialConfig::default().with_max_iterations(4_000);
    let seed = 77_001;

    let mut paths = Vec::new();
    for dir in [&a, &b] {
        let game = Game::from_seed(seed);
        let rec = RecordTo { game_id: Some(0), output: dir.path().join("mega.jsonl") };
        match run_trial(&game, &cfg, seed, Some(&rec)).unwrap() {
            TrialOutcome::Recorded { path, .. } => paths.push(path),
            other => panic!("unexpected {other:?}"),
        }
    }
    let x = std::fs::read(&paths[0]).unwrap();
    let y = std::fs::read(&paths[1]).unwrap();
    assert!(!x.is_empty());
    assert_eq!(x, y);
}
