//! Seeded 2×2 zero-sum games.
//!
//! A [`Game`] is a pure function of its seed and utility bounds: the seed
//! builds a private WyRand stream, four integers `a, b, c, d` are drawn in
//! cell order (00, 01, 10, 11) for player 1, and player 2 gets their negation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::mechanics::response::Role;
use crate::mechanics::stoch;

pub const DEFAULT_MIN_UTIL: i64 = -100;
pub const DEFAULT_MAX_UTIL: i64 = 100;
pub const DEFAULT_LABELS: [&str; 2] = ["E", "O"];

fn default_labels() -> Vec<String> {
    DEFAULT_LABELS.iter().map(|s| s.to_string()).collect()
}

/// Construction parameters. Invalid values are corrected, never rejected.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameSpec {
    pub row_labels: Vec<String>,
    pub column_labels: Vec<String>,
    pub min_util: i64,
    pub max_util: i64,
}

impl Default for GameSpec {
    fn default() -> Self {
        Self {
            row_labels: default_labels(),
            column_labels: default_labels(),
            min_util: DEFAULT_MIN_UTIL,
            max_util: DEFAULT_MAX_UTIL,
        }
    }
}

/// A non-fatal fix applied by [`GameSpec::validated`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Correction {
    UtilityBounds { min_util: i64, max_util: i64 },
    /// `min_util` has no negation in `i64`, so player 2 could not mirror it.
    UnmirroredBound { min_util: i64 },
    RowLabels { got: usize },
    ColumnLabels { got: usize },
}

impl fmt::Display for Correction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Correction::UtilityBounds { min_util, max_util } => write!(
                f,
                "minimum utility {min_util} is greater than maximum utility {max_util}; \
                 using min_util={DEFAULT_MIN_UTIL}, max_util={DEFAULT_MAX_UTIL}"
            ),
            Correction::UnmirroredBound { min_util } => write!(
                f,
                "minimum utility {min_util} cannot be negated for player 2; \
                 using min_util={DEFAULT_MIN_UTIL}, max_util={DEFAULT_MAX_UTIL}"
            ),
            Correction::RowLabels { got } => {
                write!(f, "expected 2 row labels but got {got}; using [\"E\", \"O\"]")
            }
            Correction::ColumnLabels { got } => {
                write!(f, "expected 2 column labels but got {got}; using [\"E\", \"O\"]")
            }
        }
    }
}

impl GameSpec {
    pub fn with_bounds(mut self, min_util: i64, max_util: i64) -> Self {
        self.min_util = min_util;
        self.max_util = max_util;
        self
    }

    pub fn with_labels(mut self, rows: Vec<String>, columns: Vec<String>) -> Self {
        self.row_labels = rows;
        self.column_labels = columns;
        self
    }

    /// Replace every invalid field with its default and report what changed.
    pub fn validated(mut self) -> (Self, Vec<Correction>) {
        let mut fixes = Vec::new();
        if self.min_util > self.max_util {
            fixes.push(Correction::UtilityBounds { min_util: self.min_util, max_util: self.max_util });
            self.min_util = DEFAULT_MIN_UTIL;
            self.max_util = DEFAULT_MAX_UTIL;
        } else if self.min_util.checked_neg().is_none() {
            fixes.push(Correction::UnmirroredBound { min_util: self.min_util });
            self.min_util = DEFAULT_MIN_UTIL;
            self.max_util = DEFAULT_MAX_UTIL;
        }
        if self.row_labels.len() != 2 {
            fixes.push(Correction::RowLabels { got: self.row_labels.len() });
            self.row_labels = default_labels();
        }
        if self.column_labels.len() != 2 {
            fixes.push(Correction::ColumnLabels { got: self.column_labels.len() });
            self.column_labels = default_labels();
        }
        (self, fixes)
    }
}

/// Immutable 2×2 zero-sum payoff structure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Game {
    seed: u64,
    rows: [String; 2],
    cols: [String; 2],
    min_util: i64,
    max_util: i64,
    /// Player 1's payoffs, `u1[row][col]`. Player 2's are the negation.
    u1: [[i64; 2]; 2],
}

impl Game {
    /// Generate from `seed` under `spec`, correcting (and logging) bad fields.
    pub fn generate(seed: u64, spec: &GameSpec) -> Self {
        let (spec, fixes) = spec.clone().validated();
        for fix in &fixes {
            log::warn!("game {seed}: {fix}");
        }

        let mut rng = stoch::stream(seed);
        let (lo, hi) = (spec.min_util, spec.max_util);
        let a = stoch::uniform_int(&mut rng, lo, hi);
        let b = stoch::uniform_int(&mut rng, lo, hi);
        let c = stoch::uniform_int(&mut rng, lo, hi);
        let d = stoch::uniform_int(&mut rng, lo, hi);

        let rows = [spec.row_labels[0].clone(), spec.row_labels[1].clone()];
        let cols = [spec.column_labels[0].clone(), spec.column_labels[1].clone()];
        Self {
            seed,
            rows,
            cols,
            min_util: lo,
            max_util: hi,
            u1: [[a, b], [c, d]],
        }
    }

    /// Default labels and bounds.
    pub fn from_seed(seed: u64) -> Self {
        Self::generate(seed, &GameSpec::default())
    }

    /// A hand-built game (player 1's matrix); bounds are taken from the cells.
    /// `i64::MIN` has no zero-sum mirror and is raised to `-i64::MAX`.
    pub fn from_payoffs(seed: u64, u1: [[i64; 2]; 2]) -> Self {
        if u1.iter().flatten().any(|&u| u == i64::MIN) {
            log::warn!("game {seed}: payoff {} raised to {}", i64::MIN, -i64::MAX);
        }
        let u1 = u1.map(|row| row.map(|u| u.max(-i64::MAX)));
        let cells = u1.iter().flatten().copied();
        let min_util = cells.clone().min().unwrap_or(DEFAULT_MIN_UTIL);
        let max_util = cells.max().unwrap_or(DEFAULT_MAX_UTIL);
        Self {
            seed,
            rows: DEFAULT_LABELS.map(str::to_string),
            cols: DEFAULT_LABELS.map(str::to_string),
            min_util,
            max_util,
            u1,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn bounds(&self) -> (i64, i64) {
        (self.min_util, self.max_util)
    }

    pub fn row_labels(&self) -> &[String; 2] {
        &self.rows
    }

    pub fn column_labels(&self) -> &[String; 2] {
        &self.cols
    }

    pub fn u1(&self) -> [[i64; 2]; 2] {
        self.u1
    }

    pub fn u2(&self) -> [[i64; 2]; 2] {
        self.u1.map(|row| row.map(|u| -u))
    }

    /// A player's four cells in the order (00, 01, 10, 11).
    pub fn payoffs(&self, role: Role) -> [i64; 4] {
        let m = match role {
            Role::Row => self.u1,
            Role::Column => self.u2(),
        };
        [m[0][0], m[0][1], m[1][0], m[1][1]]
    }

    /// `[u1, u2]` per cell, cells in order (00, 01, 10, 11).
    pub fn pairs(&self) -> [[i64; 2]; 4] {
        let p1 = self.payoffs(Role::Row);
        p1.map(|u| [u, -u])
    }

    /// `[U1(00), U2(00), U1(01), U2(01), U1(10), U2(10), U1(11), U2(11)]`.
    pub fn flat(&self) -> [i64; 8] {
        let p = self.pairs();
        [p[0][0], p[0][1], p[1][0], p[1][1], p[2][0], p[2][1], p[3][0], p[3][1]]
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header = format!("{:8} | {:^12} | {:^12}", "", self.cols[0], self.cols[1]);
        writeln!(f)?;
        writeln!(f, "{header}")?;
        writeln!(f, "{}", "-".repeat(header.len()))?;
        for (r, label) in self.rows.iter().enumerate() {
            let [x, y] = self.u1[r];
            writeln!(f, "{label:8} | ({x:4}, {:4}) | ({y:4}, {:4})", -x, -y)?;
        }
        Ok(())
    }
}
