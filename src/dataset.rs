//! Trajectory persistence and the read-only view handed to visualization.
//!
//! Units and merged datasets share one format: JSON Lines, one
//! [`TrajectoryRow`] per line.
//!
//! ```text
//! outputs/
//!   mega.jsonl            # merged dataset
//!   mega_game_0.jsonl     # per-trial unit, removed once merged
//!   mega_game_1.jsonl
//! ```

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::systems::sdk::Trajectory;

pub const UNIT_EXT: &str = "jsonl";

/// One round of one trial.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryRow {
    pub iteration: u64,
    pub game_id: u64,
    /// `[u1, u2]` for cells (00, 01, 10, 11).
    pub game: [[i64; 2]; 4],
    pub seed: u64,
    pub max_iteration: u64,
    pub epsilon: f64,
    pub window_size: usize,
    pub rowena_probabilities: f64,
    pub colin_probabilities: f64,
}

fn stem_of(output: &Path) -> String {
    output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dataset".to_string())
}

/// Directory holding `output` (the current directory for bare file names).
pub fn output_dir(output: &Path) -> PathBuf {
    match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// `<dir>/<stem>_game_<id>.jsonl` for batch destination `<dir>/<stem>.<ext>`.
pub fn unit_path(output: &Path, game_id: u64) -> PathBuf {
    output_dir(output).join(format!("{}_game_{game_id}.{UNIT_EXT}", stem_of(output)))
}

/// Trial id encoded in `file_name` if it names a unit of `output`.
pub fn unit_id(output: &Path, file_name: &str) -> Option<u64> {
    let prefix = format!("{}_game_", stem_of(output));
    file_name
        .strip_prefix(&prefix)?
        .strip_suffix(&format!(".{UNIT_EXT}"))?
        .parse()
        .ok()
}

/// Append rows to `w` as JSON Lines.
pub fn write_rows<W: Write>(
    w: &mut W,
    rows: impl IntoIterator<Item = TrajectoryRow>,
    path: &Path,
) -> Result<usize> {
    let mut n = 0;
    for row in rows {
        serde_json::to_writer(&mut *w, &row).map_err(|e| Error::json(path, e))?;
        w.write_all(b"\n").map_err(|e| Error::io(path, e))?;
        n += 1;
    }
    Ok(n)
}

/// Persist one trajectory as a standalone unit.
pub fn write_unit(path: &Path, trajectory: &Trajectory) -> Result<()> {
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut w = BufWriter::new(file);
    write_rows(&mut w, trajectory.rows(), path)?;
    w.flush().map_err(|e| Error::io(path, e))
}

/// Read every row of a unit or dataset. Any bad line fails the whole file.
pub fn read_rows(path: &Path) -> Result<Vec<TrajectoryRow>> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut rows = Vec::new();
    for (n, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| Error::io(path, e))?;
        if line.trim().is_empty() {
            continue;
        }
        let row = serde_json::from_str(&line).map_err(|e| Error::CorruptUnit {
            path: path.to_path_buf(),
            line: n + 1,
            reason: e.to_string(),
        })?;
        rows.push(row);
    }
    Ok(rows)
}

/// Every unit of `output` currently on disk, ordered by trial id.
pub fn list_units(output: &Path) -> Result<Vec<(u64, PathBuf)>> {
    let dir = output_dir(output);
    let entries = fs::read_dir(&dir).map_err(|e| Error::io(&dir, e))?;
    let mut units = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(&dir, e))?;
        let name = entry.file_name();
        if let Some(id) = unit_id(output, &name.to_string_lossy()) {
            units.push((id, entry.path()));
        }
    }
    units.sort();
    Ok(units)
}

/* ──────────────────────────────────────────────────────────────────────────
Visualization boundary
────────────────────────────────────────────────────────────────────────── */

/// Per-game configuration echoed in the dataset.
#[derive(Clone, Debug, PartialEq)]
pub struct GameMeta {
    pub seed: u64,
    pub max_iteration: u64,
    pub window_size: usize,
    pub epsilon: f64,
    pub game: [[i64; 2]; 4],
}

/// Both players' series for one game, ordered by iteration.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Series {
    pub iteration: Vec<u64>,
    pub rowena: Vec<f64>,
    pub colin: Vec<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HistogramBin {
    /// Inclusive bounds.
    pub lo: u64,
    pub hi: u64,
    pub count: usize,
}

/// A loaded dataset. Built once, read-only afterwards.
#[derive(Clone, Debug, Default)]
pub struct DatasetView {
    meta: BTreeMap<u64, GameMeta>,
    series: BTreeMap<u64, Series>,
}

impl DatasetView {
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::from_rows(read_rows(path)?))
    }

    pub fn from_rows(rows: impl IntoIterator<Item = TrajectoryRow>) -> Self {
        let mut meta = BTreeMap::new();
        let mut points: BTreeMap<u64, Vec<(u64, f64, f64)>> = BTreeMap::new();
        for row in rows {
            meta.entry(row.game_id).or_insert_with(|| GameMeta {
                seed: row.seed,
                max_iteration: row.max_iteration,
                window_size: row.window_size,
                epsilon: row.epsilon,
                game: row.game,
            });
            points.entry(row.game_id).or_default().push((
                row.iteration,
                row.rowena_probabilities,
                row.colin_probabilities,
            ));
        }
        let series = points
            .into_iter()
            .map(|(id, mut pts)| {
                pts.sort_by_key(|p| p.0);
                let mut s = Series::default();
                for (i, r, c) in pts {
                    s.iteration.push(i);
                    s.rowena.push(r);
                    s.colin.push(c);
                }
                (id, s)
            })
            .collect();
        Self { meta, series }
    }

    pub fn game_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.series.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn rows(&self) -> usize {
        self.series.values().map(|s| s.iteration.len()).sum()
    }

    pub fn meta(&self, game_id: u64) -> Option<&GameMeta> {
        self.meta.get(&game_id)
    }

    pub fn series(&self, game_id: u64) -> Option<&Series> {
        self.series.get(&game_id)
    }

    /// Last recorded iteration per game.
    pub fn convergence_iterations(&self) -> BTreeMap<u64, u64> {
        self.series
            .iter()
            .filter_map(|(id, s)| s.iteration.last().map(|&i| (*id, i)))
            .collect()
    }

    /// Equal-width histogram of [`Self::convergence_iterations`].
    pub fn histogram(&self, bins: usize) -> Vec<HistogramBin> {
        let values: Vec<u64> = self.convergence_iterations().into_values().collect();
        let (Some(&lo), Some(&hi)) = (values.iter().min(), values.iter().max()) else {
            return Vec::new();
        };
        let span = (hi - lo).saturating_add(1);
        let bins = (bins.max(1) as u64).min(span);
        let width = span.div_ceil(bins);
        let mut out: Vec<HistogramBin> = (0..bins)
            .map(|b| HistogramBin { lo: lo + b * width, hi: lo + (b + 1) * width - 1, count: 0 })
            .take_while(|bin| bin.lo <= hi)
            .collect();
        for v in values {
            let b = ((v - lo) / width) as usize;
            out[b].count += 1;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(game_id: u64, iteration: u64) -> TrajectoryRow {
        TrajectoryRow {
            iteration,
            game_id,
            game: [[1, -1], [2, -2], [3, -3], [4, -4]],
            seed: 10 + game_id,
            max_iteration: 1001,
            epsilon: 1e-3,
            window_size: 10,
            rowena_probabilities: 0.5,
            colin_probabilities: 0.25,
        }
    }

    #[test]
    fn unit_names_round_trip_through_id_parser() {
        let out = Path::new("outputs/mega.jsonl");
        let p = unit_path(out, 17);
        assert_eq!(p, Path::new("outputs/mega_game_17.jsonl"));
        assert_eq!(unit_id(out, "mega_game_17.jsonl"), Some(17));
        assert_eq!(unit_id(out, "mega.jsonl"), None);
        assert_eq!(unit_id(out, "other_game_3.jsonl"), None);
        assert_eq!(unit_id(out, "mega_game_x.jsonl"), None);
    }

    #[test]
    fn bare_output_name_uses_current_dir() {
        assert_eq!(unit_path(Path::new("mega.jsonl"), 2), Path::new("./mega_game_2.jsonl"));
    }

    #[test]
    fn view_groups_and_orders_by_iteration() {
        let rows = vec![row(2, 1), row(1, 0), row(2, 0), row(1, 2), row(1, 1), row(2, 2), row(2, 3)];
        let v = DatasetView::from_rows(rows);
        assert_eq!(v.game_ids().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(v.rows(), 7);
        assert_eq!(v.series(2).unwrap().iteration, vec![0, 1, 2, 3]);
        let last = v.convergence_iterations();
        assert_eq!(last[&1], 2);
        assert_eq!(last[&2], 3);
        assert_eq!(v.meta(1).unwrap().seed, 11);
    }

    #[test]
    fn histogram_counts_every_game_once() {
        let mut rows = Vec::new();
        for (id, last) in [(0u64, 5u64), (1, 9), (2, 14), (3, 14), (4, 30)] {
            rows.extend((0..=last).map(|i| row(id, i)));
        }
        let v = DatasetView::from_rows(rows);
        let h = v.histogram(4);
        assert_eq!(h.iter().map(|b| b.count).sum::<usize>(), 5);
        assert_eq!(h.first().unwrap().lo, 5);
        assert!(h.last().unwrap().hi >= 30);
        assert!(DatasetView::default().histogram(3).is_empty());
    }

    #[test]
    fn histogram_bins_never_exceed_distinct_values() {
        let mut rows = Vec::new();
        for (id, last) in [(0u64, 5u64), (1, 7), (2, 7)] {
            rows.extend((0..=last).map(|i| row(id, i)));
        }
        let v = DatasetView::from_rows(rows);
        for bins in [3, 1_000, usize::MAX] {
            let h = v.histogram(bins);
            assert_eq!(h.len(), 3, "bins={bins}");
            assert!(h.iter().all(|b| b.lo == b.hi));
            assert_eq!(h.iter().map(|b| b.count).collect::<Vec<_>>(), vec![1, 0, 2]);
        }
    }
}
