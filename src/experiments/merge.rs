//! Fold per-trial units into one dataset.
//!
//! Units are processed `batch_size` files at a time so memory stays bounded by
//! one batch of trajectories. Each unit is parsed in full before any of its
//! rows are written, so a corrupt unit contributes nothing. Corrupt units are
//! reported, left on disk and skipped; everything else is appended to a
//! temporary file that replaces the output once all batches are in. Merged
//! units are deleted afterwards.
//!
//! Assumes one merge at a time per output directory.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::dataset::{self, output_dir};
use crate::error::{Error, Result};

/// Default number of units read per batch.
pub const MERGE_BATCH_SIZE: usize = 200;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MergeReport {
    pub output: PathBuf,
    pub merged_units: usize,
    pub rows_written: usize,
    /// Units that could not be read or parsed; not merged, not deleted.
    pub skipped: Vec<PathBuf>,
}

fn partial_path(output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dataset".to_string());
    output_dir(output).join(format!(".{name}.partial"))
}

pub fn merge_trial_units(output: &Path, batch_size: usize) -> Result<MergeReport> {
    let units = dataset::list_units(output)?;
    let mut report = MergeReport { output: output.to_path_buf(), ..Default::default() };
    if units.is_empty() {
        log::info!("no trial units found for {}", output.display());
        return Ok(report);
    }
    log::info!("found {} trial units to combine into {}", units.len(), output.display());

    let tmp = partial_path(output);
    let file = File::create(&tmp).map_err(|e| Error::io(&tmp, e))?;
    let mut w = BufWriter::new(file);

    let mut merged: Vec<PathBuf> = Vec::with_capacity(units.len());
    for (b, batch) in units.chunks(batch_size.max(1)).enumerate() {
        let mut rows = Vec::new();
        let mut taken = 0usize;
        for (_, path) in batch {
            match dataset::read_rows(path) {
                Ok(r) => {
                    rows.extend(r);
                    merged.push(path.clone());
                    taken += 1;
                }
                Err(e) => {
                    log::warn!("skipping {}: {e}", path.display());
                    report.skipped.push(path.clone());
                }
            }
        }
        if taken == 0 {
            log::warn!("batch {} had no readable units", b + 1);
            continue;
        }
        report.rows_written += dataset::write_rows(&mut w, rows, &tmp)?;
        log::info!(
            "batch {} merged {taken}/{} units ({} rows so far)",
            b + 1,
            batch.len(),
            report.rows_written
        );
    }
    w.flush().map_err(|e| Error::io(&tmp, e))?;
    drop(w);
    if merged.is_empty() {
        // Every unit was corrupt: keep whatever dataset is already there.
        if let Err(e) = fs::remove_file(&tmp) {
            log::warn!("could not delete {}: {e}", tmp.display());
        }
        log::warn!(
            "none of {} units could be read; {} left untouched",
            report.skipped.len(),
            output.display()
        );
        return Ok(report);
    }
    fs::rename(&tmp, output).map_err(|e| Error::io(output, e))?;

    for path in &merged {
        if let Err(e) = fs::remove_file(path) {
            log::warn!("could not delete {}: {e}", path.display());
        }
    }
    report.merged_units = merged.len();
    log::info!(
        "combined {} units ({} rows) into {}; {} skipped",
        report.merged_units,
        report.rows_written,
        output.display(),
        report.skipped.len()
    );
    Ok(report)
}
