// src/experiments/mod.rs

// Orchestration over many trials: the parallel batch and the merge step that
// folds its per-trial units into one dataset.

pub mod batch;
pub mod merge;

pub use batch::*;
pub use merge::*;
