//! Pipeline orchestration: the end-to-end dataset build plus the
//! stage-by-stage entry points used by the CLI.

pub mod pipeline;
pub mod stages;

pub use pipeline::{
    BuildConfig, BuildResult, ProgressReporter, SilentProgress, hash_pairs, run_build,
};
pub use stages::{PAIRS_FILE, UNITS_FILE, extract_stage, format_stage, generate_stage, validate_stage};
