//! End-to-end `run` pipeline: content store → extract → synthesize →
//! format → validate → manifest.

use std::path::PathBuf;
use std::time::Instant;

use sha2::{Digest, Sha256};
use tracing::{info, instrument};

use blankforge_extractor::ContentStore;
use blankforge_formats::OutputFormat;
use blankforge_report::{ValidationReport, Verdict};
use blankforge_shared::{
    BlankforgeError, CURRENT_SCHEMA_VERSION, DatasetManifest, ExtractConfig, QaPair, Result,
    RunId, ValidationConfig,
};

/// Configuration for the full dataset build.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Content store root directory.
    pub content_root: PathBuf,
    /// Output directory for JSONL files, report, and manifest.
    pub output_dir: PathBuf,
    /// Extraction options.
    pub extract: ExtractConfig,
    /// Validation thresholds.
    pub validation: ValidationConfig,
    /// Tool version string recorded in the manifest.
    pub tool_version: String,
}

/// Result of the full dataset build.
#[derive(Debug)]
pub struct BuildResult {
    /// Output directory the dataset was written to.
    pub output_dir: PathBuf,
    /// Run identifier.
    pub run_id: RunId,
    /// Content units extracted.
    pub unit_count: usize,
    /// Q&A pairs synthesized.
    pub pair_count: usize,
    /// Lines written per output file name.
    pub format_lines: std::collections::BTreeMap<String, usize>,
    /// The validation result.
    pub report: ValidationReport,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each output file lands.
    fn file_written(&self, name: &str, lines: usize);
    /// Called when the pipeline completes.
    fn done(&self, result: &BuildResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn file_written(&self, _name: &str, _lines: usize) {}
    fn done(&self, _result: &BuildResult) {}
}

/// Run the full build.
///
/// 1. Load the content store
/// 2. Extract content units
/// 3. Synthesize Q&A pairs
/// 4. Write all output formats plus the pretrain corpus
/// 5. Validate pairs and re-parse the written files
/// 6. Write `validation_report.md` and `manifest.json`
///
/// Deterministic apart from `run_id` and `created_at`: two runs over an
/// unchanged store produce identical JSONL bytes and pair hash.
#[instrument(skip_all, fields(content_root = %config.content_root.display()))]
pub fn run_build(config: &BuildConfig, progress: &dyn ProgressReporter) -> Result<BuildResult> {
    let start = Instant::now();
    let run_id = RunId::new();

    info!(%run_id, "starting dataset build");

    // --- Phase 1: Load ---
    progress.phase("Loading content store");
    let store = ContentStore::open(&config.content_root)?;

    // --- Phase 2: Extract ---
    progress.phase("Extracting content units");
    let extraction = blankforge_extractor::extract(&store, &config.extract);

    // --- Phase 3: Synthesize ---
    progress.phase("Synthesizing Q&A pairs");
    let brand = store
        .brand_name()
        .unwrap_or(blankforge_synth::DEFAULT_BRAND)
        .to_string();
    let synthesis =
        blankforge_synth::synthesize(store.products(), &extraction.units, &brand);

    if synthesis.pairs.is_empty() {
        return Err(BlankforgeError::validation(
            "no Q&A pairs were synthesized from the content store",
        ));
    }

    // --- Phase 4: Format ---
    progress.phase("Writing output files");
    std::fs::create_dir_all(&config.output_dir)
        .map_err(|e| BlankforgeError::io(&config.output_dir, e))?;

    let mut format_lines = std::collections::BTreeMap::new();
    for format in OutputFormat::ALL {
        let path = config.output_dir.join(format.file_name());
        let stats = blankforge_formats::write_pairs(&synthesis.pairs, format, &path)?;
        progress.file_written(format.file_name(), stats.written);
        format_lines.insert(format.file_name().to_string(), stats.written);
    }

    let pretrain_path = config.output_dir.join("pretrain.jsonl");
    let pretrain_stats = blankforge_formats::write_pretrain(&extraction.units, &pretrain_path)?;
    progress.file_written("pretrain.jsonl", pretrain_stats.written);
    format_lines.insert("pretrain.jsonl".to_string(), pretrain_stats.written);

    // --- Phase 5: Validate ---
    progress.phase("Validating dataset");
    let mut report = blankforge_report::validate_pairs(&synthesis.pairs, &config.validation);
    for format in OutputFormat::ALL {
        let path = config.output_dir.join(format.file_name());
        let findings = blankforge_report::check_jsonl_file(&path, format)?;
        report
            .structural_errors
            .extend(findings.into_iter().map(|f| format!("{}: {f}", format.file_name())));
    }
    if !report.structural_errors.is_empty() {
        report.verdict = Verdict::Fail;
    }

    // --- Phase 6: Report & manifest ---
    progress.phase("Writing report and manifest");
    let report_path = config.output_dir.join("validation_report.md");
    std::fs::write(&report_path, blankforge_report::render_markdown(&report))
        .map_err(|e| BlankforgeError::io(&report_path, e))?;

    let manifest = DatasetManifest {
        schema_version: CURRENT_SCHEMA_VERSION,
        run_id: run_id.clone(),
        tool_version: config.tool_version.clone(),
        created_at: chrono::Utc::now(),
        source_root: config.content_root.to_string_lossy().to_string(),
        unit_count: extraction.units.len(),
        pair_count: synthesis.pairs.len(),
        format_lines: format_lines.clone(),
        pairs_sha256: hash_pairs(&synthesis.pairs)?,
    };
    let manifest_path = config.output_dir.join("manifest.json");
    let manifest_json = serde_json::to_string_pretty(&manifest)
        .map_err(|e| BlankforgeError::Format(format!("serialize manifest: {e}")))?;
    std::fs::write(&manifest_path, manifest_json)
        .map_err(|e| BlankforgeError::io(&manifest_path, e))?;

    let result = BuildResult {
        output_dir: config.output_dir.clone(),
        run_id,
        unit_count: extraction.units.len(),
        pair_count: synthesis.pairs.len(),
        format_lines,
        report,
        elapsed: start.elapsed(),
    };

    progress.done(&result);

    info!(
        run_id = %result.run_id,
        units = result.unit_count,
        pairs = result.pair_count,
        verdict = %result.report.verdict,
        elapsed_ms = result.elapsed.as_millis(),
        "dataset build complete"
    );

    Ok(result)
}

/// SHA-256 over the canonical (JSON-per-line) serialization of the pair
/// set. Stable across runs for an unchanged content store.
pub fn hash_pairs(pairs: &[QaPair]) -> Result<String> {
    let mut hasher = Sha256::new();
    for pair in pairs {
        let line = serde_json::to_string(pair)
            .map_err(|e| BlankforgeError::Format(format!("serialize pair: {e}")))?;
        hasher.update(line.as_bytes());
        hasher.update(b"\n");
    }
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn fixture_root() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
    }

    fn build_config(output_dir: PathBuf) -> BuildConfig {
        BuildConfig {
            content_root: fixture_root(),
            output_dir,
            extract: ExtractConfig::default(),
            validation: ValidationConfig::default(),
            tool_version: "test".into(),
        }
    }

    #[test]
    fn full_build_writes_all_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let config = build_config(dir.path().join("out"));

        let result = run_build(&config, &SilentProgress).expect("build");

        assert!(result.pair_count > 0);
        assert!(result.unit_count > 0);
        for name in [
            "train_alpaca.jsonl",
            "train_alpaca_system.jsonl",
            "train_sharegpt.jsonl",
            "train_chat.jsonl",
            "pretrain.jsonl",
            "validation_report.md",
            "manifest.json",
        ] {
            assert!(config.output_dir.join(name).exists(), "{name} missing");
        }
        assert_ne!(result.report.verdict, Verdict::Fail);
    }

    #[test]
    fn repeated_builds_produce_identical_hash() {
        let dir = tempfile::tempdir().unwrap();

        let first = run_build(&build_config(dir.path().join("a")), &SilentProgress).unwrap();
        let second = run_build(&build_config(dir.path().join("b")), &SilentProgress).unwrap();

        let read_manifest = |out: &Path| -> DatasetManifest {
            let content = std::fs::read_to_string(out.join("manifest.json")).unwrap();
            serde_json::from_str(&content).unwrap()
        };
        let m1 = read_manifest(&first.output_dir);
        let m2 = read_manifest(&second.output_dir);

        assert_eq!(m1.pairs_sha256, m2.pairs_sha256);
        assert_ne!(m1.run_id, m2.run_id);
        assert_eq!(m1.format_lines, m2.format_lines);
    }

    #[test]
    fn missing_store_fails_the_build() {
        let dir = tempfile::tempdir().unwrap();
        let config = BuildConfig {
            content_root: PathBuf::from("/nonexistent/store"),
            output_dir: dir.path().join("out"),
            extract: ExtractConfig::default(),
            validation: ValidationConfig::default(),
            tool_version: "test".into(),
        };
        assert!(run_build(&config, &SilentProgress).is_err());
    }
}
