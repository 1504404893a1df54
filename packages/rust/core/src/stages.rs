//! Stage-by-stage entry points.
//!
//! The `run` pipeline keeps everything in memory; these functions expose
//! each stage separately, handing data between invocations through
//! intermediate JSON files (`content_units.json`, `qa_pairs.json`) in
//! the output directory. Useful for inspecting or hand-editing the
//! dataset between stages.

use std::path::Path;

use tracing::{info, instrument};

use blankforge_extractor::{ContentStore, ExtractStats};
use blankforge_formats::OutputFormat;
use blankforge_report::ValidationReport;
use blankforge_shared::{
    BlankforgeError, ContentUnit, ExtractConfig, QaPair, Result, ValidationConfig,
};
use blankforge_synth::SynthesisStats;

/// Intermediate file holding extracted units.
pub const UNITS_FILE: &str = "content_units.json";
/// Intermediate file holding synthesized pairs.
pub const PAIRS_FILE: &str = "qa_pairs.json";

/// Extract content units from the store and write `content_units.json`.
#[instrument(skip_all, fields(content_root = %content_root.display()))]
pub fn extract_stage(
    content_root: &Path,
    output_dir: &Path,
    opts: &ExtractConfig,
) -> Result<ExtractStats> {
    let store = ContentStore::open(content_root)?;
    let extraction = blankforge_extractor::extract(&store, opts);

    write_json(&output_dir.join(UNITS_FILE), &extraction.units)?;
    info!(units = extraction.units.len(), "units written");
    Ok(extraction.stats)
}

/// Synthesize pairs from `content_units.json` plus the store's product
/// catalog, writing `qa_pairs.json`.
#[instrument(skip_all)]
pub fn generate_stage(content_root: &Path, output_dir: &Path) -> Result<SynthesisStats> {
    let units: Vec<ContentUnit> = read_json(&output_dir.join(UNITS_FILE))?;
    let store = ContentStore::open(content_root)?;
    let brand = store
        .brand_name()
        .unwrap_or(blankforge_synth::DEFAULT_BRAND)
        .to_string();

    let synthesis = blankforge_synth::synthesize(store.products(), &units, &brand);
    if synthesis.pairs.is_empty() {
        return Err(BlankforgeError::validation(
            "no Q&A pairs were synthesized; run the extract stage first",
        ));
    }

    write_json(&output_dir.join(PAIRS_FILE), &synthesis.pairs)?;
    info!(pairs = synthesis.pairs.len(), "pairs written");
    Ok(synthesis.stats)
}

/// Write `qa_pairs.json` out in one (or all) wire formats.
#[instrument(skip_all)]
pub fn format_stage(
    output_dir: &Path,
    formats: &[OutputFormat],
) -> Result<Vec<(OutputFormat, blankforge_formats::FormatStats)>> {
    let pairs: Vec<QaPair> = read_json(&output_dir.join(PAIRS_FILE))?;

    let mut results = Vec::with_capacity(formats.len());
    for &format in formats {
        let path = output_dir.join(format.file_name());
        let stats = blankforge_formats::write_pairs(&pairs, format, &path)?;
        results.push((format, stats));
    }
    Ok(results)
}

/// Validate `qa_pairs.json` (and any JSONL files already written next to
/// it), writing `validation_report.md`.
#[instrument(skip_all)]
pub fn validate_stage(output_dir: &Path, config: &ValidationConfig) -> Result<ValidationReport> {
    let pairs: Vec<QaPair> = read_json(&output_dir.join(PAIRS_FILE))?;
    let mut report = blankforge_report::validate_pairs(&pairs, config);

    for format in OutputFormat::ALL {
        let path = output_dir.join(format.file_name());
        if !path.exists() {
            continue;
        }
        let findings = blankforge_report::check_jsonl_file(&path, format)?;
        report
            .structural_errors
            .extend(findings.into_iter().map(|f| format!("{}: {f}", format.file_name())));
    }
    if !report.structural_errors.is_empty() {
        report.verdict = blankforge_report::Verdict::Fail;
    }

    let report_path = output_dir.join("validation_report.md");
    std::fs::write(&report_path, blankforge_report::render_markdown(&report))
        .map_err(|e| BlankforgeError::io(&report_path, e))?;

    Ok(report)
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| BlankforgeError::io(parent, e))?;
    }
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| BlankforgeError::Format(format!("serialize {}: {e}", path.display())))?;
    std::fs::write(path, json).map_err(|e| BlankforgeError::io(path, e))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| BlankforgeError::io(path, e))?;
    serde_json::from_str(&content)
        .map_err(|e| BlankforgeError::parse(format!("{}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn fixture_root() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
    }

    #[test]
    fn stages_chain_through_intermediate_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");

        let extract_stats =
            extract_stage(&fixture_root(), &out, &ExtractConfig::default()).expect("extract");
        assert!(extract_stats.units > 0);
        assert!(out.join(UNITS_FILE).exists());

        let synth_stats = generate_stage(&fixture_root(), &out).expect("generate");
        assert!(synth_stats.total > 0);
        assert!(out.join(PAIRS_FILE).exists());

        let results =
            format_stage(&out, &[OutputFormat::Alpaca, OutputFormat::Chat]).expect("format");
        assert_eq!(results.len(), 2);
        assert!(out.join("train_alpaca.jsonl").exists());

        let report = validate_stage(&out, &ValidationConfig::default()).expect("validate");
        assert_ne!(report.verdict, blankforge_report::Verdict::Fail);
        assert!(out.join("validation_report.md").exists());
    }

    #[test]
    fn generate_without_extract_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(generate_stage(&fixture_root(), dir.path()).is_err());
    }
}
