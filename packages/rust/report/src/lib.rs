//! Dataset validation and reporting.
//!
//! Checks a synthesized pair set (and optionally the JSONL files written
//! from it) for structural problems, exact duplicates, and suspiciously
//! short responses, then folds the findings into a single PASS / WARN /
//! FAIL verdict with a human-readable Markdown report.
//!
//! Thresholds (minimum response length, tolerated duplicate rate) come
//! from [`ValidationConfig`] rather than being hard-coded.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use blankforge_formats::OutputFormat;
use blankforge_shared::{BlankforgeError, QaPair, Result, ValidationConfig};

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// Overall dataset verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Verdict {
    /// No findings.
    Pass,
    /// Quality findings (duplicates over threshold, short responses).
    Warn,
    /// Structural findings or an empty dataset.
    Fail,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Verdict::Pass => "PASS",
            Verdict::Warn => "WARN",
            Verdict::Fail => "FAIL",
        };
        write!(f, "{s}")
    }
}

/// Length statistics for one text field across the dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthStats {
    pub mean: usize,
    pub min: usize,
    pub max: usize,
}

impl LengthStats {
    fn from_lengths(lengths: &[usize]) -> Self {
        if lengths.is_empty() {
            return Self::default();
        }
        Self {
            mean: lengths.iter().sum::<usize>() / lengths.len(),
            min: *lengths.iter().min().unwrap_or(&0),
            max: *lengths.iter().max().unwrap_or(&0),
        }
    }
}

/// Aggregate dataset statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetStats {
    pub total_pairs: usize,
    /// Pair counts keyed by category name.
    pub by_category: BTreeMap<String, usize>,
    pub instruction_chars: LengthStats,
    pub response_chars: LengthStats,
    /// Whitespace-word count across all instructions and responses —
    /// a rough proxy for token count.
    pub approx_tokens: usize,
}

/// An instruction that appears more than once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateEntry {
    pub instruction: String,
    pub count: usize,
}

/// The full validation result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub verdict: Verdict,
    pub stats: DatasetStats,
    /// Instructions appearing more than once, most frequent first.
    pub duplicates: Vec<DuplicateEntry>,
    /// Fraction of pairs that are repeats of an earlier instruction.
    pub duplicate_rate: f64,
    /// Instructions whose responses fall below the configured minimum.
    pub short_responses: Vec<String>,
    /// Structural findings (empty fields, malformed JSONL lines).
    pub structural_errors: Vec<String>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a pair set against the configured thresholds.
#[instrument(skip_all, fields(pairs = pairs.len()))]
pub fn validate_pairs(pairs: &[QaPair], config: &ValidationConfig) -> ValidationReport {
    let mut structural_errors = Vec::new();
    let mut short_responses = Vec::new();
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    let mut by_category: BTreeMap<String, usize> = BTreeMap::new();
    let mut instruction_lens = Vec::with_capacity(pairs.len());
    let mut response_lens = Vec::with_capacity(pairs.len());
    let mut approx_tokens = 0usize;

    for (idx, pair) in pairs.iter().enumerate() {
        if pair.instruction.trim().is_empty() {
            structural_errors.push(format!("pair {idx}: empty instruction"));
        }
        if pair.response.trim().is_empty() {
            structural_errors.push(format!("pair {idx}: empty response"));
        } else if pair.response.len() < config.min_response_len {
            short_responses.push(pair.instruction.clone());
        }

        *counts.entry(pair.instruction.as_str()).or_default() += 1;
        *by_category.entry(pair.category.to_string()).or_default() += 1;
        instruction_lens.push(pair.instruction.len());
        response_lens.push(pair.response.len());
        approx_tokens += pair.instruction.split_whitespace().count()
            + pair.response.split_whitespace().count();
    }

    let mut duplicates: Vec<DuplicateEntry> = counts
        .iter()
        .filter(|&(_, &count)| count > 1)
        .map(|(instruction, &count)| DuplicateEntry {
            instruction: instruction.to_string(),
            count,
        })
        .collect();
    duplicates.sort_by(|a, b| b.count.cmp(&a.count).then(a.instruction.cmp(&b.instruction)));

    let repeated: usize = duplicates.iter().map(|d| d.count - 1).sum();
    let duplicate_rate = if pairs.is_empty() {
        0.0
    } else {
        repeated as f64 / pairs.len() as f64
    };

    let stats = DatasetStats {
        total_pairs: pairs.len(),
        by_category,
        instruction_chars: LengthStats::from_lengths(&instruction_lens),
        response_chars: LengthStats::from_lengths(&response_lens),
        approx_tokens,
    };

    let verdict = if pairs.is_empty() || !structural_errors.is_empty() {
        Verdict::Fail
    } else if duplicate_rate > config.max_duplicate_rate || !short_responses.is_empty() {
        Verdict::Warn
    } else {
        Verdict::Pass
    };

    info!(
        %verdict,
        total = stats.total_pairs,
        duplicates = duplicates.len(),
        short = short_responses.len(),
        "validation complete"
    );

    ValidationReport {
        verdict,
        stats,
        duplicates,
        duplicate_rate,
        short_responses,
        structural_errors,
    }
}

/// Re-parse a written JSONL file and return structural findings: lines
/// that are not valid JSON or that miss the format's required fields.
#[instrument(skip_all, fields(format = %format, path = %path.display()))]
pub fn check_jsonl_file(path: &Path, format: OutputFormat) -> Result<Vec<String>> {
    let file = File::open(path).map_err(|e| BlankforgeError::io(path, e))?;
    let reader = BufReader::new(file);
    let mut findings = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| BlankforgeError::io(path, e))?;
        let lineno = idx + 1;

        let value: serde_json::Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                findings.push(format!("line {lineno}: invalid JSON: {e}"));
                continue;
            }
        };

        let missing = match format {
            OutputFormat::Alpaca | OutputFormat::AlpacaSystem => ["instruction", "output"]
                .iter()
                .find(|key| value.get(**key).and_then(|v| v.as_str()).is_none_or(str::is_empty)),
            OutputFormat::Sharegpt => {
                if value.get("conversations").and_then(|v| v.as_array()).is_none_or(Vec::is_empty) {
                    Some(&"conversations")
                } else {
                    None
                }
            }
            OutputFormat::Chat => {
                if value.get("messages").and_then(|v| v.as_array()).is_none_or(Vec::is_empty) {
                    Some(&"messages")
                } else {
                    None
                }
            }
        };

        if let Some(field) = missing {
            findings.push(format!("line {lineno}: missing or empty '{field}'"));
        }
    }

    Ok(findings)
}

// ---------------------------------------------------------------------------
// Markdown rendering
// ---------------------------------------------------------------------------

/// Render the report as Markdown, suitable for `validation_report.md`.
pub fn render_markdown(report: &ValidationReport) -> String {
    let mut out = String::new();

    out.push_str("# Dataset Validation Report\n\n");
    out.push_str(&format!("**Verdict: {}**\n\n", report.verdict));

    out.push_str("## Statistics\n\n");
    out.push_str(&format!("- Total pairs: {}\n", report.stats.total_pairs));
    out.push_str(&format!("- Approx. tokens: {}\n", report.stats.approx_tokens));
    out.push_str(&format!(
        "- Instruction length (chars): mean {} / min {} / max {}\n",
        report.stats.instruction_chars.mean,
        report.stats.instruction_chars.min,
        report.stats.instruction_chars.max
    ));
    out.push_str(&format!(
        "- Response length (chars): mean {} / min {} / max {}\n\n",
        report.stats.response_chars.mean,
        report.stats.response_chars.min,
        report.stats.response_chars.max
    ));

    out.push_str("## Pairs by category\n\n");
    for (category, count) in &report.stats.by_category {
        out.push_str(&format!("- {category}: {count}\n"));
    }
    out.push('\n');

    out.push_str("## Findings\n\n");
    if report.duplicates.is_empty() {
        out.push_str("- No duplicate instructions.\n");
    } else {
        out.push_str(&format!(
            "- {} duplicate instructions ({:.1}% of pairs are repeats):\n",
            report.duplicates.len(),
            report.duplicate_rate * 100.0
        ));
        for dup in &report.duplicates {
            out.push_str(&format!("  - `{}` × {}\n", dup.instruction, dup.count));
        }
    }

    if report.short_responses.is_empty() {
        out.push_str("- No short responses.\n");
    } else {
        out.push_str(&format!("- {} short responses:\n", report.short_responses.len()));
        for instruction in &report.short_responses {
            out.push_str(&format!("  - `{instruction}`\n"));
        }
    }

    if report.structural_errors.is_empty() {
        out.push_str("- No structural errors.\n");
    } else {
        out.push_str(&format!(
            "- {} structural errors:\n",
            report.structural_errors.len()
        ));
        for err in &report.structural_errors {
            out.push_str(&format!("  - {err}\n"));
        }
    }

    out
}
