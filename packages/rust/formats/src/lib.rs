//! Training-record serialization.
//!
//! Projects [`QaPair`]s into the JSONL shapes the common fine-tuning
//! stacks expect: Alpaca (with and without a system field), ShareGPT
//! conversations, and OpenAI-style chat messages. Content units get a
//! fifth, pretraining-style projection. One JSON object per line,
//! nothing else on the line.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use blankforge_shared::{BlankforgeError, ContentUnit, QaPair, Result};

/// System prompt baked into the system-bearing formats.
pub const SYSTEM_PROMPT: &str = "You are a knowledgeable smartphone expert assistant. You provide accurate, helpful information about phones, with deep expertise in Blankphone products, specifications, and comparisons.";

// ---------------------------------------------------------------------------
// Record shapes
// ---------------------------------------------------------------------------

/// Alpaca record: `{"instruction", "input", "output"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlpacaRecord {
    pub instruction: String,
    pub input: String,
    pub output: String,
}

/// Alpaca record with an additional `system` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlpacaSystemRecord {
    pub system: String,
    pub instruction: String,
    pub input: String,
    pub output: String,
}

/// One turn of a ShareGPT conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareGptTurn {
    pub from: String,
    pub value: String,
}

/// ShareGPT record: `{"conversations": [{from, value}, ...]}` with
/// `system`, `human`, `gpt` roles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareGptRecord {
    pub conversations: Vec<ShareGptTurn>,
}

/// One OpenAI-style chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// OpenAI-style record: `{"messages": [{role, content}, ...]}` with
/// `system`, `user`, `assistant` roles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRecord {
    pub messages: Vec<ChatMessage>,
}

/// Pretraining record: raw corpus text, one document per line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PretrainRecord {
    pub text: String,
}

// ---------------------------------------------------------------------------
// Projections
// ---------------------------------------------------------------------------

impl From<&QaPair> for AlpacaRecord {
    fn from(pair: &QaPair) -> Self {
        Self {
            instruction: pair.instruction.clone(),
            input: String::new(),
            output: pair.response.clone(),
        }
    }
}

impl From<&QaPair> for AlpacaSystemRecord {
    fn from(pair: &QaPair) -> Self {
        Self {
            system: SYSTEM_PROMPT.to_string(),
            instruction: pair.instruction.clone(),
            input: String::new(),
            output: pair.response.clone(),
        }
    }
}

impl From<&QaPair> for ShareGptRecord {
    fn from(pair: &QaPair) -> Self {
        Self {
            conversations: vec![
                ShareGptTurn {
                    from: "system".into(),
                    value: SYSTEM_PROMPT.to_string(),
                },
                ShareGptTurn {
                    from: "human".into(),
                    value: pair.instruction.clone(),
                },
                ShareGptTurn {
                    from: "gpt".into(),
                    value: pair.response.clone(),
                },
            ],
        }
    }
}

impl From<&QaPair> for ChatRecord {
    fn from(pair: &QaPair) -> Self {
        Self {
            messages: vec![
                ChatMessage {
                    role: "system".into(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".into(),
                    content: pair.instruction.clone(),
                },
                ChatMessage {
                    role: "assistant".into(),
                    content: pair.response.clone(),
                },
            ],
        }
    }
}

impl From<&ContentUnit> for PretrainRecord {
    fn from(unit: &ContentUnit) -> Self {
        Self {
            text: unit.body.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Output formats
// ---------------------------------------------------------------------------

/// The supported Q&A output formats and their conventional file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    Alpaca,
    AlpacaSystem,
    Sharegpt,
    Chat,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 4] = [
        OutputFormat::Alpaca,
        OutputFormat::AlpacaSystem,
        OutputFormat::Sharegpt,
        OutputFormat::Chat,
    ];

    /// Conventional output file name for this format.
    pub fn file_name(self) -> &'static str {
        match self {
            OutputFormat::Alpaca => "train_alpaca.jsonl",
            OutputFormat::AlpacaSystem => "train_alpaca_system.jsonl",
            OutputFormat::Sharegpt => "train_sharegpt.jsonl",
            OutputFormat::Chat => "train_chat.jsonl",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Alpaca => "alpaca",
            OutputFormat::AlpacaSystem => "alpaca-system",
            OutputFormat::Sharegpt => "sharegpt",
            OutputFormat::Chat => "chat",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = BlankforgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "alpaca" => Ok(OutputFormat::Alpaca),
            "alpaca-system" => Ok(OutputFormat::AlpacaSystem),
            "sharegpt" => Ok(OutputFormat::Sharegpt),
            "chat" => Ok(OutputFormat::Chat),
            other => Err(BlankforgeError::Format(format!(
                "unknown output format '{other}' (expected alpaca, alpaca-system, sharegpt, or chat)"
            ))),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// JSONL writing
// ---------------------------------------------------------------------------

/// Counts for one JSONL write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatStats {
    /// Lines written.
    pub written: usize,
    /// Pairs skipped for an empty instruction or response.
    pub skipped: usize,
}

/// Write pairs to `path` in the given format, one JSON object per line.
/// Pairs with an empty instruction or response are skipped and counted,
/// never written.
#[instrument(skip_all, fields(format = %format, path = %path.display()))]
pub fn write_pairs(pairs: &[QaPair], format: OutputFormat, path: &Path) -> Result<FormatStats> {
    let file = File::create(path).map_err(|e| BlankforgeError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    let mut stats = FormatStats::default();

    for pair in pairs {
        if pair.instruction.trim().is_empty() || pair.response.trim().is_empty() {
            stats.skipped += 1;
            continue;
        }

        let line = match format {
            OutputFormat::Alpaca => serde_json::to_string(&AlpacaRecord::from(pair)),
            OutputFormat::AlpacaSystem => serde_json::to_string(&AlpacaSystemRecord::from(pair)),
            OutputFormat::Sharegpt => serde_json::to_string(&ShareGptRecord::from(pair)),
            OutputFormat::Chat => serde_json::to_string(&ChatRecord::from(pair)),
        }
        .map_err(|e| BlankforgeError::Format(format!("serialize {format} record: {e}")))?;

        writeln!(writer, "{line}").map_err(|e| BlankforgeError::io(path, e))?;
        stats.written += 1;
    }

    writer.flush().map_err(|e| BlankforgeError::io(path, e))?;

    if stats.skipped > 0 {
        warn!(skipped = stats.skipped, "dropped pairs with empty fields");
    }
    info!(written = stats.written, "jsonl file written");

    Ok(stats)
}

/// Write content units as a pretraining corpus, one document per line.
/// Empty-bodied units are skipped and counted.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn write_pretrain(units: &[ContentUnit], path: &Path) -> Result<FormatStats> {
    let file = File::create(path).map_err(|e| BlankforgeError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    let mut stats = FormatStats::default();

    for unit in units {
        if unit.body.trim().is_empty() {
            stats.skipped += 1;
            continue;
        }
        let line = serde_json::to_string(&PretrainRecord::from(unit))
            .map_err(|e| BlankforgeError::Format(format!("serialize pretrain record: {e}")))?;
        writeln!(writer, "{line}").map_err(|e| BlankforgeError::io(path, e))?;
        stats.written += 1;
    }

    writer.flush().map_err(|e| BlankforgeError::io(path, e))?;
    info!(written = stats.written, "pretrain corpus written");

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use blankforge_shared::Category;

    fn sample_pairs() -> Vec<QaPair> {
        vec![
            QaPair::new(
                "What is the best phone?",
                "The Blankphone Pro is the best phone you can buy.",
                Category::General,
            ),
            QaPair::new(
                "How much does Blankphone Pro cost?",
                "The Blankphone Pro costs $1099.",
                Category::ProductSpecific,
            ),
        ]
    }

    #[test]
    fn alpaca_projection_has_empty_input() {
        let pairs = sample_pairs();
        let rec = AlpacaRecord::from(&pairs[0]);
        assert_eq!(rec.instruction, "What is the best phone?");
        assert_eq!(rec.input, "");
        assert!(rec.output.contains("Blankphone Pro"));
    }

    #[test]
    fn sharegpt_turns_in_role_order() {
        let pairs = sample_pairs();
        let rec = ShareGptRecord::from(&pairs[0]);
        let roles: Vec<&str> = rec.conversations.iter().map(|t| t.from.as_str()).collect();
        assert_eq!(roles, ["system", "human", "gpt"]);
        assert_eq!(rec.conversations[0].value, SYSTEM_PROMPT);
        assert_eq!(rec.conversations[1].value, pairs[0].instruction);
    }

    #[test]
    fn chat_messages_in_role_order() {
        let pairs = sample_pairs();
        let rec = ChatRecord::from(&pairs[1]);
        let roles: Vec<&str> = rec.messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, ["system", "user", "assistant"]);
        assert_eq!(rec.messages[2].content, pairs[1].response);
    }

    #[test]
    fn format_names_roundtrip() {
        for format in OutputFormat::ALL {
            let parsed: OutputFormat = format.as_str().parse().unwrap();
            assert_eq!(parsed, format);
        }
        assert!("jsonlx".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn write_pairs_one_object_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train_alpaca.jsonl");

        let stats = write_pairs(&sample_pairs(), OutputFormat::Alpaca, &path).unwrap();
        assert_eq!(stats.written, 2);
        assert_eq!(stats.skipped, 0);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let rec: AlpacaRecord = serde_json::from_str(line).unwrap();
            assert!(!rec.instruction.is_empty());
        }
    }

    #[test]
    fn empty_response_pairs_are_skipped() {
        let mut pairs = sample_pairs();
        pairs.push(QaPair::new("Orphan question?", "  ", Category::General));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train_chat.jsonl");
        let stats = write_pairs(&pairs, OutputFormat::Chat, &path).unwrap();

        assert_eq!(stats.written, 2);
        assert_eq!(stats.skipped, 1);
        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 2);
    }

    #[test]
    fn pretrain_lines_carry_raw_text() {
        let units = [
            ContentUnit {
                source: "index.html".into(),
                topics: vec!["general".into()],
                body: "Start Blank. End Brilliant.".into(),
            },
            ContentUnit {
                source: "blog/empty.html".into(),
                topics: vec![],
                body: String::new(),
            },
        ];

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pretrain.jsonl");
        let stats = write_pretrain(&units, &path).unwrap();
        assert_eq!(stats.written, 1);
        assert_eq!(stats.skipped, 1);

        let content = std::fs::read_to_string(&path).unwrap();
        let rec: PretrainRecord = serde_json::from_str(content.lines().next().unwrap()).unwrap();
        assert_eq!(rec.text, "Start Blank. End Brilliant.");
    }
}
