//! Application configuration for Blankforge.
//!
//! User config lives at `~/.blankforge/blankforge.toml`.
//! CLI flags override config file values, which override defaults.
//!
//! Validator thresholds live here rather than as constants so a corpus
//! with intentionally repeated generic prompts can raise the duplicate
//! budget without a rebuild.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BlankforgeError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "blankforge.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".blankforge";

// ---------------------------------------------------------------------------
// Config structs (matching blankforge.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Extractor settings.
    #[serde(default)]
    pub extract: ExtractConfig,

    /// Validator thresholds.
    #[serde(default)]
    pub validation: ValidationConfig,

    /// External fine-tuning command.
    #[serde(default)]
    pub trainer: TrainerConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Content store root directory.
    #[serde(default = "default_content_root")]
    pub content_root: String,

    /// Output directory for datasets and reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            content_root: default_content_root(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_content_root() -> String {
    ".".into()
}
fn default_output_dir() -> String {
    "training/output".into()
}

/// `[extract]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Words per prose chunk.
    #[serde(default = "default_chunk_words")]
    pub chunk_words: usize,

    /// Overlapping words between consecutive chunks.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Chunks shorter than this (chars) are discarded.
    #[serde(default = "default_min_chunk_chars")]
    pub min_chunk_chars: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            chunk_words: default_chunk_words(),
            chunk_overlap: default_chunk_overlap(),
            min_chunk_chars: default_min_chunk_chars(),
        }
    }
}

fn default_chunk_words() -> usize {
    500
}
fn default_chunk_overlap() -> usize {
    100
}
fn default_min_chunk_chars() -> usize {
    100
}

/// `[validation]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Responses shorter than this (chars) are flagged.
    #[serde(default = "default_min_response_len")]
    pub min_response_len: usize,

    /// Duplicate-instruction rate above which the verdict degrades to Warn.
    #[serde(default = "default_max_duplicate_rate")]
    pub max_duplicate_rate: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_response_len: default_min_response_len(),
            max_duplicate_rate: default_max_duplicate_rate(),
        }
    }
}

fn default_min_response_len() -> usize {
    50
}
fn default_max_duplicate_rate() -> f64 {
    0.05
}

/// `[trainer]` section — the external fine-tuning command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Executable to spawn.
    #[serde(default = "default_trainer_command")]
    pub command: String,

    /// Fixed arguments placed before the dataset flag.
    #[serde(default)]
    pub args: Vec<String>,

    /// Flag used to pass the dataset path (e.g. `--train_file`).
    #[serde(default = "default_train_file_flag")]
    pub train_file_flag: String,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            command: default_trainer_command(),
            args: Vec::new(),
            train_file_flag: default_train_file_flag(),
        }
    }
}

fn default_trainer_command() -> String {
    "python".into()
}
fn default_train_file_flag() -> String {
    "--train_file".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.blankforge/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| BlankforgeError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.blankforge/blankforge.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| BlankforgeError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        BlankforgeError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| BlankforgeError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| BlankforgeError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| BlankforgeError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
