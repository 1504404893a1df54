//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use blankforge_core::{BuildConfig, BuildResult, ProgressReporter};
use blankforge_formats::OutputFormat;
use blankforge_report::Verdict;
use blankforge_shared::{AppConfig, init_config, load_config};
use blankforge_trainer::{JobStatus, TrainSpec};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Blankforge — turn an authored content store into fine-tuning data.
#[derive(Parser)]
#[command(
    name = "blankforge",
    version,
    about = "Build brand-focused fine-tuning datasets from an authored content store.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the full pipeline: extract, synthesize, format, validate.
    Run {
        /// Content store root (defaults to config).
        #[arg(short, long)]
        content: Option<String>,

        /// Output directory (defaults to config).
        #[arg(short, long)]
        out: Option<String>,
    },

    /// Extract content units into content_units.json.
    Extract {
        /// Content store root (defaults to config).
        #[arg(short, long)]
        content: Option<String>,

        /// Output directory (defaults to config).
        #[arg(short, long)]
        out: Option<String>,
    },

    /// Synthesize Q&A pairs from extracted units into qa_pairs.json.
    Generate {
        /// Content store root (defaults to config).
        #[arg(short, long)]
        content: Option<String>,

        /// Output directory (defaults to config).
        #[arg(short, long)]
        out: Option<String>,
    },

    /// Write qa_pairs.json out in one or all wire formats.
    Format {
        /// Output directory holding qa_pairs.json (defaults to config).
        #[arg(short, long)]
        out: Option<String>,

        /// Format to write: alpaca, alpaca-system, sharegpt, chat, or all.
        #[arg(short, long, default_value = "all")]
        format: String,
    },

    /// Validate qa_pairs.json and any written JSONL files.
    Validate {
        /// Output directory holding the dataset (defaults to config).
        #[arg(short, long)]
        out: Option<String>,
    },

    /// Hand a dataset to the configured external trainer.
    Train {
        /// Training file (defaults to <output_dir>/train_chat.jsonl).
        #[arg(short, long)]
        file: Option<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "blankforge=info",
        1 => "blankforge=debug",
        _ => "blankforge=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run { content, out } => cmd_run(content.as_deref(), out.as_deref()),
        Command::Extract { content, out } => cmd_extract(content.as_deref(), out.as_deref()),
        Command::Generate { content, out } => cmd_generate(content.as_deref(), out.as_deref()),
        Command::Format { out, format } => cmd_format(out.as_deref(), &format),
        Command::Validate { out } => cmd_validate(out.as_deref()),
        Command::Train { file } => cmd_train(file.as_deref()).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

/// Resolve content root and output dir from flags, falling back to config.
fn resolve_paths(
    config: &AppConfig,
    content: Option<&str>,
    out: Option<&str>,
) -> (PathBuf, PathBuf) {
    let content_root = PathBuf::from(content.unwrap_or(&config.defaults.content_root));
    let output_dir = PathBuf::from(out.unwrap_or(&config.defaults.output_dir));
    (content_root, output_dir)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_run(content: Option<&str>, out: Option<&str>) -> Result<()> {
    let config = load_config()?;
    let (content_root, output_dir) = resolve_paths(&config, content, out);

    let build_config = BuildConfig {
        content_root,
        output_dir,
        extract: config.extract.clone(),
        validation: config.validation.clone(),
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
    };

    info!(
        content_root = %build_config.content_root.display(),
        output_dir = %build_config.output_dir.display(),
        "building dataset"
    );

    let reporter = CliProgress::new();
    let result = blankforge_core::run_build(&build_config, &reporter)?;

    println!();
    println!("  Dataset built!");
    println!("  Run:     {}", result.run_id);
    println!("  Units:   {}", result.unit_count);
    println!("  Pairs:   {}", result.pair_count);
    for (name, lines) in &result.format_lines {
        println!("  {name}: {lines} lines");
    }
    println!("  Verdict: {}", result.report.verdict);
    println!("  Path:    {}", result.output_dir.display());
    println!("  Time:    {:.1}s", result.elapsed.as_secs_f64());
    println!();

    if result.report.verdict == Verdict::Fail {
        return Err(eyre!(
            "validation failed — see {}",
            result.output_dir.join("validation_report.md").display()
        ));
    }

    Ok(())
}

fn cmd_extract(content: Option<&str>, out: Option<&str>) -> Result<()> {
    let config = load_config()?;
    let (content_root, output_dir) = resolve_paths(&config, content, out);

    let stats = blankforge_core::extract_stage(&content_root, &output_dir, &config.extract)?;

    println!();
    println!("  Extraction complete!");
    println!("  Pages:    {}", stats.pages);
    println!("  Products: {}", stats.products);
    println!("  Threads:  {}", stats.threads);
    println!("  Skipped:  {}", stats.skipped);
    println!("  Units:    {}", stats.units);
    println!("  Wrote:    {}", output_dir.join(blankforge_core::UNITS_FILE).display());
    println!();

    Ok(())
}

fn cmd_generate(content: Option<&str>, out: Option<&str>) -> Result<()> {
    let config = load_config()?;
    let (content_root, output_dir) = resolve_paths(&config, content, out);

    let stats = blankforge_core::generate_stage(&content_root, &output_dir)?;

    println!();
    println!("  Synthesis complete!");
    println!("  Product:        {}", stats.product);
    println!("  Comparison:     {}", stats.comparison);
    println!("  Recommendation: {}", stats.recommendation);
    println!("  Generic:        {}", stats.generic);
    println!("  Competitor:     {}", stats.competitor);
    println!("  Developer:      {}", stats.developer);
    println!("  Support:        {}", stats.support);
    println!("  General:        {}", stats.general);
    println!("  Unit-derived:   {}", stats.unit_derived);
    println!("  Total:          {}", stats.total);
    println!("  Wrote:          {}", output_dir.join(blankforge_core::PAIRS_FILE).display());
    println!();

    Ok(())
}

fn cmd_format(out: Option<&str>, format: &str) -> Result<()> {
    let config = load_config()?;
    let (_, output_dir) = resolve_paths(&config, None, out);

    let formats: Vec<OutputFormat> = if format == "all" {
        OutputFormat::ALL.to_vec()
    } else {
        vec![format.parse()?]
    };

    let results = blankforge_core::format_stage(&output_dir, &formats)?;

    println!();
    for (fmt, stats) in results {
        println!(
            "  {}: {} lines ({} skipped)",
            fmt.file_name(),
            stats.written,
            stats.skipped
        );
    }
    println!();

    Ok(())
}

fn cmd_validate(out: Option<&str>) -> Result<()> {
    let config = load_config()?;
    let (_, output_dir) = resolve_paths(&config, None, out);

    let report = blankforge_core::validate_stage(&output_dir, &config.validation)?;

    println!();
    println!("  Verdict:    {}", report.verdict);
    println!("  Pairs:      {}", report.stats.total_pairs);
    println!("  Duplicates: {}", report.duplicates.len());
    println!("  Short:      {}", report.short_responses.len());
    println!("  Structural: {}", report.structural_errors.len());
    println!("  Report:     {}", output_dir.join("validation_report.md").display());
    println!();

    if report.verdict == Verdict::Fail {
        return Err(eyre!("dataset validation failed"));
    }

    Ok(())
}

async fn cmd_train(file: Option<&str>) -> Result<()> {
    let config = load_config()?;

    let train_file = match file {
        Some(p) => PathBuf::from(p),
        None => PathBuf::from(&config.defaults.output_dir).join("train_chat.jsonl"),
    };

    let spec = TrainSpec::from_config(&config.trainer, &train_file);
    info!(
        command = %spec.command,
        train_file = %train_file.display(),
        "submitting training job"
    );

    let mut job = blankforge_trainer::submit(&spec)?;

    if let Some(mut logs) = job.log_lines() {
        tokio::spawn(async move {
            while let Some(line) = logs.recv().await {
                println!("  [trainer] {}", line.text);
            }
        });
    }

    match job.wait().await? {
        JobStatus::Succeeded => {
            println!();
            println!("  Training completed successfully.");
            println!();
            Ok(())
        }
        JobStatus::Failed { code } => Err(eyre!(
            "trainer exited with status {}",
            code.map_or_else(|| "signal".to_string(), |c| c.to_string())
        )),
        JobStatus::Cancelled => Err(eyre!("training job was cancelled")),
        JobStatus::Running => unreachable!("wait() returned while running"),
    }
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn file_written(&self, name: &str, lines: usize) {
        self.spinner.set_message(format!("Wrote {name} ({lines} lines)"));
    }

    fn done(&self, _result: &BuildResult) {
        self.spinner.finish_and_clear();
    }
}
