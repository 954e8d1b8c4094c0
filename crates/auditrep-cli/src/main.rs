//! Audit report assembly CLI
//!
//! Parse generated report text, attach evidence, and print the result.

use anyhow::{Context, Result};
use auditrep_core::{
    derive_corrective_action, AssembledReport, AssemblyConfig, CategoryClassifier,
    CorrectiveAction, EvidencePool, ReportAssembler, Score,
};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

mod manifest;

/// Output encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

#[derive(Parser)]
#[command(name = "auditrep", version)]
#[command(about = "Assemble generated audit reports with supporting evidence")]
struct Cli {
    /// Output format
    #[arg(long, value_enum, default_value = "json", global = true)]
    format: OutputFormat,

    /// Log debug events to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse generated text into header, legend, rows and footer
    Parse {
        /// Generated report text
        #[arg(short, long)]
        response: PathBuf,

        /// Assembly config (YAML, or JSON by extension)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Parse, match evidence, classify and aggregate findings
    Assemble {
        /// Generated report text
        #[arg(short, long)]
        response: PathBuf,

        /// Evidence manifest (JSON)
        #[arg(short, long)]
        evidence: Option<PathBuf>,

        /// Assembly config (YAML, or JSON by extension)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Auditor name for the final comments sign-off
        #[arg(long)]
        auditor: Option<String>,

        /// Also derive the corrective action register entry
        #[arg(long)]
        with_actions: bool,
    },

    /// Classify a single score
    Classify {
        /// Score such as 18, 7.5 or 18/25
        score: String,

        /// Treat the evidence as a spreadsheet
        #[arg(long)]
        spreadsheet: bool,

        /// Assembly config (YAML, or JSON by extension)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct AssembleOutput<'a> {
    #[serde(flatten)]
    report: &'a AssembledReport,

    #[serde(skip_serializing_if = "Option::is_none")]
    corrective_action: Option<CorrectiveAction>,
}

#[derive(Serialize)]
struct ClassifyOutput {
    score: String,
    category: String,
    comment: String,
    fill_color: &'static str,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    match cli.command {
        Command::Parse { response, config } => {
            let config = load_config(config.as_deref())?;
            let raw = read_response(&response)?;
            let model = ReportAssembler::new(config).parse(&raw);
            print(cli.format, &model)
        }

        Command::Assemble {
            response,
            evidence,
            config,
            auditor,
            with_actions,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(name) = auditor {
                config = config.with_auditor(name);
            }
            let date = config
                .report_date
                .unwrap_or_else(|| Utc::now().date_naive());

            let raw = read_response(&response)?;
            let pool = match evidence {
                Some(path) => manifest::load_pool(&path)?,
                None => EvidencePool::new(),
            };

            let report = ReportAssembler::new(config.with_report_date(date)).assemble(&raw, &pool);
            info!(
                rows = report.rows.len(),
                processes = report.processes.len(),
                "Assembly complete"
            );

            let corrective_action =
                with_actions.then(|| derive_corrective_action(&report, &raw, date));
            print(
                cli.format,
                &AssembleOutput {
                    report: &report,
                    corrective_action,
                },
            )
        }

        Command::Classify {
            score,
            spreadsheet,
            config,
        } => {
            let config = load_config(config.as_deref())?;
            let classification = CategoryClassifier::new(config.thresholds)
                .classify(Some(&Score::from(score.as_str())), spreadsheet);
            print(
                cli.format,
                &ClassifyOutput {
                    score: score.trim().to_string(),
                    category: classification.category.to_string(),
                    comment: classification.comment,
                    fill_color: classification.category.fill_color(),
                },
            )
        }
    }
}

/// Install the stderr subscriber; `RUST_LOG` directives take precedence.
fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("auditrep={}", level).parse()?)
        .add_directive(format!("auditrep_core={}", level).parse()?);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<AssemblyConfig> {
    match path {
        Some(path) => AssemblyConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(AssemblyConfig::default()),
    }
}

fn read_response(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .with_context(|| format!("Failed to read response {}", path.display()))
}

fn print<T: Serialize>(format: OutputFormat, value: &T) -> Result<()> {
    let text = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    };
    println!("{}", text.trim_end());
    Ok(())
}
