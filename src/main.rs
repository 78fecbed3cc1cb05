// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{error, info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

use markwai::app_config::{self, Config, ModelProvider};
use markwai::app_controller::{Controller, ExportRequest, MarkingInputs};
use markwai::errors::AppError;
use markwai::marking::SampleLevel;
use markwai::scores::ScoreOverride;

/// CLI Wrapper for ModelProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliModelProvider {
    #[value(name = "openai")]
    OpenAI,
    Anthropic,
}

impl From<CliModelProvider> for ModelProvider {
    fn from(cli_provider: CliModelProvider) -> Self {
        match cli_provider {
            CliModelProvider::OpenAI => ModelProvider::OpenAI,
            CliModelProvider::Anthropic => ModelProvider::Anthropic,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// CLI Wrapper for SampleLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliSampleLevel {
    Low,
    Medium,
    High,
}

impl From<CliSampleLevel> for SampleLevel {
    fn from(cli_level: CliSampleLevel) -> Self {
        match cli_level {
            CliSampleLevel::Low => SampleLevel::Low,
            CliSampleLevel::Medium => SampleLevel::Medium,
            CliSampleLevel::High => SampleLevel::High,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate feedback for a submission (or a folder of submissions)
    Mark(MarkArgs),

    /// Export scores CSV and feedback DOCX from an edited feedback draft
    Export(ExportArgs),

    /// Print a rubric as a table
    Rubric {
        /// Rubric file (.csv, .xlsx, .xls, .xlsm, .ods)
        #[arg(value_name = "RUBRIC")]
        file: PathBuf,
    },

    /// Check the provider credential and endpoint
    Check,

    /// Generate shell completions for markwai
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct MarkArgs {
    /// Submission document (.docx, .txt) or a folder of them
    #[arg(short, long)]
    submission: Option<PathBuf>,

    /// Rubric file (.csv, .xlsx, .xls, .xlsm, .ods)
    #[arg(short, long)]
    rubric: Option<PathBuf>,

    /// Student name (single submission only; folders use file names)
    #[arg(short = 'n', long = "student")]
    student: Option<String>,

    /// Benchmark sample level; defaults to the config value
    #[arg(long, value_enum)]
    sample_level: Option<CliSampleLevel>,

    /// Assessment descriptor document
    #[arg(long)]
    descriptor: Option<PathBuf>,

    /// Minimum requirements text
    #[arg(long)]
    requirements: Option<String>,

    /// Low-level benchmark sample document
    #[arg(long)]
    low_sample: Option<PathBuf>,

    /// Medium-level benchmark sample document
    #[arg(long)]
    medium_sample: Option<PathBuf>,

    /// High-level benchmark sample document
    #[arg(long)]
    high_sample: Option<PathBuf>,

    /// Directory for drafts and exports
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Also export scores CSV and feedback DOCX
    #[arg(short, long)]
    export: bool,

    /// Manual score, repeatable
    #[arg(long = "score", value_name = "CRITERION=N")]
    scores: Vec<ScoreOverride>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Rubric file (.csv, .xlsx, .xls, .xlsm, .ods)
    #[arg(short, long)]
    rubric: Option<PathBuf>,

    /// Student name
    #[arg(short = 'n', long = "student")]
    student: Option<String>,

    /// Feedback draft to export
    #[arg(long)]
    feedback: Option<PathBuf>,

    /// Manual score, repeatable
    #[arg(long = "score", value_name = "CRITERION=N")]
    scores: Vec<ScoreOverride>,

    /// Directory for exports
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,
}

/// MarkWAI - AI-assisted marking of student work
#[derive(Parser, Debug)]
#[command(name = "markwai")]
#[command(version)]
#[command(about = "AI-assisted marking against a rubric")]
#[command(long_about = "MarkWAI reads a student submission and a rubric, asks a chat-completion model for per-criterion feedback, and exports scores and feedback.

EXAMPLES:
    markwai mark -s essay.docx -r rubric.csv -n Jane          # Write Jane_feedback.txt
    markwai mark -s essay.docx -r rubric.xlsx -n Jane -e      # Also export CSV and DOCX
    markwai mark -s submissions/ -r rubric.csv --sample-level high
    markwai export -r rubric.csv -n Jane --feedback Jane_feedback.txt --score Clarity=8
    markwai rubric rubric.xlsx                                 # Preview a rubric
    markwai check                                              # Test the API key
    markwai completions bash > markwai.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically. An empty api_key is filled from OPENAI_API_KEY
    or ANTHROPIC_API_KEY.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,

    /// Chat-completion provider to use
    #[arg(short, long, value_enum, global = true)]
    provider: Option<CliModelProvider>,

    /// Model name to use
    #[arg(short, long, global = true)]
    model: Option<String>,
}

// @struct: Custom logger implementation
struct CustomLogger;

impl CustomLogger {
    // @initializes: Global logger; filtering is done through log::max_level
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌",
            Level::Warn => "🚧",
            Level::Info => " ",
            Level::Debug => "🔍",
            Level::Trace => "📋",
        }
    }

    // @returns: ANSI color for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let level = record.level();
            let _ = writeln!(
                std::io::stderr(),
                "{}{} {} {}\x1B[0m",
                Self::get_color_for_level(level),
                now,
                Self::get_emoji_for_level(level),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    if CustomLogger::init(LevelFilter::Info).is_err() {
        eprintln!("Failed to initialize logger");
    }

    let cli = CommandLineOptions::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<AppError>() {
            Some(missing @ AppError::MissingInput(_)) => {
                warn!("{}", missing);
                ExitCode::from(2)
            }
            _ => {
                error!("{:#}", e);
                ExitCode::FAILURE
            }
        },
    }
}

async fn run(cli: CommandLineOptions) -> Result<()> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &cli.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "markwai", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(&cli)?;

    if cli.log_level.is_none() {
        log::set_max_level(config.log_level.to_level_filter());
    }

    match cli.command {
        Commands::Mark(args) => run_mark(config, args).await,
        Commands::Export(args) => run_export(config, args),
        Commands::Rubric { file } => {
            let table = Controller::new(config).preview_rubric(&file)?;
            println!("{}", table);
            Ok(())
        }
        Commands::Check => {
            config.validate().context("Configuration validation failed")?;
            Controller::with_config(config)?.test_connection().await?;
            Ok(())
        }
        Commands::Completions { .. } => Ok(()),
    }
}

// Load or create the configuration, then apply environment and CLI overrides
fn load_config(cli: &CommandLineOptions) -> Result<Config> {
    let config_path = Path::new(&cli.config_path);
    let mut config = if config_path.exists() {
        Config::load(config_path)?
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path.display());
        let config = Config::default();
        config.save(config_path)?;
        config
    };

    if let Some(provider) = &cli.provider {
        config.marking.provider = provider.clone().into();
    }
    if let Some(model) = &cli.model {
        config.marking.set_model(model.clone());
    }
    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone().into();
    }

    // The only place the environment is read
    config.apply_env_credentials(|name| std::env::var(name).ok());

    Ok(config)
}

async fn run_mark(mut config: Config, args: MarkArgs) -> Result<()> {
    if let Some(level) = args.sample_level {
        config.marking.common.sample_level = level.into();
    }

    let inputs = MarkingInputs {
        submission: args.submission,
        rubric: args.rubric,
        student_name: args.student,
        sample_level: config.marking.common.sample_level,
        descriptor: args.descriptor,
        minimum_requirements: args.requirements,
        low_sample: args.low_sample,
        medium_sample: args.medium_sample,
        high_sample: args.high_sample,
        output_dir: args.output_dir,
        export: args.export,
        score_overrides: args.scores,
        force_overwrite: args.force_overwrite,
    };

    // Missing inputs are reported before the provider is even configured
    let missing = inputs.missing();
    if !missing.is_empty() {
        return Err(AppError::MissingInput(missing).into());
    }

    config.validate().context("Configuration validation failed")?;
    let controller = Controller::with_config(config)?;

    if inputs.is_folder() {
        let summary = controller.mark_folder(&inputs).await?;
        if summary.failed > 0 {
            return Err(AppError::Unknown(format!(
                "{} of {} submissions failed",
                summary.failed,
                summary.marked + summary.skipped + summary.failed
            ))
            .into());
        }
        return Ok(());
    }

    let outcome = controller.mark(&inputs).await?;
    println!("{}", outcome.feedback.text);

    if let Some(draft) = &outcome.draft_path {
        info!(
            "Edit {} and run `markwai export` to export the revised feedback",
            draft.display()
        );
    }
    Ok(())
}

fn run_export(config: Config, args: ExportArgs) -> Result<()> {
    let request = ExportRequest {
        rubric: args.rubric,
        student_name: args.student,
        feedback: args.feedback,
        score_overrides: args.scores,
        output_dir: args.output_dir,
        force_overwrite: args.force_overwrite,
    };

    let outcome = Controller::new(config).export(&request)?;
    if outcome.scores_path.is_none() && outcome.feedback_path.is_none() {
        warn!("Nothing exported");
    }
    Ok(())
}
