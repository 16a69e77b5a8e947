// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, Context};
use log::{info, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::path::PathBuf;
use std::io::Write;
use clap::{Parser, ValueEnum, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use wheresthejump::app_config::{self, Config};
use wheresthejump::app_controller::Controller;
use wheresthejump::file_utils::FileManager;
use wheresthejump::providers::opensubtitles::OpenSubtitles;

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

#[derive(Subcommand, Debug)]
enum Commands {
    /// Merge a local jump-scare track with a downloaded subtitle file
    Merge {
        /// Local jump-scare SRT
        #[arg(value_name = "LOCAL")]
        local: PathBuf,

        /// Downloaded subtitle SRT
        #[arg(value_name = "DOWNLOADED")]
        downloaded: PathBuf,

        /// Output file (default: <LOCAL stem>_merged.srt next to LOCAL)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overlap tolerance in milliseconds
        #[arg(short, long)]
        tolerance_ms: Option<u64>,

        /// Force overwrite of an existing output file
        #[arg(short, long)]
        force_overwrite: bool,
    },

    /// Build a jump-scare SRT track from a movie page (saved HTML file or URL)
    Annotate {
        /// HTML file or http(s) URL of the movie page
        #[arg(value_name = "PAGE")]
        page: String,

        /// Output SRT file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Download the most popular subtitle for an IMDb id
    Fetch {
        /// IMDb id, e.g. tt0081505
        #[arg(value_name = "IMDB_ID")]
        imdb_id: String,
    },

    /// Download and merge subtitles for every movie in a manifest
    Batch {
        /// JSON manifest of movies
        #[arg(value_name = "MANIFEST")]
        manifest: PathBuf,

        /// Re-merge movies that already have a merged file
        #[arg(short, long)]
        force_overwrite: bool,
    },

    /// Generate shell completions for wheresthejump
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// wheresthejump - jump-scare subtitles
///
/// Builds jump-scare subtitle tracks and merges them with regular subtitles
/// downloaded from OpenSubtitles.
#[derive(Parser, Debug)]
#[command(name = "wheresthejump")]
#[command(version = "1.0.0")]
#[command(about = "Merge jump-scare warnings into movie subtitles")]
#[command(long_about = "wheresthejump builds jump-scare subtitle tracks and merges them with downloaded subtitles.

EXAMPLES:
    wheresthejump annotate page.html -o srt/Alien.srt     # Jump-scare track from a saved page
    wheresthejump fetch tt0078748                         # Download subtitles into the cache
    wheresthejump merge srt/Alien.srt downloaded_subs/tt0078748.srt
    wheresthejump batch movies.json                       # Fetch and merge a whole list
    wheresthejump completions bash > wheresthejump.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. If the file doesn't exist,
    a default one is created. The OpenSubtitles API key can also be given in the
    OPENSUB_API_KEY environment variable.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long = "config", default_value = "conf.json", global = true)]
    config_path: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color and tag for a level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("\x1B[1;31m", "ERROR"),
            Level::Warn => ("\x1B[1;33m", "WARN "),
            Level::Info => ("\x1B[1;32m", "INFO "),
            Level::Debug => ("\x1B[1;36m", "DEBUG"),
            Level::Trace => ("\x1B[1;35m", "TRACE"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level() && metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (color, tag) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {} {}\x1B[0m", color, now, tag, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Trace is the ceiling; the effective level is set through log::set_max_level
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "wheresthejump", &mut std::io::stdout());
        return Ok(());
    }

    if let Some(level) = &cli.log_level {
        let level: app_config::LogLevel = level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = Config::load_or_create(&cli.config_path)?;

    if let Some(level) = &cli.log_level {
        config.log_level = level.clone().into();
    } else {
        log::set_max_level(config.log_level.to_level_filter());
    }

    run(cli.command, config).await
}

async fn run(command: Commands, mut config: Config) -> Result<()> {
    match command {
        Commands::Merge { local, downloaded, output, tolerance_ms, force_overwrite } => {
            if let Some(tolerance_ms) = tolerance_ms {
                config.merge.tolerance_ms = tolerance_ms;
            }
            let controller = Controller::with_config(config)?;

            let output = output.unwrap_or_else(|| {
                FileManager::merged_output_path(&local, &controller.config().merge.output_suffix)
            });
            if output.exists() && !force_overwrite {
                log::warn!("Output file already exists: {}. Use -f to force overwrite.", output.display());
                return Ok(());
            }

            controller.merge_files(&local, &downloaded, &output)?;
        },
        Commands::Annotate { page, output } => {
            let controller = Controller::with_config(config)?;
            controller.annotate(&page, &output).await?;
        },
        Commands::Fetch { imdb_id } => {
            let api_key = config.validate_for_download()?;
            let source = OpenSubtitles::from_config(&config.opensubtitles, api_key);
            let controller = Controller::with_config(config)?;

            let path = controller.fetch_subtitle(&source, &imdb_id).await
                .with_context(|| format!("Failed to fetch subtitles for {}", imdb_id))?;
            info!("Success: {}", path.display());
        },
        Commands::Batch { manifest, force_overwrite } => {
            let api_key = config.validate_for_download()?;
            let source = OpenSubtitles::from_config(&config.opensubtitles, api_key);
            let controller = Controller::with_config(config)?;

            controller.run_batch(&source, &manifest, force_overwrite).await?;
        },
        Commands::Completions { .. } => {},
    }

    Ok(())
}
