//! jsmon: integrity monitor for remotely hosted JavaScript packages.
//!
//! Polls third-party scripts, keeps a version history of their content and
//! alerts with minimal before/after snippets when the content changes.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use jsmon::{
    cli::{self, DiffSource, PollOptions, WatchArgs, exit_codes},
    config::{AppConfig, ConfigFileError, Validatable, file::CONFIG_FILE_NAMES},
    reports::ReportFormat,
};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "jsmon")]
#[command(version)]
#[command(about = "Integrity monitor for remotely hosted JavaScript packages", long_about = None)]
#[command(after_help = "EXIT CODES:
    0  Success (no changes, or changes without --fail-on-change)
    1  Changes detected (poll --fail-on-change, diff)
    2  One or more targets could not be polled or alerted on
    3  Error occurred

EXAMPLES:
    # Record the current state of every configured target
    jsmon poll

    # Poll an extra URL every 15 minutes
    jsmon --url https://cdn.example.com/widget.js watch --interval 15m

    # Review what changed between the last two versions
    jsmon diff --target https://cdn.example.com/widget.js")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Monitor this URL in addition to the configured targets (repeatable)
    #[arg(long = "url", global = true, value_name = "URL")]
    urls: Vec<String>,

    /// Override the SQLite database path
    #[arg(long, global = true, env = "JSMON_DATABASE")]
    database: Option<PathBuf>,

    /// Override the raw content directory
    #[arg(long, global = true, env = "JSMON_BLOB_DIR")]
    blob_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll every target once
    Poll {
        /// Cycle report format
        #[arg(short, long, default_value = "text")]
        output: ReportFormat,

        /// Exit with code 1 if any target changed
        #[arg(long)]
        fail_on_change: bool,
    },

    /// Poll targets repeatedly until interrupted
    Watch {
        /// Time between cycles (e.g. 30s, 15m, 1h); overrides `watch.interval`
        #[arg(short, long)]
        interval: Option<String>,

        /// Stop after this many cycles
        #[arg(long)]
        max_cycles: Option<u64>,

        /// Exit after the first cycle that detects a change
        #[arg(long)]
        exit_on_change: bool,

        /// Targets polled in parallel; overrides `watch.workers`
        #[arg(long)]
        workers: Option<usize>,
    },

    /// List monitored targets and their current version
    Targets {
        #[arg(short, long, default_value = "text")]
        output: ReportFormat,
    },

    /// Show the recorded versions of a target
    History {
        /// Target URL
        url: String,

        #[arg(short, long, default_value = "text")]
        output: ReportFormat,
    },

    /// Show the changes between two files or two recorded versions
    Diff {
        /// Old file
        #[arg(requires = "new", conflicts_with = "target")]
        old: Option<PathBuf>,

        /// New file
        new: Option<PathBuf>,

        /// Compare recorded versions of this target instead of files
        #[arg(long, required_unless_present = "old")]
        target: Option<String>,

        /// Old version (default: the one before --to)
        #[arg(long, requires = "target")]
        from: Option<u32>,

        /// New version (default: current)
        #[arg(long, requires = "target")]
        to: Option<u32>,

        /// Characters of context around each change; overrides `diff.context_margin`
        #[arg(long)]
        context_margin: Option<usize>,

        #[arg(short, long, default_value = "text")]
        output: ReportFormat,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Generate JSON Schema for the config file format
    ConfigSchema {
        /// Write schema to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show, discover, or initialize configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Sub-subcommands for the `config` command
#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration (defaults + file + flags)
    Show,
    /// Print config file search paths and the discovered config file
    Path,
    /// Generate an example .jsmon.yaml in the current directory
    Init,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli) {
        eprintln!("Error: {e:#}");
        return ExitCode::from(exit_code_byte(exit_codes::ERROR));
    }

    match run(cli) {
        Ok(code) => ExitCode::from(exit_code_byte(code)),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(exit_code_byte(exit_codes::ERROR))
        }
    }
}

fn exit_code_byte(code: i32) -> u8 {
    u8::try_from(code).unwrap_or(1)
}

fn init_logging(cli: &Cli) -> Result<()> {
    let log_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let file_layer = match &cli.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(file_layer)
        .init();
    Ok(())
}

/// Load the config file and layer CLI flags over it.
fn load_config(cli: &Cli) -> Result<(AppConfig, Option<PathBuf>)> {
    let (mut config, loaded_from) = match jsmon::config::load_or_default(cli.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(ConfigFileError::NotFound(path)) => {
            anyhow::bail!("config file {} does not exist", path.display())
        }
        Err(e) => return Err(e.into()),
    };

    config.merge_targets(cli.urls.iter().cloned());
    if let Some(db) = &cli.database {
        config.storage.database = Some(db.clone());
    }
    if let Some(dir) = &cli.blob_dir {
        config.storage.blob_dir = Some(dir.clone());
    }
    Ok((config, loaded_from))
}

fn validated(config: AppConfig) -> Result<AppConfig> {
    let errors = config.validate();
    if errors.is_empty() {
        return Ok(config);
    }
    for error in &errors {
        tracing::error!("{error}");
    }
    anyhow::bail!("configuration has {} error(s)", errors.len())
}

fn run(cli: Cli) -> Result<i32> {
    match &cli.command {
        Commands::Poll {
            output,
            fail_on_change,
        } => {
            let config = validated(load_config(&cli)?.0)?;
            cli::run_poll(
                &config,
                PollOptions {
                    format: *output,
                    fail_on_change: *fail_on_change,
                    quiet: cli.quiet,
                },
            )
        }

        Commands::Watch {
            interval,
            max_cycles,
            exit_on_change,
            workers,
        } => {
            let mut config = load_config(&cli)?.0;
            if let Some(workers) = workers {
                config.watch.workers = *workers;
            }
            if let Some(interval) = interval {
                config.watch.interval.clone_from(interval);
            }
            let config = validated(config)?;
            cli::run_watch(
                &config,
                &WatchArgs {
                    interval: None,
                    max_cycles: *max_cycles,
                    exit_on_change: *exit_on_change,
                    quiet: cli.quiet,
                },
            )
        }

        Commands::Targets { output } => {
            let config = validated(load_config(&cli)?.0)?;
            cli::run_targets(&config, *output)
        }

        Commands::History { url, output } => {
            let config = load_config(&cli)?.0;
            cli::run_history(&config, url, *output)
        }

        Commands::Diff {
            old,
            new,
            target,
            from,
            to,
            context_margin,
            output,
        } => {
            let mut config = load_config(&cli)?.0;
            if let Some(margin) = context_margin {
                config.diff.context_margin = *margin;
            }
            let source = match (old, new, target) {
                (Some(old), Some(new), _) => DiffSource::Files {
                    old: old.clone(),
                    new: new.clone(),
                },
                (_, _, Some(url)) => DiffSource::Versions {
                    url: url.clone(),
                    from: *from,
                    to: *to,
                },
                _ => anyhow::bail!("give two files or --target URL"),
            };
            cli::run_diff(&config, &source, *output)
        }

        Commands::Completions { shell } => {
            generate(*shell, &mut Cli::command(), "jsmon", &mut io::stdout());
            Ok(exit_codes::SUCCESS)
        }

        Commands::ConfigSchema { output } => {
            let schema = jsmon::config::generate_json_schema()?;
            match output {
                Some(path) => {
                    std::fs::write(path, &schema)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    eprintln!("Schema written to {}", path.display());
                }
                None => println!("{schema}"),
            }
            Ok(exit_codes::SUCCESS)
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let (config, loaded_from) = load_config(&cli)?;
                match &loaded_from {
                    Some(path) => eprintln!("# Loaded from: {}", path.display()),
                    None => eprintln!("# No config file found; showing defaults"),
                }
                let yaml =
                    serde_yaml_ng::to_string(&config).context("failed to serialize config")?;
                print!("{yaml}");
                Ok(exit_codes::SUCCESS)
            }
            ConfigAction::Path => {
                let search_paths: [Option<String>; 3] = [
                    std::env::current_dir()
                        .ok()
                        .map(|p| p.display().to_string()),
                    jsmon::config::file::user_config_dir().map(|p| p.display().to_string()),
                    ::dirs::home_dir().map(|p| p.display().to_string()),
                ];
                eprintln!("Config file search paths (in order):");
                for path in search_paths.into_iter().flatten() {
                    eprintln!("  {path}");
                }
                eprintln!();
                eprintln!("Recognized file names:");
                for name in CONFIG_FILE_NAMES {
                    eprintln!("  {name}");
                }
                eprintln!();
                match jsmon::config::discover_config_file(cli.config.as_deref()) {
                    Some(path) => eprintln!("Active config file: {}", path.display()),
                    None => eprintln!("No config file found."),
                }
                eprintln!(
                    "Data directory: {}",
                    jsmon::config::data_dir().display()
                );
                Ok(exit_codes::SUCCESS)
            }
            ConfigAction::Init => {
                let target = std::env::current_dir()
                    .context("cannot determine current directory")?
                    .join(".jsmon.yaml");
                if target.exists() {
                    anyhow::bail!(
                        "{} already exists. Remove it first to re-initialize.",
                        target.display()
                    );
                }
                std::fs::write(&target, jsmon::config::generate_example_config())
                    .with_context(|| format!("failed to write {}", target.display()))?;
                eprintln!("Created {}", target.display());
                Ok(exit_codes::SUCCESS)
            }
        },
    }
}
