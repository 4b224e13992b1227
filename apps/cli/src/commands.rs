//! CLI command definitions, routing, and tracing setup.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error};
use wallabook_core::filter::SkippedEntry;
use wallabook_core::pipeline::{ProgressReporter, RunOptions};
use wallabook_shared::{Deployment, ExportOutcome, Verbosity, init_config, load_config_from};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Wallabook — your wallabag reading list as an e-book.
#[derive(Parser)]
#[command(
    name = "wallabook",
    version,
    about = "Export all wallabag articles into a single EPUB file.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (default: config.json, or the device path with --device).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output EPUB path (overrides export.output from the config).
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Use the e-reader profile: fixed device paths, output to a log file.
    #[arg(long, env = "WALLABOOK_DEVICE", global = true)]
    pub device: bool,

    /// Write operator output to this file instead of stdout.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Debug output (-d); -dd adds HTTP internals.
    #[arg(short = 'd', long = "debug", action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// Even more debug output, including HTTP internals (implies debug).
    #[arg(long = "dd", global = true)]
    pub debug_debug: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    fn deployment(&self) -> Deployment {
        if self.device {
            Deployment::Device
        } else {
            Deployment::Desktop
        }
    }

    fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.verbose, self.debug, self.debug_debug)
    }

    fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| self.deployment().default_config_path())
    }

    fn log_file(&self) -> Option<PathBuf> {
        self.log_file
            .clone()
            .or_else(|| self.deployment().default_log_file())
    }
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
    /// Export every article into an EPUB (default when no command is given).
    Export,

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
    /// Write a default TOML config file.
    Init {
        /// Where to write it.
        #[arg(long, default_value = "wallabook.toml")]
        path: PathBuf,
    },
    /// Show the resolved configuration (secrets masked).
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
///
/// Operator output goes to stdout, or appends to a log file on the device
/// profile or with `--log-file`.
pub(crate) fn init_tracing(cli: &Cli) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt};

    let verbosity = cli.verbosity();
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.filter_directive()));

    match (cli.log_file(), &cli.log_format) {
        (None, LogFormat::Text) => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        (None, LogFormat::Json) => {
            fmt().json().with_env_filter(env_filter).init();
        }
        (Some(path), format) => {
            let writer = Mutex::new(open_log_file(&path)?);

            match format {
                LogFormat::Text => {
                    fmt()
                        .with_env_filter(env_filter)
                        .with_target(false)
                        .with_ansi(false)
                        .with_writer(writer)
                        .init();
                }
                LogFormat::Json => {
                    fmt()
                        .json()
                        .with_env_filter(env_filter)
                        .with_writer(writer)
                        .init();
                }
            }
        }
    }

    debug!(?verbosity, deployment = ?cli.deployment(), "tracing initialized");
    Ok(())
}

/// Open the log sink for appending, creating it and its directory if needed.
fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| eyre!("cannot create log directory {}: {e}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| eyre!("cannot open log file {}: {e}", path.display()))
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        None | Some(Command::Export) => cmd_export(&cli).await,
        Some(Command::Config { action }) => match action {
            ConfigAction::Init { path } => cmd_config_init(path),
            ConfigAction::Show => cmd_config_show(&cli.config_path()),
        },
    }
}

async fn cmd_export(cli: &Cli) -> Result<()> {
    let deployment = cli.deployment();
    let options = RunOptions {
        config_path: cli.config_path(),
        deployment,
        output: cli.output.clone(),
    };

    let reporter = CliProgress::new(deployment);

    match wallabook_core::pipeline::run(&options, &reporter).await {
        Ok(outcome) => {
            if cli.log_file().is_none() {
                print_summary(&outcome);
            }
            Ok(())
        }
        Err(e) => {
            reporter.abandon();
            error!(error = %e, "export failed");
            Err(e.into())
        }
    }
}

fn print_summary(outcome: &ExportOutcome) {
    println!();
    println!("  EPUB written!");
    println!("  In store:  {}", outcome.reported_total);
    println!("  Exported:  {}", outcome.accepted);
    println!("  Skipped:   {}", outcome.skipped);
    println!("  Path:      {}", outcome.output_path.display());
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
///
/// Hidden on the device profile, where nobody watches a terminal.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new(deployment: Deployment) -> Self {
        if deployment == Deployment::Device {
            return Self {
                spinner: ProgressBar::hidden(),
            };
        }

        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn abandon(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn article_count(&self, total: u64) {
        self.spinner
            .set_message(format!("Fetching {total} articles"));
    }

    fn entry_skipped(&self, skipped: &SkippedEntry) {
        self.spinner
            .set_message(format!("Skipped {}", skipped.title));
    }

    fn section_added(&self, heading: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Adding [{current}/{total}] {heading}"));
    }

    fn done(&self, _outcome: &ExportOutcome) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// Config commands
// ---------------------------------------------------------------------------

fn cmd_config_init(path: &Path) -> Result<()> {
    let path = init_config(path)?;
    println!("Config initialized at: {}", path.display());
    println!("Fill in the [wallabag] section, then run: wallabook --config {}", path.display());
    Ok(())
}

fn cmd_config_show(path: &Path) -> Result<()> {
    let config = load_config_from(path)?;
    let toml_str = toml::to_string_pretty(&config.redacted())?;
    println!("# {}", path.display());
    println!("{toml_str}");
    Ok(())
}
