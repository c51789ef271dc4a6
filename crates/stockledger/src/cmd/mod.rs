//! Command implementations for CLI tools.
//!
//! Each module contains the full implementation for a command, which is
//! invoked by a thin wrapper binary. The helpers here are the composition
//! root: they read the settings and the ledger, and build the snapshot
//! cache every command shares.

pub mod cutoff_cmd;
pub mod filter_cmd;
pub mod report_cmd;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::ValueEnum;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

use stockledger_core::LedgerStore;
use stockledger_filter::FilterError;
use stockledger_loader::{load_ledger, parse_date, LoadError, ReportFormat, Settings};
use stockledger_turnover::{JsonFileSnapshotStore, SnapshotCache, TurnoverError};

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    #[default]
    Text,
    /// JSON output
    Json,
}

impl From<ReportFormat> for OutputFormat {
    fn from(format: ReportFormat) -> Self {
        match format {
            ReportFormat::Text => Self::Text,
            ReportFormat::Json => Self::Json,
        }
    }
}

/// Arguments every command takes.
#[derive(clap::Args, Debug, Clone)]
pub struct CommonArgs {
    /// The JSON ledger dataset
    #[arg(value_name = "LEDGER")]
    pub ledger: PathBuf,

    /// Settings file (created on first `sledger-cutoff set`)
    #[arg(short, long, value_name = "FILE", default_value = "settings.json", global = true)]
    pub settings: PathBuf,

    /// Output format; defaults to the settings' `default_format`
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<OutputFormat>,

    /// Show debug logging (`RUST_LOG` takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Parse a date argument in any layout the settings accept.
pub fn date_arg(input: &str) -> Result<NaiveDateTime, LoadError> {
    parse_date(input)
}

/// Install the tracing subscriber.
///
/// `RUST_LOG` wins; otherwise `verbose` selects `debug` and the default is
/// `warn`. Logs go to stderr so stdout stays machine-readable.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A second init (tests calling several mains) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Whether any cause in the chain is a bad-input error.
pub fn is_validation(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        cause.downcast_ref::<FilterError>().is_some()
            || cause
                .downcast_ref::<TurnoverError>()
                .is_some_and(TurnoverError::is_validation)
            || cause
                .downcast_ref::<LoadError>()
                .is_some_and(LoadError::is_validation)
    })
}

/// Report an error and pick the exit code: 2 for bad input, 1 otherwise.
pub fn failure(error: &anyhow::Error) -> ExitCode {
    eprintln!("error: {error:#}");
    if is_validation(error) {
        ExitCode::from(2)
    } else {
        ExitCode::from(1)
    }
}

/// Loaded settings and ledger.
#[derive(Debug)]
pub struct Workspace {
    /// Settings in effect.
    pub settings: Settings,
    /// Where the settings live (whether or not the file exists yet).
    pub settings_path: PathBuf,
    /// The shared ledger.
    pub ledger: Arc<LedgerStore>,
    /// Output format after applying the settings default.
    pub format: OutputFormat,
}

impl Workspace {
    /// Read the settings (or defaults) and the ledger named by `args`.
    pub fn open(args: &CommonArgs) -> Result<Self> {
        let settings = Settings::load_or_default(&args.settings)
            .with_context(|| format!("failed to load settings {}", args.settings.display()))?;
        let ledger = load_ledger(&args.ledger)
            .with_context(|| format!("failed to load ledger {}", args.ledger.display()))?;
        let format = args
            .format
            .unwrap_or_else(|| settings.default_format.into());
        debug!(
            settings = %args.settings.display(),
            block_period = %settings.block_period,
            ?format,
            "opened workspace"
        );
        Ok(Self {
            settings,
            settings_path: args.settings.clone(),
            ledger,
            format,
        })
    }

    /// Path of the persisted snapshot.
    pub fn snapshot_path(&self) -> PathBuf {
        self.settings.snapshot_path(&self.settings_path)
    }

    /// A snapshot cache over the ledger at the configured cutoff.
    pub fn cache(&self) -> SnapshotCache {
        SnapshotCache::new(
            Arc::clone(&self.ledger),
            Box::new(JsonFileSnapshotStore::new(self.snapshot_path())),
            self.settings.block_period,
        )
    }

    /// Persist the settings back to their file.
    pub fn save_settings(&self) -> Result<()> {
        self.settings
            .save(&self.settings_path)
            .with_context(|| format!("failed to save settings {}", self.settings_path.display()))
    }
}

/// Render rows as an aligned text table.
///
/// Columns listed in `numeric` are right-aligned.
pub fn render_table(headers: &[&str], rows: &[Vec<String>], numeric: &[usize]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = render_line(headers.iter().copied(), &widths, numeric);
    out.push('\n');
    out.push_str(&"-".repeat(widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1)));
    out.push('\n');
    for row in rows {
        out.push_str(&render_line(row.iter().map(String::as_str), &widths, numeric));
        out.push('\n');
    }
    out
}

fn render_line<'a>(
    cells: impl Iterator<Item = &'a str>,
    widths: &[usize],
    numeric: &[usize],
) -> String {
    cells
        .zip(widths)
        .enumerate()
        .map(|(i, (cell, &width))| {
            if numeric.contains(&i) {
                format!("{cell:>width$}")
            } else {
                format!("{cell:<width$}")
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}
