//! sledger-cutoff - Inspect and move the block period.
//!
//! # Usage
//!
//! ```bash
//! sledger-cutoff ledger.json get
//! sledger-cutoff ledger.json set 2024-07-01
//! sledger-cutoff ledger.json recalc
//! ```

use anyhow::Result;
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use serde_json::json;
use std::io::{self, Write};
use std::process::ExitCode;

use stockledger_loader::format_date;

use super::{date_arg, failure, init_logging, CommonArgs, OutputFormat, Workspace};

/// Manage the block-period cutoff and its snapshot.
#[derive(Parser, Debug)]
#[command(name = "sledger-cutoff")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Action to perform
    #[command(subcommand)]
    pub action: Action,
}

/// Cutoff actions.
#[derive(Subcommand, Debug)]
pub enum Action {
    /// Show the cutoff and the snapshot it is backed by
    Get,
    /// Move the cutoff, recompute the snapshot and save the settings
    Set {
        /// New cutoff
        #[arg(value_parser = date_arg)]
        date: NaiveDateTime,
    },
    /// Recompute the snapshot at the current cutoff
    Recalc,
}

/// Main entry point for the cutoff command.
pub fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.common.verbose);

    let mut stdout = io::stdout().lock();
    match run(&args, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => failure(&e),
    }
}

/// Run the command, writing its summary to `writer`.
pub fn run<W: Write>(args: &Args, writer: &mut W) -> Result<()> {
    let mut workspace = Workspace::open(&args.common)?;
    let snapshot_path = workspace.snapshot_path();

    let (cutoff, rows) = match &args.action {
        Action::Get => {
            let cache = workspace.cache();
            (cache.cutoff(), cache.load_blocked()?.len())
        }
        Action::Set { date } => {
            let cache = workspace.cache();
            cache.set_cutoff(*date)?;
            let rows = cache.load_blocked()?.len();
            workspace.settings.block_period = cache.cutoff();
            workspace.save_settings()?;
            (cache.cutoff(), rows)
        }
        Action::Recalc => {
            let cache = workspace.cache();
            let rows = cache.recalculate()?.len();
            (cache.cutoff(), rows)
        }
    };

    match workspace.format {
        OutputFormat::Json => {
            let doc = json!({
                "block_period": format_date(cutoff),
                "snapshot_file": snapshot_path.display().to_string(),
                "rows": rows,
            });
            serde_json::to_writer_pretty(&mut *writer, &doc)?;
            writeln!(writer)?;
        }
        OutputFormat::Text => {
            writeln!(writer, "block period:  {}", format_date(cutoff))?;
            writeln!(writer, "snapshot file: {}", snapshot_path.display())?;
            writeln!(writer, "snapshot rows: {rows}")?;
        }
    }
    Ok(())
}
