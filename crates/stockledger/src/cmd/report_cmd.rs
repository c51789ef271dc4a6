//! sledger-report - Turnover, period and balance reports.
//!
//! # Usage
//!
//! ```bash
//! sledger-report ledger.json turnover --start 2024-01-01 --end 2024-12-31
//! sledger-report ledger.json turnover --start 2024-01-01 --end 2024-12-31 \
//!     --nested group.name --value bakery
//! sledger-report ledger.json period --start 2024-01-01 --end 2024-06-30
//! sledger-report ledger.json balances --date 2024-06-30 --format json
//! ```

use anyhow::Result;
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::{self, Write};
use std::process::ExitCode;

use stockledger_filter::{CriterionDescription, EntityKind, FilterCriterion};
use stockledger_loader::format_date;
use stockledger_turnover::{balances_at, turnover_sheet, BalanceRow, CutoffSnapshot, TurnoverRow};

use super::{date_arg, failure, init_logging, render_table, CommonArgs, OutputFormat, Workspace};

/// Report stock turnovers and balances.
#[derive(Parser, Debug)]
#[command(name = "sledger-report")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Report to produce
    #[command(subcommand)]
    pub report: Report,
}

/// Available reports.
#[derive(Subcommand, Debug)]
pub enum Report {
    /// Opening, income, outcome and closing per item and location
    Turnover {
        /// First moment of the window
        #[arg(long, value_parser = date_arg)]
        start: NaiveDateTime,
        /// Last moment of the window
        #[arg(long, value_parser = date_arg)]
        end: NaiveDateTime,
        /// Only count items matching this criterion
        #[command(flatten)]
        items: ItemFilter,
    },
    /// Turnovers for a window, served from the block-period snapshot
    Period {
        /// First moment of the window
        #[arg(long, value_parser = date_arg)]
        start: NaiveDateTime,
        /// Last moment of the window
        #[arg(long, value_parser = date_arg)]
        end: NaiveDateTime,
    },
    /// Balances as of a date, split into blocked and fresh parts
    Balances {
        /// Balance date
        #[arg(long, value_parser = date_arg)]
        date: NaiveDateTime,
    },
}

/// Optional item criterion of the turnover report.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ItemFilter {
    /// Item field to filter on
    #[arg(long, value_name = "FIELD", conflicts_with = "nested")]
    pub field: Option<String>,
    /// Dotted item path to filter on, e.g. `group.name`
    #[arg(long, value_name = "PATH")]
    pub nested: Option<String>,
    /// Value to compare with
    #[arg(long, value_name = "VALUE", default_value = "")]
    pub value: String,
    /// Comparison: equals or like
    #[arg(long, value_name = "MODE")]
    pub mode: Option<String>,
}

impl ItemFilter {
    fn criterion(&self) -> Result<Option<FilterCriterion>> {
        if self.field.is_none() && self.nested.is_none() {
            return Ok(None);
        }
        let description = CriterionDescription {
            model_type: Some(EntityKind::Item.to_string()),
            field_name: self.field.clone(),
            nested_field: self.nested.clone(),
            value: self.value.clone(),
            filter_type: self.mode.clone(),
        };
        Ok(Some(FilterCriterion::from_description(&description)?))
    }
}

/// Main entry point for the report command.
pub fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.common.verbose);

    let mut stdout = io::stdout().lock();
    match run(&args, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => failure(&e),
    }
}

/// Run the command, writing the report to `writer`.
pub fn run<W: Write>(args: &Args, writer: &mut W) -> Result<()> {
    let workspace = Workspace::open(&args.common)?;

    match &args.report {
        Report::Turnover { start, end, items } => {
            let criterion = items.criterion()?;
            let rows = turnover_sheet(&workspace.ledger, *start, *end, criterion.as_ref())?;
            write_turnover(workspace.format, *start, *end, &rows, writer)
        }
        Report::Period { start, end } => {
            let cache = workspace.cache();
            cache.ensure_blocked()?;
            let rows = cache.get_for_period(*start, *end)?;
            write_period(workspace.format, cache.cutoff(), &rows, writer)
        }
        Report::Balances { date } => {
            let cache = workspace.cache();
            cache.ensure_blocked()?;
            let rows = balances_at(&cache, *date)?;
            write_balances(workspace.format, *date, &rows, writer)
        }
    }
}

fn num(value: Decimal) -> String {
    value.normalize().to_string()
}

fn write_json<W: Write, T: Serialize + ?Sized>(value: &T, writer: &mut W) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, value)?;
    writeln!(writer)?;
    Ok(())
}

fn write_turnover<W: Write>(
    format: OutputFormat,
    start: NaiveDateTime,
    end: NaiveDateTime,
    rows: &[TurnoverRow],
    writer: &mut W,
) -> Result<()> {
    if format == OutputFormat::Json {
        return write_json(rows, writer);
    }

    writeln!(writer, "Turnovers {} .. {}", format_date(start), format_date(end))?;
    writeln!(writer)?;
    let table: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            vec![
                r.item_code.clone(),
                r.location_code.clone(),
                r.unit_name.clone(),
                num(r.opening),
                num(r.income),
                num(r.outcome),
                num(r.closing),
            ]
        })
        .collect();
    write!(
        writer,
        "{}",
        render_table(
            &["item", "location", "unit", "opening", "income", "outcome", "closing"],
            &table,
            &[3, 4, 5, 6],
        )
    )?;
    Ok(())
}

fn write_period<W: Write>(
    format: OutputFormat,
    cutoff: NaiveDateTime,
    rows: &[CutoffSnapshot],
    writer: &mut W,
) -> Result<()> {
    if format == OutputFormat::Json {
        return write_json(rows, writer);
    }

    writeln!(writer, "Block period {}", format_date(cutoff))?;
    writeln!(writer)?;
    let table: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            vec![
                r.item_code.clone(),
                r.location_code.clone(),
                r.unit_name.clone(),
                num(r.blocked_period_income),
                num(r.blocked_period_outcome),
                num(r.fresh_period_income),
                num(r.fresh_period_outcome),
                num(r.balance()),
            ]
        })
        .collect();
    write!(
        writer,
        "{}",
        render_table(
            &[
                "item",
                "location",
                "unit",
                "blocked in",
                "blocked out",
                "fresh in",
                "fresh out",
                "balance",
            ],
            &table,
            &[3, 4, 5, 6, 7],
        )
    )?;
    Ok(())
}

fn write_balances<W: Write>(
    format: OutputFormat,
    date: NaiveDateTime,
    rows: &[BalanceRow],
    writer: &mut W,
) -> Result<()> {
    if format == OutputFormat::Json {
        return write_json(rows, writer);
    }

    writeln!(writer, "Balances at {}", format_date(date))?;
    writeln!(writer)?;
    let table: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            vec![
                r.item_code.clone(),
                r.location_code.clone(),
                r.unit_name.clone(),
                num(r.income),
                num(r.outcome),
                num(r.balance),
            ]
        })
        .collect();
    write!(
        writer,
        "{}",
        render_table(
            &["item", "location", "unit", "income", "outcome", "balance"],
            &table,
            &[3, 4, 5],
        )
    )?;
    Ok(())
}
