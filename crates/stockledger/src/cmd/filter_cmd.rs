//! sledger-filter - Filter reference data by field or nested path.
//!
//! # Usage
//!
//! ```bash
//! sledger-filter ledger.json --model nomenclature --field name --value flour
//! sledger-filter ledger.json --model receipt --nested composition.nomenclature.name --value flour
//! sledger-filter ledger.json --model group --list-fields
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::io::{self, Write};
use std::process::ExitCode;

use stockledger_core::LedgerStore;
use stockledger_filter::{
    apply, supported_fields, CriterionDescription, Entity, EntityKind, FilterCriterion,
};

use super::{failure, init_logging, render_table, CommonArgs, OutputFormat, Workspace};

/// Find items, groups, units and recipes matching a criterion.
#[derive(Parser, Debug)]
#[command(name = "sledger-filter")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Entity variant: nomenclature, group, range or receipt
    #[arg(short, long, value_name = "MODEL")]
    pub model: String,

    /// Simple field name (`name`, `unique_code`, or a variant field)
    #[arg(long, value_name = "FIELD")]
    pub field: Option<String>,

    /// Dotted nested path, e.g. `composition.nomenclature.name`
    #[arg(long, value_name = "PATH")]
    pub nested: Option<String>,

    /// Value to compare with
    #[arg(long, value_name = "VALUE", default_value = "")]
    pub value: String,

    /// Comparison: equals or like (default: equals for codes, like otherwise)
    #[arg(long, value_name = "MODE")]
    pub mode: Option<String>,

    /// List the fields the variant can be filtered on and exit
    #[arg(long)]
    pub list_fields: bool,
}

#[derive(Debug, Serialize)]
struct Found<'a> {
    model_type: String,
    unique_code: &'a str,
    name: &'a str,
}

/// Main entry point for the filter command.
pub fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.common.verbose);

    let mut stdout = io::stdout().lock();
    match run(&args, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => failure(&e),
    }
}

/// Run the command, writing results to `writer`.
pub fn run<W: Write>(args: &Args, writer: &mut W) -> Result<()> {
    let kind: EntityKind = args.model.parse().context("invalid --model")?;

    if args.list_fields {
        let format = args.common.format.unwrap_or_default();
        return list_fields(kind, format, writer);
    }

    let description = CriterionDescription {
        model_type: Some(args.model.clone()),
        field_name: args.field.clone(),
        nested_field: args.nested.clone(),
        value: args.value.clone(),
        filter_type: args.mode.clone(),
    };
    let criterion = FilterCriterion::from_description(&description)?;

    let workspace = Workspace::open(&args.common)?;
    let candidates = entities(&workspace.ledger, kind);
    let found = apply(&candidates, &criterion);

    match workspace.format {
        OutputFormat::Json => {
            let rows: Vec<Found<'_>> = found
                .iter()
                .map(|entity| Found {
                    model_type: kind.to_string(),
                    unique_code: entity.unique_code(),
                    name: entity.name(),
                })
                .collect();
            serde_json::to_writer_pretty(&mut *writer, &rows)?;
            writeln!(writer)?;
        }
        OutputFormat::Text => {
            let rows: Vec<Vec<String>> = found
                .iter()
                .map(|e| vec![e.unique_code().to_string(), e.name().to_string()])
                .collect();
            write!(writer, "{}", render_table(&["code", "name"], &rows, &[]))?;
            writeln!(
                writer,
                "{} of {} {kind} entries match {criterion}",
                found.len(),
                candidates.len()
            )?;
        }
    }
    Ok(())
}

fn entities(store: &LedgerStore, kind: EntityKind) -> Vec<Entity> {
    match kind {
        EntityKind::Item => store.items().iter().cloned().map(Entity::Item).collect(),
        EntityKind::Group => store.groups().iter().cloned().map(Entity::Group).collect(),
        EntityKind::Unit => store.units().iter().cloned().map(Entity::Unit).collect(),
        EntityKind::Recipe => store.recipes().iter().cloned().map(Entity::Recipe).collect(),
    }
}

fn list_fields<W: Write>(kind: EntityKind, format: OutputFormat, writer: &mut W) -> Result<()> {
    let catalogue = supported_fields(kind);
    match format {
        OutputFormat::Json => {
            let doc = serde_json::json!({
                "model_type": kind.to_string(),
                "basic_fields": catalogue.basic,
                "specific_fields": catalogue.specific,
                "nested_examples": catalogue.nested_examples,
            });
            serde_json::to_writer_pretty(&mut *writer, &doc)?;
            writeln!(writer)?;
        }
        OutputFormat::Text => {
            writeln!(writer, "Fields for {kind}")?;
            writeln!(writer, "  basic:    {}", catalogue.basic.join(", "))?;
            writeln!(writer, "  specific: {}", catalogue.specific.join(", "))?;
            writeln!(writer, "  nested:   {}", catalogue.nested_examples.join(", "))?;
        }
    }
    Ok(())
}
