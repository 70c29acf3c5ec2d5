pub mod config;
pub mod import;
pub mod outgoings;
pub mod rules;
pub mod show;
pub mod validate;

use clap::{Parser, Subcommand};
use colored::Colorize;
use comfy_table::{Cell as TableCell, CellAlignment, Table as DisplayTable};

use crate::dataset::{Cell, Table};
use crate::error::Warning;
use crate::fmt::amount;

#[derive(Parser)]
#[command(name = "bank", version, about = "Bank account statement manager.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read and reformat bank statements (CSV or spreadsheet).
    Import {
        /// Statement files to read
        #[arg(required = true)]
        files: Vec<String>,
        /// Ledger to append to. Prints the statement if not given.
        #[arg(short, long)]
        output: Option<String>,
        /// Spreadsheet sheets to read
        #[arg(short = 'n', long = "sheet-names", num_args = 1..)]
        sheet_names: Option<Vec<String>>,
        /// Number of sheets to read from each workbook
        #[arg(long)]
        sheet_count: Option<usize>,
        /// Drop rows already present in the ledger
        #[arg(long)]
        unique: bool,
        /// Fail on unparsable dates instead of warning
        #[arg(long)]
        strict: bool,
    },
    /// Show a ledger for a date range.
    Show {
        /// Ledger file (default: configured ledger)
        file: Option<String>,
        /// Show records on or after this date
        #[arg(short = 'f', long = "from")]
        date_from: Option<String>,
        /// Show records on or before this date
        #[arg(short = 't', long = "to")]
        date_to: Option<String>,
        /// Only show the first and last date
        #[arg(long)]
        date_only: bool,
        /// Write the selected rows to this ledger instead
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Total outgoings by category.
    Outgoings {
        /// Ledger file (default: configured ledger)
        file: Option<String>,
        #[arg(short = 'f', long = "from")]
        date_from: Option<String>,
        #[arg(short = 't', long = "to")]
        date_to: Option<String>,
        /// List items that have no category
        #[arg(long)]
        show_unknown: bool,
        /// Ask for categories for unknown items
        #[arg(long)]
        add_categories: bool,
        /// Rule store to use (default: configured rules file)
        #[arg(long)]
        rules: Option<String>,
    },
    /// Check ledgers for missing columns and months.
    Validate {
        /// Ledger files (default: configured ledger)
        files: Vec<String>,
        /// Keep checking after missing columns
        #[arg(long)]
        continue_on_error: bool,
    },
    /// Inspect category rules.
    Rules {
        #[command(subcommand)]
        command: RulesCommands,
    },
    /// Show or change settings.
    Config {
        /// Rule store location
        #[arg(long)]
        rules_file: Option<String>,
        /// Default ledger for commands given no file
        #[arg(long)]
        ledger: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum RulesCommands {
    /// List exact and pattern rules.
    List {
        #[arg(long)]
        rules: Option<String>,
    },
}

pub(crate) fn print_warnings(warnings: &[Warning]) {
    for warning in warnings {
        eprintln!("{} {warning}", "WARNING:".yellow().bold());
    }
}

fn display_cell(cell: &Cell) -> TableCell {
    match cell {
        Cell::Number(n) => TableCell::new(amount(*n)).set_alignment(CellAlignment::Right),
        Cell::Date(d) => TableCell::new(d.format("%Y-%m-%d")),
        Cell::Text(s) => TableCell::new(s),
        Cell::Missing => TableCell::new(""),
    }
}

/// Render a statement as a terminal table.
pub(crate) fn render(table: &Table) -> DisplayTable {
    let mut out = DisplayTable::new();
    out.set_header(table.columns().to_vec());
    for row in table.rows() {
        out.add_row(row.iter().map(display_cell).collect::<Vec<_>>());
    }
    out
}
