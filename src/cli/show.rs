use std::path::Path;

use crate::categorizer::filter_dates;
use crate::cli::{print_warnings, render};
use crate::dataset::COLUMN_NAMES;
use crate::error::Result;
use crate::ledger::{self, WriteOptions};
use crate::reader::read_csv;
use crate::settings::load_settings;

pub fn run(
    file: Option<String>,
    date_from: Option<&str>,
    date_to: Option<&str>,
    date_only: bool,
    output: Option<&str>,
) -> Result<()> {
    let file = load_settings().files_or_ledger(file.into_iter().collect())?.remove(0);
    println!("showing statement for {file}");

    let statement = read_csv(Path::new(&file), true)?;
    print_warnings(&statement.warnings);
    let table = statement.value;

    if date_only {
        let dates: Vec<_> = match table.column_index("Date") {
            Some(col) => table.dates(col).collect(),
            None => Vec::new(),
        };
        match (dates.iter().min(), dates.iter().max()) {
            (Some(first), Some(last)) => {
                println!("date range:");
                println!("{}", first.format("%d %B %Y"));
                println!("{}", last.format("%d %B %Y"));
            }
            _ => println!("No dated rows."),
        }
        return Ok(());
    }

    let filtered = filter_dates(&table, date_from, date_to)?;
    print_warnings(&filtered.warnings);
    let mut table = filtered.value;

    if let Some(output) = output {
        let written = ledger::write(&table, Path::new(output), &WriteOptions::default())?;
        print_warnings(&written.warnings);
        println!("{} rows written to {output}", written.value.added);
        return Ok(());
    }

    table.retain_columns(|c| COLUMN_NAMES.contains(&c));
    if let Some(col) = table.column_index("Date") {
        table.sort_by_date(col);
    }
    let order = table.canonical_order();
    table.reorder_columns(&order);
    println!("{}", render(&table));
    Ok(())
}
