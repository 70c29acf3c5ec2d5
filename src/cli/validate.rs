use std::path::Path;

use colored::Colorize;

use crate::cli::print_warnings;
use crate::error::{BankError, Result};
use crate::reader::read_csv;
use crate::settings::load_settings;
use crate::validator::validate;

pub fn run(files: Vec<String>, continue_on_error: bool) -> Result<()> {
    let files = load_settings().files_or_ledger(files)?;
    let mut failed = 0;

    for file in &files {
        let statement = read_csv(Path::new(file), true)?;
        print_warnings(&statement.warnings);
        let report = validate(&statement.value, continue_on_error);

        if !report.missing_columns.is_empty() {
            eprintln!(
                "{} {file} does not have the following columns: {}",
                "ERROR:".red().bold(),
                report.missing_columns.join(", ")
            );
        }
        for month in &report.missing_months {
            println!("No entries found in {month}");
        }

        if report.is_valid() {
            println!("{file}: {}", "OK".green());
        } else {
            failed += 1;
            println!("{file}: {}", "FAILED".red());
        }
    }

    if failed > 0 {
        return Err(BankError::Other(format!("{failed} of {} files failed validation", files.len())));
    }
    Ok(())
}
