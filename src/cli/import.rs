use std::path::Path;

use crate::cli::{print_warnings, render};
use crate::error::Result;
use crate::ledger::{self, WriteOptions};
use crate::reader::{self, ReadOptions, SourceKind};

pub struct ImportArgs {
    pub files: Vec<String>,
    pub output: Option<String>,
    pub sheet_names: Option<Vec<String>>,
    pub sheet_count: Option<usize>,
    pub unique: bool,
    pub strict: bool,
}

pub fn run(args: ImportArgs) -> Result<()> {
    for file in &args.files {
        match SourceKind::for_path(Path::new(file))? {
            SourceKind::Csv => println!("importing from csv file {file}..."),
            SourceKind::Spreadsheet => println!("importing from spreadsheet {file}..."),
        }
    }

    let options = ReadOptions {
        sheet_names: args.sheet_names,
        sheet_count: args.sheet_count,
        continue_on_error: !args.strict,
    };
    let statement = reader::read(&args.files, &options)?;
    print_warnings(&statement.warnings);

    if statement.value.is_empty() {
        println!("Nothing to import.");
        return Ok(());
    }

    match args.output {
        Some(output) => {
            let options = WriteOptions {
                remove_duplicates: args.unique,
                ..WriteOptions::default()
            };
            let written = ledger::write(&statement.value, Path::new(&output), &options)?;
            print_warnings(&written.warnings);
            let summary = written.value;
            if summary.created {
                println!("Created {output} with {} rows", summary.added);
            } else {
                println!("{} rows added to {output} ({} existing)", summary.added, summary.existing);
            }
            if summary.duplicates_removed > 0 {
                println!("{} duplicate rows removed", summary.duplicates_removed);
            }
        }
        None => println!("{}", render(&statement.value)),
    }
    Ok(())
}
