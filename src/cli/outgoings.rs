use std::path::Path;

use colored::Colorize;

use crate::categorizer::summarize;
use crate::cli::print_warnings;
use crate::error::Result;
use crate::fmt::amount;
use crate::reader::read_csv;
use crate::reviewer::{learn, stdin_prompt};
use crate::rules::RuleConfig;
use crate::settings::{load_settings, shellexpand_path};

pub struct OutgoingsArgs {
    pub file: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub show_unknown: bool,
    pub add_categories: bool,
    pub rules: Option<String>,
}

pub fn run(args: OutgoingsArgs) -> Result<()> {
    let settings = load_settings();
    let file = settings.files_or_ledger(args.file.into_iter().collect())?.remove(0);
    let config = match &args.rules {
        Some(path) => RuleConfig::new(shellexpand_path(path)),
        None => settings.rule_config(),
    };
    let mut store = config.load()?;

    let statement = read_csv(Path::new(&file), true)?;
    print_warnings(&statement.warnings);
    let summary = summarize(
        &statement.value,
        &store,
        args.date_from.as_deref(),
        args.date_to.as_deref(),
    )?;
    print_warnings(&summary.warnings);
    let summary = summary.value;

    println!("{}", "Total outgoings:".bold());
    let lines = summary.lines();
    let width = lines.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    for (label, total) in lines {
        println!("{label:<width$} {:>12}", amount(total));
    }

    if args.show_unknown && !summary.unknown.is_empty() {
        println!("The following items do not have a category:");
        let names: Vec<&str> = summary.unknown.iter().map(|u| u.name.as_str()).collect();
        println!("{}", names.join(", "));
    }

    if args.add_categories && !summary.unknown.is_empty() {
        let mut prompt = stdin_prompt();
        let outcome = learn(&summary.unknown, &mut store, &mut prompt)?;
        config.save(&store)?;
        println!(
            "{} item rules and {} pattern rules saved to {}",
            outcome.exact_added,
            outcome.patterns_added,
            config.path().display()
        );
    }
    Ok(())
}
