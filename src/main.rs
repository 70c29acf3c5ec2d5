mod categorizer;
mod cli;
mod dataset;
mod dates;
mod error;
mod fmt;
mod header;
mod ledger;
mod normalizer;
mod reader;
mod reviewer;
mod rules;
mod settings;
mod validator;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::import::ImportArgs;
use cli::outgoings::OutgoingsArgs;
use cli::{Cli, Commands, RulesCommands};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Import {
            files,
            output,
            sheet_names,
            sheet_count,
            unique,
            strict,
        } => cli::import::run(ImportArgs {
            files,
            output,
            sheet_names,
            sheet_count,
            unique,
            strict,
        }),
        Commands::Show {
            file,
            date_from,
            date_to,
            date_only,
            output,
        } => cli::show::run(
            file,
            date_from.as_deref(),
            date_to.as_deref(),
            date_only,
            output.as_deref(),
        ),
        Commands::Outgoings {
            file,
            date_from,
            date_to,
            show_unknown,
            add_categories,
            rules,
        } => cli::outgoings::run(OutgoingsArgs {
            file,
            date_from,
            date_to,
            show_unknown,
            add_categories,
            rules,
        }),
        Commands::Validate {
            files,
            continue_on_error,
        } => cli::validate::run(files, continue_on_error),
        Commands::Rules { command } => match command {
            RulesCommands::List { rules } => cli::rules::list(rules.as_deref()),
        },
        Commands::Config { rules_file, ledger } => cli::config::run(rules_file, ledger),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
