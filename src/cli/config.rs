use crate::error::Result;
use crate::settings::{load_settings, save_settings};

pub fn run(rules_file: Option<String>, ledger: Option<String>) -> Result<()> {
    let mut settings = load_settings();

    if rules_file.is_none() && ledger.is_none() {
        println!("Rules file: {}", settings.rules_file);
        println!("Ledger:     {}", settings.ledger_file.as_deref().unwrap_or("(not set)"));
        return Ok(());
    }

    if let Some(path) = rules_file {
        settings.rules_file = path;
    }
    if let Some(path) = ledger {
        settings.ledger_file = Some(path);
    }
    save_settings(&settings)?;
    println!("Settings saved.");
    Ok(())
}
