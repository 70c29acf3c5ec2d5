use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::rules::RuleConfig;
use crate::settings::{load_settings, shellexpand_path};

pub fn list(rules: Option<&str>) -> Result<()> {
    let config = match rules {
        Some(path) => RuleConfig::new(shellexpand_path(path)),
        None => load_settings().rule_config(),
    };
    let store = config.load()?;

    let mut table = Table::new();
    table.set_header(vec!["Match", "Rule", "Category"]);
    for (item, category) in &store.exact {
        table.add_row(vec![Cell::new("exact"), Cell::new(item), Cell::new(category)]);
    }
    for (pattern, category) in &store.patterns {
        table.add_row(vec![Cell::new("pattern"), Cell::new(pattern), Cell::new(category)]);
    }
    println!("Rules ({})\n{table}", config.path().display());
    Ok(())
}
