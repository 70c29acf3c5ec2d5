use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::dataset::Table;
use crate::dates::parse_date;
use crate::error::{BankError, Outcome, Result, Warning};
use crate::rules::RuleStore;

pub const OTHER: &str = "Other";

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub name: String,
    pub total: f64,
}

/// A description no rule turned into a category.
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownItem {
    pub name: String,
    pub total: f64,
    /// One transaction amount, shown when asking for a category.
    pub sample_amount: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub known: Vec<CategoryTotal>,
    pub other: f64,
    pub unknown: Vec<UnknownItem>,
}

fn parse_bound(raw: &str) -> Result<NaiveDate> {
    parse_date(raw).ok_or_else(|| BankError::InvalidDate(raw.to_string()))
}

fn column(table: &Table, name: &str) -> Result<usize> {
    table
        .column_index(name)
        .ok_or_else(|| BankError::Other(format!("statement has no {name} column")))
}

/// Keep rows dated within `[from, to]`. Rows without a parsed date cannot be
/// placed in the range and are left out.
pub fn filter_dates(table: &Table, from: Option<&str>, to: Option<&str>) -> Result<Outcome<Table>> {
    if from.is_none() && to.is_none() {
        return Ok(Outcome::new(table.clone()));
    }
    let from = from.map(parse_bound).transpose()?;
    let to = to.map(parse_bound).transpose()?;
    let date_col = table.column_index("Date");

    let mut filtered = table.clone();
    let mut undated = 0usize;
    filtered.retain_rows(|row| {
        let Some(date) = date_col.and_then(|c| row[c].as_date()) else {
            undated += 1;
            return false;
        };
        from.map_or(true, |f| date >= f) && to.map_or(true, |t| date <= t)
    });

    let mut warnings = Vec::new();
    if undated > 0 {
        warnings.push(Warning::UndatedRowsExcluded { count: undated });
    }
    Ok(Outcome::with_warnings(filtered, warnings))
}

/// Total `Amount` per category. Descriptions with no rule are rolled into
/// `Other` and listed in `unknown`. Rows without a description are left out.
pub fn summarize(
    table: &Table,
    store: &RuleStore,
    date_from: Option<&str>,
    date_to: Option<&str>,
) -> Result<Outcome<Summary>> {
    let filtered = filter_dates(table, date_from, date_to)?;
    let table = &filtered.value;
    let desc_col = column(table, "Description")?;
    let amount_col = column(table, "Amount")?;
    let matcher = store.matcher();

    // label -> (total, first amount seen)
    let mut groups: BTreeMap<String, (f64, Option<f64>)> = BTreeMap::new();
    let mut undescribed = 0usize;
    for row in table.rows() {
        let description = row[desc_col].encode();
        if description.trim().is_empty() {
            undescribed += 1;
            continue;
        }
        let label = matcher
            .categorize(&description)
            .map(str::to_string)
            .unwrap_or(description);
        let amount = row[amount_col].as_number();
        let entry = groups.entry(label).or_insert((0.0, None));
        entry.0 += amount.unwrap_or(0.0);
        if entry.1.is_none() {
            entry.1 = amount;
        }
    }

    let mut known = Vec::new();
    let mut unknown = Vec::new();
    for (label, (total, sample_amount)) in groups {
        if store.is_category(&label) {
            known.push(CategoryTotal { name: label, total });
        } else {
            unknown.push(UnknownItem {
                name: label,
                total,
                sample_amount,
            });
        }
    }
    let other = unknown.iter().fold(0.0, |acc, u| acc + u.total);

    let mut warnings = filtered.warnings;
    if undescribed > 0 {
        warnings.push(Warning::UndescribedRowsExcluded { count: undescribed });
    }
    Ok(Outcome::with_warnings(
        Summary {
            known,
            other,
            unknown,
        },
        warnings,
    ))
}

impl Summary {
    /// Known categories followed by `Other`.
    pub fn lines(&self) -> Vec<(&str, f64)> {
        self.known
            .iter()
            .map(|c| (c.name.as_str(), c.total))
            .chain(std::iter::once((OTHER, self.other)))
            .collect()
    }
}
