use std::collections::BTreeSet;

use crate::dataset::{Table, COLUMN_NAMES};
use crate::dates::YearMonth;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Validation {
    pub missing_columns: Vec<String>,
    pub missing_months: Vec<YearMonth>,
    /// Set when missing columns stopped validation before the month check.
    pub aborted: bool,
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        !self.aborted && self.missing_months.is_empty()
    }
}

/// Check the schema and that every month between the first and last entry
/// has at least one transaction.
///
/// Running balances are not checked: same-day transactions often leave the
/// balance blank except on the last row of the day.
pub fn validate(table: &Table, continue_on_error: bool) -> Validation {
    let missing_columns: Vec<String> = COLUMN_NAMES
        .iter()
        .filter(|c| !table.has_column(c))
        .map(|c| c.to_string())
        .collect();
    if !missing_columns.is_empty() && !continue_on_error {
        return Validation {
            missing_columns,
            missing_months: Vec::new(),
            aborted: true,
        };
    }

    let actual: BTreeSet<YearMonth> = match table.column_index("Date") {
        Some(col) => table.dates(col).map(YearMonth::of).collect(),
        None => BTreeSet::new(),
    };
    let missing_months = match (actual.first(), actual.last()) {
        (Some(&first), Some(&last)) => YearMonth::range(first, last)
            .into_iter()
            .filter(|m| !actual.contains(m))
            .collect(),
        _ => Vec::new(),
    };

    Validation {
        missing_columns,
        missing_months,
        aborted: false,
    }
}
