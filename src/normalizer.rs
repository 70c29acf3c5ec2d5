use crate::dataset::{is_placeholder, Cell, Table, COLUMN_NAMES};
use crate::dates::{excel_serial_to_date, parse_date};
use crate::error::{BankError, Outcome, Result, Warning};

/// Source column names and the canonical names they become. Earlier entries
/// win when two sources would land on the same target.
pub const ALIASES: &[(&str, &str)] = &[
    ("Merchant", "Description"),
    ("Merchant/Description", "Description"),
    ("Balance (£)", "Balance"),
    ("Debit/Credit", "Amount"),
    ("Paid Out", "Amount"),
    ("Billing Amount", "Amount"),
    ("Transaction Date", "Date"),
];

pub const DEBIT_MARKER: &str = "D";
pub const CREDIT_MARKER: &str = "C";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnKind {
    Date,
    Text,
    Numeric,
}

pub fn column_kind(name: &str) -> Option<ColumnKind> {
    match name {
        "Date" | "Transaction Date" => Some(ColumnKind::Date),
        "Type" | "Description" | "Merchant" | "Merchant/Description" => Some(ColumnKind::Text),
        "Amount" | "Balance" | "Balance (£)" | "Debit/Credit" | "Paid Out" | "Paid In"
        | "Billing Amount" => Some(ColumnKind::Numeric),
        _ => None,
    }
}

/// Upper-case every letter that follows a non-letter, lower-case the rest.
pub fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_letter = false;
    for c in name.chars() {
        if c.is_alphabetic() {
            if prev_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_letter = true;
        } else {
            out.push(c);
            prev_letter = false;
        }
    }
    out
}

/// Lenient number parsing for statement cells: currency symbols, thousands
/// separators and parenthesised negatives are accepted.
pub fn parse_number(raw: &str) -> Option<f64> {
    let s: String = raw
        .chars()
        .filter(|c| !matches!(c, ',' | '"' | '$' | '£' | '€') && !c.is_whitespace())
        .collect();
    if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        return inner.parse::<f64>().ok().map(|v| -v);
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Bring a freshly parsed sheet onto the canonical schema.
///
/// With `continue_on_error` an unparsable `Date` column is left as text and
/// reported as a warning; without it the whole sheet fails.
pub fn normalize(mut table: Table, continue_on_error: bool) -> Result<Outcome<Table>> {
    let mut warnings = Vec::new();

    table.rename_columns(|name| title_case(name.trim()));
    apply_aliases(&mut table);
    coerce_columns(&mut table);
    resolve_debit_credit(&mut table);
    table.retain_columns(|name| !is_placeholder(name));
    fold_paid_in(&mut table);
    resolve_dates(&mut table, continue_on_error, &mut warnings)?;

    for name in table.columns() {
        if !COLUMN_NAMES.contains(&name.as_str()) {
            warnings.push(Warning::UnrecognisedColumn {
                column: name.clone(),
            });
        }
    }

    Ok(Outcome::with_warnings(table, warnings))
}

fn apply_aliases(table: &mut Table) {
    for (source, target) in ALIASES {
        if table.has_column(target) {
            continue;
        }
        if let Some(col) = table.column_index(source) {
            table.rename_column(col, target);
        }
    }
}

fn coerce_columns(table: &mut Table) {
    for col in 0..table.columns().len() {
        let kind = column_kind(&table.columns()[col]);
        for cell in table.column_cells_mut(col) {
            if let Cell::Text(s) = cell {
                let trimmed = s.trim();
                *cell = if trimmed.is_empty() {
                    Cell::Missing
                } else {
                    Cell::Text(trimmed.to_string())
                };
            }
            match kind {
                Some(ColumnKind::Numeric) => {
                    *cell = match &*cell {
                        Cell::Text(s) => parse_number(s).map_or(Cell::Missing, Cell::Number),
                        Cell::Number(n) => Cell::Number(*n),
                        _ => Cell::Missing,
                    };
                }
                Some(ColumnKind::Text) => {
                    if let Cell::Number(_) = cell {
                        *cell = Cell::Text(cell.encode());
                    }
                }
                _ => {}
            }
        }
    }
}

fn is_sign_indicator(table: &Table, col: usize) -> bool {
    let mut seen = false;
    for cell in table.column_cells(col) {
        match cell {
            Cell::Missing => {}
            Cell::Text(s) if s == DEBIT_MARKER || s == CREDIT_MARKER => seen = true,
            _ => return false,
        }
    }
    seen
}

// Content sniff rather than a name rule: exports disagree on which column
// carries the D/C marker.
fn resolve_debit_credit(table: &mut Table) {
    let Some(balance) = table.column_index("Balance") else {
        return;
    };
    let indicators: Vec<usize> = (0..table.columns().len())
        .filter(|&col| is_sign_indicator(table, col))
        .collect();
    for col in indicators {
        tracing::debug!(column = %table.columns()[col], "debit/credit indicator column");
        for row in 0..table.len() {
            if table.cell(row, col).as_text() != Some(DEBIT_MARKER) {
                continue;
            }
            if let Some(value) = table.cell(row, balance).as_number() {
                table.set_cell(row, balance, Cell::Number(-value));
            }
        }
    }
}

fn fold_paid_in(table: &mut Table) {
    let Some(paid_in) = table
        .columns()
        .iter()
        .position(|c| c.eq_ignore_ascii_case("Paid In"))
    else {
        return;
    };
    let amount = match table.column_index("Amount") {
        Some(col) => col,
        None => table.add_column("Amount"),
    };
    for row in 0..table.len() {
        if let Some(value) = table.cell(row, paid_in).as_number() {
            table.set_cell(row, amount, Cell::Number(-value));
        }
    }
    table.drop_column(paid_in);
}

fn to_date(cell: &Cell) -> Option<Cell> {
    match cell {
        Cell::Missing => Some(Cell::Missing),
        Cell::Date(d) => Some(Cell::Date(*d)),
        Cell::Text(s) => parse_date(s).map(Cell::Date),
        Cell::Number(n) => excel_serial_to_date(*n).map(Cell::Date),
    }
}

fn resolve_dates(
    table: &mut Table,
    continue_on_error: bool,
    warnings: &mut Vec<Warning>,
) -> Result<()> {
    let Some(col) = table.column_index("Date") else {
        warnings.push(Warning::MissingDateColumn);
        return Ok(());
    };

    let mut parsed = Vec::with_capacity(table.len());
    for cell in table.column_cells(col) {
        match to_date(cell) {
            Some(date) => parsed.push(date),
            None => {
                let value = cell.encode();
                if !continue_on_error {
                    return Err(BankError::UnparsableDates(format!("bad value {value:?}")));
                }
                warnings.push(Warning::UnparsedDates { value });
                return Ok(());
            }
        }
    }

    for (cell, date) in table.column_cells_mut(col).zip(parsed) {
        *cell = date;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn t(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn table(columns: &[&str], rows: Vec<Vec<Cell>>) -> Table {
        Table::from_rows(columns.iter().map(|c| c.to_string()).collect(), rows)
    }

    fn lenient(table: Table) -> Outcome<Table> {
        normalize(table, true).unwrap()
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("amount"), "Amount");
        assert_eq!(title_case("PAID IN"), "Paid In");
        assert_eq!(title_case("debit/credit"), "Debit/Credit");
        assert_eq!(title_case("balance (£)"), "Balance (£)");
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("1,234.56"), Some(1234.56));
        assert_eq!(parse_number("£12.50"), Some(12.5));
        assert_eq!(parse_number(" -42.50 "), Some(-42.5));
        assert_eq!(parse_number("(500.00)"), Some(-500.0));
        assert_eq!(parse_number("n/a"), None);
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn test_cleanup_column_names() {
        let dirty = table(&["Merchant", "Balance (£)", "Other  ", "Unnamed"], vec![]);
        let clean = lenient(dirty).value;
        assert_eq!(clean.columns(), &["Description", "Balance", "Other"]);
    }

    #[test]
    fn test_aliases_converge() {
        for (raw, canonical) in [
            ("Merchant", "Description"),
            ("Balance (£)", "Balance"),
            ("Paid out", "Amount"),
            ("Transaction Date", "Date"),
            ("billing amount", "Amount"),
        ] {
            let out = lenient(table(&[raw], vec![])).value;
            assert_eq!(out.columns(), &[canonical], "alias {raw}");
        }
    }

    #[test]
    fn test_earlier_alias_wins() {
        let out = lenient(table(&["Merchant/Description", "Merchant"], vec![])).value;
        assert_eq!(out.columns(), &["Merchant/Description", "Description"]);
    }

    #[test]
    fn test_alias_does_not_clobber_canonical() {
        let out = lenient(table(&["Description", "Merchant"], vec![])).value;
        assert_eq!(out.columns(), &["Description", "Merchant"]);
    }

    #[test]
    fn test_numeric_coercion_tolerates_junk() {
        let out = lenient(table(
            &["Amount", "Balance"],
            vec![
                vec![t(" £1,234.50 "), t("n/a")],
                vec![Cell::Number(3.0), Cell::Missing],
            ],
        ))
        .value;
        assert_eq!(out.rows()[0], vec![Cell::Number(1234.5), Cell::Missing]);
        assert_eq!(out.rows()[1], vec![Cell::Number(3.0), Cell::Missing]);
    }

    #[test]
    fn test_text_values_trimmed() {
        let out = lenient(table(&["Description", "Notes"], vec![vec![t("  Shop "), t("   ")]])).value;
        assert_eq!(out.rows()[0], vec![t("Shop"), Cell::Missing]);
    }

    #[test]
    fn test_set_balance_debit() {
        let out = lenient(table(
            &["a", "Balance", "c", "d"],
            vec![vec![t("1"), t("2"), t("D"), t("3")]],
        ))
        .value;
        assert_eq!(out.columns(), &["A", "Balance", "C", "D"]);
        assert_eq!(out.rows()[0], vec![t("1"), Cell::Number(-2.0), t("D"), t("3")]);
    }

    #[test]
    fn test_set_balance_only_debit_rows() {
        let out = lenient(table(
            &["Balance", "Flag"],
            vec![
                vec![t("2"), t("D")],
                vec![t("5"), t("C")],
                vec![t("7"), Cell::Missing],
                vec![t("9"), t("D")],
            ],
        ))
        .value;
        let balances: Vec<Cell> = out.column_cells(0).cloned().collect();
        assert_eq!(
            balances,
            vec![
                Cell::Number(-2.0),
                Cell::Number(5.0),
                Cell::Number(7.0),
                Cell::Number(-9.0)
            ]
        );
    }

    #[test]
    fn test_set_balance_from_unnamed_column() {
        let out = lenient(table(
            &["Date", "Description", "Balance", "Unnamed: 3"],
            vec![
                vec![t("1/1/16"), t("Shop"), t("10"), t("D")],
                vec![t("2/1/16"), t("Salary"), t("20"), t("C")],
            ],
        ))
        .value;
        assert_eq!(out.columns(), &["Date", "Description", "Balance"]);
        let balances: Vec<Cell> = out.column_cells(2).cloned().collect();
        assert_eq!(balances, vec![Cell::Number(-10.0), Cell::Number(20.0)]);
    }

    #[test]
    fn test_set_balance_debit_not_found() {
        let rows = vec![
            vec![t("1"), t("2"), Cell::Missing, t("3")],
            vec![t("1"), t("2"), t("D"), t("3")],
            vec![t("1"), t("2"), t("D"), t("3")],
            vec![t("1"), t("2"), t("E"), t("3")],
        ];
        let out = lenient(table(&["a", "Balance", "c", "d"], rows)).value;
        for row in out.rows() {
            assert_eq!(row[1], Cell::Number(2.0));
        }
    }

    #[test]
    fn test_paid_in_folds_into_amount() {
        let out = lenient(table(
            &["Description", "Paid out", "Paid in"],
            vec![
                vec![t("Shop"), t("10.00"), Cell::Missing],
                vec![t("Salary"), Cell::Missing, t("1,500.00")],
            ],
        ))
        .value;
        assert_eq!(out.columns(), &["Description", "Amount"]);
        assert_eq!(out.rows()[0][1], Cell::Number(10.0));
        assert_eq!(out.rows()[1][1], Cell::Number(-1500.0));
    }

    #[test]
    fn test_dates_parsed_day_first() {
        let out = lenient(table(&["Date"], vec![vec![t("10/3/16")], vec![Cell::Missing]])).value;
        assert_eq!(
            out.rows()[0][0],
            Cell::Date(NaiveDate::from_ymd_opt(2016, 3, 10).unwrap())
        );
        assert!(out.rows()[1][0].is_missing());
    }

    #[test]
    fn test_bad_dates_warn_when_continuing() {
        let out = lenient(table(&["Date"], vec![vec![t("1/1/16")], vec![t("soon")]]));
        assert_eq!(out.value.rows()[0][0], t("1/1/16"));
        assert_eq!(
            out.warnings,
            vec![Warning::UnparsedDates {
                value: "soon".to_string()
            }]
        );
    }

    #[test]
    fn test_out_of_range_serial_date_warns() {
        let out = lenient(table(&["Date"], vec![vec![Cell::Number(1e15)]]));
        assert_eq!(out.value.rows()[0][0], Cell::Number(1e15));
        assert_eq!(out.warnings.len(), 1);
        assert!(matches!(out.warnings[0], Warning::UnparsedDates { .. }));
    }

    #[test]
    fn test_bad_dates_fail_when_strict() {
        let result = normalize(table(&["Date"], vec![vec![t("soon")]]), false);
        assert!(matches!(result, Err(BankError::UnparsableDates(_))));
    }

    #[test]
    fn test_missing_date_column_is_a_warning() {
        let out = normalize(table(&["Amount"], vec![]), false).unwrap();
        assert_eq!(out.warnings, vec![Warning::MissingDateColumn]);
    }

    #[test]
    fn test_extra_columns_reported() {
        let out = lenient(table(&["Date", "Reference"], vec![]));
        assert_eq!(
            out.warnings,
            vec![Warning::UnrecognisedColumn {
                column: "Reference".to_string()
            }]
        );
    }
}
