use std::path::Path;

use crate::dataset::Table;
use crate::error::{BankError, Outcome, Result, Warning};
use crate::reader::read_csv;

#[derive(Debug, Clone)]
pub struct WriteOptions {
    pub remove_duplicates: bool,
    pub check_columns: bool,
    pub continue_on_error: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            remove_duplicates: false,
            check_columns: true,
            continue_on_error: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WriteSummary {
    pub created: bool,
    pub existing: usize,
    pub added: usize,
    pub duplicates_removed: usize,
}

fn column_key(table: &Table) -> Vec<String> {
    let mut key: Vec<String> = table.columns().iter().map(|c| c.to_lowercase()).collect();
    key.sort();
    key
}

/// Write `table` to the ledger at `path`, merging with whatever is there.
///
/// The existing ledger is read back through the normal CSV path. Differing
/// column sets abort the write unless `continue_on_error` is set.
pub fn write(table: &Table, path: &Path, options: &WriteOptions) -> Result<Outcome<WriteSummary>> {
    if !path.exists() {
        save(table, path)?;
        return Ok(Outcome::new(WriteSummary {
            created: true,
            existing: 0,
            added: table.len(),
            duplicates_removed: 0,
        }));
    }

    let existing = read_csv(path, true)?;
    let mut warnings = existing.warnings;
    let mut merged = existing.value;

    if options.check_columns && column_key(&merged) != column_key(table) {
        let existing_cols = merged.columns().to_vec();
        let incoming_cols = table.columns().to_vec();
        if !options.continue_on_error {
            return Err(BankError::SchemaMismatch {
                existing: existing_cols,
                incoming: incoming_cols,
            });
        }
        warnings.push(Warning::SchemaMismatch {
            existing: existing_cols,
            incoming: incoming_cols,
        });
    }

    let existing_rows = merged.len();
    merged.concat(table.clone());
    let duplicates_removed = if options.remove_duplicates {
        merged.dedup_rows()
    } else {
        0
    };
    save(&merged, path)?;
    tracing::debug!(
        path = %path.display(),
        existing_rows,
        duplicates_removed,
        "ledger merged"
    );

    Ok(Outcome::with_warnings(
        WriteSummary {
            created: false,
            existing: existing_rows,
            added: table.len(),
            duplicates_removed,
        },
        warnings,
    ))
}

/// Overwrite `path` with `table`: canonical columns first, no index column.
pub fn save(table: &Table, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let order = table.canonical_order();
    let picks: Vec<usize> = order.iter().filter_map(|c| table.column_index(c)).collect();

    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_path(path)?;
    wtr.write_record(&order)?;
    for row in table.rows() {
        wtr.write_record(picks.iter().map(|&i| row[i].encode()))?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Cell;
    use chrono::NaiveDate;

    fn t(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn abc() -> Table {
        Table::from_rows(
            vec!["A".into(), "B".into(), "C".into()],
            vec![vec![t("1"), t("2"), t("3")]],
        )
    }

    fn statement() -> Table {
        let d = |y, m, day| Cell::Date(NaiveDate::from_ymd_opt(y, m, day).unwrap());
        Table::from_rows(
            ["Date", "Type", "Description", "Amount", "Balance"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            vec![
                vec![d(2016, 1, 1), t("A"), t("Item 1"), Cell::Number(1.0), Cell::Number(1.0)],
                vec![d(2016, 1, 16), t("A"), t("Item 2"), Cell::Number(2.5), Cell::Number(3.5)],
                vec![d(2016, 3, 10), t("A"), t("Item 3"), Cell::Number(2.0), Cell::Number(5.5)],
                vec![d(2016, 11, 10), t("B"), t("Item 4"), Cell::Number(-2.0), Cell::Number(3.5)],
            ],
        )
    }

    fn read_file(path: &Path) -> String {
        std::fs::read_to_string(path).unwrap()
    }

    #[test]
    fn test_write_csv() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("test.csv");
        let summary = write(&abc(), &out, &WriteOptions::default()).unwrap().value;
        assert!(summary.created);
        assert_eq!(read_file(&out), "A,B,C\n1,2,3\n");
    }

    #[test]
    fn test_append_csv() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("test.csv");
        write(&abc(), &out, &WriteOptions::default()).unwrap();
        let summary = write(&abc(), &out, &WriteOptions::default()).unwrap().value;
        assert_eq!(summary.existing, 1);
        assert_eq!(summary.added, 1);
        assert_eq!(read_file(&out), "A,B,C\n1,2,3\n1,2,3\n");
    }

    #[test]
    fn test_append_csv_remove_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("test.csv");
        let options = WriteOptions {
            remove_duplicates: true,
            ..WriteOptions::default()
        };
        write(&abc(), &out, &options).unwrap();
        let summary = write(&abc(), &out, &options).unwrap().value;
        assert_eq!(summary.duplicates_removed, 1);
        assert_eq!(read_file(&out), "A,B,C\n1,2,3\n");
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("ledger.csv");
        write(&statement(), &out, &WriteOptions::default()).unwrap();
        let back = read_csv(&out, false).unwrap();
        assert!(back.warnings.is_empty());
        assert_eq!(back.value, statement());
    }

    #[test]
    fn test_deduplicated_append_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let once = dir.path().join("once.csv");
        let twice = dir.path().join("twice.csv");
        let options = WriteOptions {
            remove_duplicates: true,
            ..WriteOptions::default()
        };
        write(&statement(), &once, &options).unwrap();
        write(&statement(), &twice, &options).unwrap();
        write(&statement(), &twice, &options).unwrap();
        assert_eq!(read_file(&once), read_file(&twice));
    }

    #[test]
    fn test_schema_mismatch_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("ledger.csv");
        write(&statement(), &out, &WriteOptions::default()).unwrap();
        let before = read_file(&out);
        let err = write(&abc(), &out, &WriteOptions::default()).unwrap_err();
        assert!(matches!(err, BankError::SchemaMismatch { .. }));
        assert_eq!(read_file(&out), before);
    }

    #[test]
    fn test_schema_mismatch_continues_with_union() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("ledger.csv");
        write(&statement(), &out, &WriteOptions::default()).unwrap();
        let options = WriteOptions {
            continue_on_error: true,
            ..WriteOptions::default()
        };
        let result = write(&abc(), &out, &options).unwrap();
        assert!(result
            .warnings
            .iter()
            .any(|w| matches!(w, Warning::SchemaMismatch { .. })));
        let content = read_file(&out);
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("Date,Type,Description,Amount,Balance,A,B,C"));
        assert_eq!(lines.last(), Some(",,,,,1,2,3"));
    }

    #[test]
    fn test_column_check_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("test.csv");
        std::fs::write(&out, "a,b,c\n4,5,6\n").unwrap();
        write(&abc(), &out, &WriteOptions::default()).unwrap();
        assert_eq!(read_file(&out), "A,B,C\n4,5,6\n1,2,3\n");
    }
}
