use crate::dataset::{is_placeholder, placeholder_name, Cell, Table};
use crate::error::{Result, Warning};

/// Leading rows tried before giving up on finding a header row.
pub const MAX_HEADER_SKIP: usize = 10;

pub struct HeaderScan {
    pub table: Table,
    pub skip: usize,
    pub gave_up: bool,
    pub warning: Option<Warning>,
}

/// Build a table from a raw sheet, using row `skip` as the header.
pub fn table_from_grid(grid: &[Vec<Cell>], skip: usize) -> Table {
    let body = grid.get(skip..).unwrap_or(&[]);
    let Some((header, data)) = body.split_first() else {
        return Table::default();
    };
    let width = body.iter().map(Vec::len).max().unwrap_or(0);
    let columns = (0..width)
        .map(|i| {
            let name = header
                .get(i)
                .map(|cell| cell.encode().trim().to_string())
                .unwrap_or_default();
            if name.is_empty() {
                placeholder_name(i)
            } else {
                name
            }
        })
        .collect();
    let rows = data
        .iter()
        .filter(|row| !row.iter().all(Cell::is_missing))
        .cloned()
        .collect();
    Table::from_rows(columns, rows)
}

fn header_resolved(table: &Table) -> bool {
    let total = table.columns().len();
    let unnamed = table.columns().iter().filter(|c| is_placeholder(c)).count();
    total > 0 && unnamed * 2 < total
}

/// Find how many leading rows of `sheet` to skip so that fewer than half of
/// the column names are placeholders. `parse(skip)` produces the table for a
/// given skip; its errors (a missing sheet, typically) are returned as-is.
///
/// After `MAX_HEADER_SKIP` attempts the sheet is parsed again unskipped and
/// returned with a warning, leaving placeholder columns to the normalizer.
pub fn detect_header<F>(sheet: &str, start: usize, mut parse: F) -> Result<HeaderScan>
where
    F: FnMut(usize) -> Result<Table>,
{
    let mut skip = start;
    loop {
        let table = parse(skip)?;
        if header_resolved(&table) {
            tracing::debug!(sheet, skip, "header row found");
            return Ok(HeaderScan {
                table,
                skip,
                gave_up: false,
                warning: None,
            });
        }
        skip += 1;
        if skip > MAX_HEADER_SKIP {
            tracing::debug!(sheet, "no header row within {MAX_HEADER_SKIP} rows");
            return Ok(HeaderScan {
                table: parse(0)?,
                skip: 0,
                gave_up: true,
                warning: Some(Warning::HeaderNotFound {
                    sheet: sheet.to_string(),
                }),
            });
        }
    }
}
