use std::path::Path;

use crate::dataset::{placeholder_name, Cell, Table};
use crate::error::{BankError, Outcome, Result, Warning};
use crate::header::{detect_header, table_from_grid};
use crate::normalizer::normalize;

#[derive(Debug, Clone)]
pub struct ReadOptions {
    /// Only read these sheets, in this order.
    pub sheet_names: Option<Vec<String>>,
    /// Only read the first N sheets (applied after `sheet_names`).
    pub sheet_count: Option<usize>,
    /// Downgrade unparsable date columns to warnings.
    pub continue_on_error: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            sheet_names: None,
            sheet_count: None,
            continue_on_error: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SourceKind {
    Csv,
    Spreadsheet,
}

impl SourceKind {
    pub fn for_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        if ext == "csv" {
            Ok(Self::Csv)
        } else if ext.starts_with("xls") {
            Ok(Self::Spreadsheet)
        } else {
            Err(BankError::UnsupportedFileType(path.display().to_string()))
        }
    }
}

/// Read and normalize every file in `paths`, concatenated in order.
/// An empty table is a valid result.
pub fn read<P: AsRef<Path>>(paths: &[P], options: &ReadOptions) -> Result<Outcome<Table>> {
    let mut table = Table::default();
    let mut warnings = Vec::new();
    for path in paths {
        let path = path.as_ref();
        let outcome = match SourceKind::for_path(path)? {
            SourceKind::Csv => {
                tracing::info!("importing from csv file {}", path.display());
                read_csv(path, options.continue_on_error)?
            }
            SourceKind::Spreadsheet => {
                tracing::info!("importing from excel file {}", path.display());
                read_spreadsheet(path, options)?
            }
        };
        table.concat(outcome.value);
        warnings.extend(outcome.warnings);
    }
    Ok(Outcome::with_warnings(table, warnings))
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

pub fn read_csv(path: &Path, continue_on_error: bool) -> Result<Outcome<Table>> {
    normalize(parse_csv(path)?, continue_on_error)
}

/// Parse a CSV file as-is: first non-blank record is the header, blank
/// records are skipped and whitespace around fields is dropped.
pub fn parse_csv(path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(std::io::BufReader::new(file));

    let mut table: Option<Table> = None;
    for result in rdr.records() {
        let record = result?;
        if record.iter().all(|f| f.is_empty()) {
            continue;
        }
        match table.as_mut() {
            None => {
                let columns = record
                    .iter()
                    .enumerate()
                    .map(|(i, name)| {
                        if name.is_empty() {
                            placeholder_name(i)
                        } else {
                            name.to_string()
                        }
                    })
                    .collect();
                table = Some(Table::new(columns));
            }
            Some(t) => {
                let width = t.columns().len();
                for i in width..record.len() {
                    t.add_column(&placeholder_name(i));
                }
                t.push_row(record.iter().map(Cell::text).collect());
            }
        }
    }
    Ok(table.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Spreadsheets
// ---------------------------------------------------------------------------

/// Minimal view of a workbook: its sheet names and the raw cells of a sheet.
pub trait Workbook {
    fn sheet_names(&self) -> Vec<String>;

    /// Raw rows of `name`; `BankError::SheetNotFound` when there is no such sheet.
    fn sheet_grid(&mut self, name: &str) -> Result<Vec<Vec<Cell>>>;
}

/// Read the selected sheets of a workbook, detecting each header row and
/// normalizing each sheet before appending it.
pub fn read_workbook<W: Workbook>(workbook: &mut W, options: &ReadOptions) -> Result<Outcome<Table>> {
    let mut names = options
        .sheet_names
        .clone()
        .unwrap_or_else(|| workbook.sheet_names());
    if let Some(count) = options.sheet_count {
        names.truncate(count);
    }

    let mut table = Table::default();
    let mut warnings = Vec::new();
    for sheet in &names {
        tracing::info!("Reading sheet {sheet}...");
        let mut grid: Option<Vec<Vec<Cell>>> = None;
        let scan = detect_header(sheet, 0, |skip| {
            if grid.is_none() {
                grid = Some(workbook.sheet_grid(sheet)?);
            }
            Ok(table_from_grid(grid.as_deref().unwrap_or_default(), skip))
        });
        let scan = match scan {
            Ok(scan) => scan,
            Err(BankError::SheetNotFound(_)) => {
                warnings.push(Warning::SheetNotFound {
                    sheet: sheet.clone(),
                });
                continue;
            }
            Err(e) => return Err(e),
        };
        warnings.extend(scan.warning);

        let normalized = normalize(scan.table, options.continue_on_error)?;
        tracing::debug!(sheet = %sheet, rows = normalized.value.len(), "sheet cleaned");
        table.concat(normalized.value);
        warnings.extend(normalized.warnings);
    }
    Ok(Outcome::with_warnings(table, warnings))
}

#[cfg(feature = "excel")]
impl<RS: std::io::Read + std::io::Seek> Workbook for calamine::Sheets<RS> {
    fn sheet_names(&self) -> Vec<String> {
        calamine::Reader::sheet_names(self)
    }

    fn sheet_grid(&mut self, name: &str) -> Result<Vec<Vec<Cell>>> {
        use calamine::Reader;

        if !Reader::sheet_names(self).iter().any(|n| n == name) {
            return Err(BankError::SheetNotFound(name.to_string()));
        }
        let range = self
            .worksheet_range(name)
            .map_err(|e| BankError::Excel(e.to_string()))?;
        Ok(range
            .rows()
            .map(|row| row.iter().map(cell_from_data).collect())
            .collect())
    }
}

#[cfg(feature = "excel")]
fn cell_from_data(data: &calamine::Data) -> Cell {
    use calamine::Data;

    match data {
        Data::Empty | Data::Error(_) => Cell::Missing,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::text(s),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => crate::dates::excel_serial_to_date(dt.as_f64())
            .map_or(Cell::Number(dt.as_f64()), Cell::Date),
    }
}

#[cfg(feature = "excel")]
pub fn read_spreadsheet(path: &Path, options: &ReadOptions) -> Result<Outcome<Table>> {
    let mut workbook = calamine::open_workbook_auto(path)
        .map_err(|e| BankError::Excel(format!("Failed to open {}: {e}", path.display())))?;
    read_workbook(&mut workbook, options)
}

#[cfg(not(feature = "excel"))]
pub fn read_spreadsheet(path: &Path, _options: &ReadOptions) -> Result<Outcome<Table>> {
    Err(BankError::Other(format!(
        "{}: built without spreadsheet support (enable the `excel` feature)",
        path.display()
    )))
}
