use std::fmt;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BankError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Spreadsheet error: {0}")]
    Excel(String),

    #[error("import file type {0} not supported")]
    UnsupportedFileType(String),

    #[error("sheet not found: {0}")]
    SheetNotFound(String),

    #[error("Could not parse date column: {0}")]
    UnparsableDates(String),

    #[error(
        "column names do not match\nExisting columns: {}\nNew columns: {}",
        existing.join(", "),
        incoming.join(", ")
    )]
    SchemaMismatch {
        existing: Vec<String>,
        incoming: Vec<String>,
    },

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, BankError>;

/// Non-fatal problems found while reading, normalizing or summarizing.
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    HeaderNotFound { sheet: String },
    SheetNotFound { sheet: String },
    UnparsedDates { value: String },
    MissingDateColumn,
    UnrecognisedColumn { column: String },
    SchemaMismatch { existing: Vec<String>, incoming: Vec<String> },
    UndatedRowsExcluded { count: usize },
    UndescribedRowsExcluded { count: usize },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HeaderNotFound { sheet } => {
                write!(f, "no header row found in sheet {sheet}, reading it unskipped")
            }
            Self::SheetNotFound { sheet } => write!(f, "sheet not found: {sheet}"),
            Self::UnparsedDates { value } => {
                write!(f, "Could not parse date column (bad value {value:?})")
            }
            Self::MissingDateColumn => write!(f, "Could not parse date column. No Date column"),
            Self::UnrecognisedColumn { column } => write!(f, "unrecognised column: {column}"),
            Self::SchemaMismatch { existing, incoming } => write!(
                f,
                "column names do not match\nExisting columns: {}\nNew columns: {}",
                existing.join(", "),
                incoming.join(", ")
            ),
            Self::UndatedRowsExcluded { count } => {
                write!(f, "{count} row(s) without a date left out of the date range")
            }
            Self::UndescribedRowsExcluded { count } => {
                write!(f, "{count} row(s) without a description left out of the totals")
            }
        }
    }
}

/// A value together with the warnings raised while producing it.
#[derive(Debug, Clone)]
pub struct Outcome<T> {
    pub value: T,
    pub warnings: Vec<Warning>,
}

impl<T> Outcome<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(value: T, warnings: Vec<Warning>) -> Self {
        Self { value, warnings }
    }
}
