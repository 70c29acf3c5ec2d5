use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::NaiveDate;

/// The canonical statement schema, in ledger order.
pub const COLUMN_NAMES: [&str; 5] = ["Date", "Type", "Description", "Amount", "Balance"];

/// Marker the parsers put in names of columns that had no header text.
pub const PLACEHOLDER: &str = "Unnamed";

pub fn placeholder_name(index: usize) -> String {
    format!("{PLACEHOLDER}: {index}")
}

pub fn is_placeholder(name: &str) -> bool {
    name.contains(PLACEHOLDER)
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Missing,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl Cell {
    /// Text cell from raw input; blank input is missing.
    pub fn text(raw: &str) -> Self {
        if raw.trim().is_empty() {
            Self::Missing
        } else {
            Self::Text(raw.to_string())
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Ledger encoding of the cell.
    pub fn encode(&self) -> String {
        match self {
            Self::Missing => String::new(),
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Rows of cells under named columns. Every row is as wide as `columns`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row);
        }
        table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Missing);
        self.rows.push(row);
    }

    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        &self.rows[row][col]
    }

    pub fn set_cell(&mut self, row: usize, col: usize, cell: Cell) {
        self.rows[row][col] = cell;
    }

    pub fn column_cells(&self, col: usize) -> impl Iterator<Item = &Cell> + '_ {
        self.rows.iter().map(move |r| &r[col])
    }

    pub fn column_cells_mut(&mut self, col: usize) -> impl Iterator<Item = &mut Cell> + '_ {
        self.rows.iter_mut().map(move |r| &mut r[col])
    }

    pub fn rename_columns(&mut self, mut f: impl FnMut(&str) -> String) {
        for name in &mut self.columns {
            *name = f(name);
        }
    }

    pub fn rename_column(&mut self, col: usize, name: &str) {
        self.columns[col] = name.to_string();
    }

    /// Append an all-missing column and return its index.
    pub fn add_column(&mut self, name: &str) -> usize {
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(Cell::Missing);
        }
        self.columns.len() - 1
    }

    pub fn drop_column(&mut self, col: usize) {
        self.columns.remove(col);
        for row in &mut self.rows {
            row.remove(col);
        }
    }

    pub fn retain_columns(&mut self, mut keep: impl FnMut(&str) -> bool) {
        let mut col = 0;
        while col < self.columns.len() {
            if keep(&self.columns[col]) {
                col += 1;
            } else {
                self.drop_column(col);
            }
        }
    }

    pub fn retain_rows(&mut self, mut keep: impl FnMut(&[Cell]) -> bool) {
        self.rows.retain(|row| keep(row));
    }

    /// Append `other` below `self`, taking the union of both column sets.
    pub fn concat(&mut self, other: Table) {
        let mapping: Vec<usize> = other
            .columns
            .iter()
            .map(|name| match self.column_index(name) {
                Some(idx) => idx,
                None => self.add_column(name),
            })
            .collect();
        for row in other.rows {
            let mut out = vec![Cell::Missing; self.columns.len()];
            for (cell, &idx) in row.into_iter().zip(&mapping) {
                out[idx] = cell;
            }
            self.rows.push(out);
        }
    }

    /// Remove rows whose encoding repeats an earlier row. Returns how many went.
    pub fn dedup_rows(&mut self) -> usize {
        let before = self.rows.len();
        let mut seen = HashSet::new();
        self.rows
            .retain(|row| seen.insert(row.iter().map(Cell::encode).collect::<Vec<_>>()));
        before - self.rows.len()
    }

    /// Canonical columns first in schema order, then the rest alphabetically.
    pub fn canonical_order(&self) -> Vec<String> {
        let mut order: Vec<String> = COLUMN_NAMES
            .iter()
            .filter(|c| self.has_column(c))
            .map(|c| c.to_string())
            .collect();
        let mut extra: Vec<String> = self
            .columns
            .iter()
            .filter(|c| !COLUMN_NAMES.contains(&c.as_str()))
            .cloned()
            .collect();
        extra.sort();
        order.extend(extra);
        order
    }

    /// Rearrange columns to `order`. Names not in the table are ignored, and
    /// columns not named are dropped.
    pub fn reorder_columns(&mut self, order: &[String]) {
        let picks: Vec<usize> = order.iter().filter_map(|n| self.column_index(n)).collect();
        self.columns = picks.iter().map(|&i| self.columns[i].clone()).collect();
        for row in &mut self.rows {
            *row = picks.iter().map(|&i| row[i].clone()).collect();
        }
    }

    /// Stable sort on a date column; undated rows go last.
    pub fn sort_by_date(&mut self, col: usize) {
        self.rows
            .sort_by(|a, b| match (a[col].as_date(), b[col].as_date()) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            });
    }

    /// Parsed dates in the given column.
    pub fn dates(&self, col: usize) -> impl Iterator<Item = NaiveDate> + '_ {
        self.column_cells(col).filter_map(Cell::as_date)
    }
}
