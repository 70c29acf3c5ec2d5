use std::fmt;
use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

fn year_first_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}").expect("static pattern"))
}

/// True when a date string leads with a four digit year (`2016-03-01`).
pub fn is_year_first(raw: &str) -> bool {
    year_first_re().is_match(raw.trim())
}

/// Parse a statement date. Day comes before month unless the string starts
/// with a four digit year.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if is_year_first(s) {
        parse_year_first(s)
    } else {
        parse_day_first(s)
    }
}

fn parse_year_first(s: &str) -> Option<NaiveDate> {
    let date_part = s.split(['T', ' ']).next()?;
    if date_part.len() == 8 && date_part.chars().all(|c| c.is_ascii_digit()) {
        return NaiveDate::parse_from_str(date_part, "%Y%m%d").ok();
    }
    let parts: Vec<&str> = date_part.split(['-', '/', '.']).collect();
    if parts.len() != 3 {
        return None;
    }
    let y: i32 = parts[0].parse().ok()?;
    let m: u32 = parts[1].parse().ok()?;
    let d: u32 = parts[2].parse().ok()?;
    NaiveDate::from_ymd_opt(y, m, d)
}

fn parse_day_first(s: &str) -> Option<NaiveDate> {
    let first = s.split_whitespace().next()?;
    let parts: Vec<&str> = first.split(['/', '-', '.']).collect();
    if parts.len() == 3 && parts.iter().all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit())) {
        let d: u32 = parts[0].parse().ok()?;
        let m: u32 = parts[1].parse().ok()?;
        let y = expand_year(parts[2])?;
        return NaiveDate::from_ymd_opt(y, m, d);
    }

    // Month names: "01 Jan 2016", "1 January 16", "10-Mar-2016"
    let last = s.rsplit([' ', '-', '/']).next().unwrap_or("");
    let formats: &[&str] = if last.len() <= 2 {
        &["%d %b %y", "%d %B %y", "%d-%b-%y", "%d/%b/%y"]
    } else {
        &["%d %b %Y", "%d %B %Y", "%d-%b-%Y", "%d/%b/%Y"]
    };
    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

fn expand_year(raw: &str) -> Option<i32> {
    let y: i32 = raw.parse().ok()?;
    match raw.len() {
        1 | 2 if y < 70 => Some(2000 + y),
        1 | 2 => Some(1900 + y),
        4 => Some(y),
        _ => None,
    }
}

/// Serial of 9999-12-31, the last day Excel can represent.
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial.abs() > MAX_EXCEL_SERIAL {
        return None;
    }
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_signed(chrono::Duration::days(serial.trunc() as i64))
}

/// A calendar month bucket, ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Every month from `first` to `last` inclusive.
    pub fn range(first: Self, last: Self) -> Vec<Self> {
        let mut months = Vec::new();
        let mut current = first;
        while current <= last {
            months.push(current);
            current = current.next();
        }
        months
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}
