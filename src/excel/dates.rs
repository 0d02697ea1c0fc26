//! Tolerant cell → date conversion
//!
//! Spreadsheet dates arrive as serial numbers, as date-typed cells, or as
//! free text in one of several layouts. Anything unrecognized is `None`,
//! never an error.

use calamine::Data;
use chrono::{Datelike, NaiveDate};

/// Serial day count of 1970-01-01 in the spreadsheet 1900 date system
pub const EXCEL_EPOCH_BIAS: i64 = 25_569;

/// Component order of a textual date layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Part {
    Year,
    Month,
    Day,
}

/// Layouts tried in order, first round-tripping match wins.
///
/// The separator is not significant (`/` and `-` both split), so the last
/// entry only matters for inputs the first one already rejected.
const LAYOUTS: [(&str, [Part; 3]); 4] = [
    ("yyyy-MM-dd", [Part::Year, Part::Month, Part::Day]),
    ("dd/MM/yyyy", [Part::Day, Part::Month, Part::Year]),
    ("MM/dd/yyyy", [Part::Month, Part::Day, Part::Year]),
    ("yyyy/MM/dd", [Part::Year, Part::Month, Part::Day]),
];

/// Interpret one cell as a calendar date
pub fn parse_cell_date(cell: &Data) -> Option<NaiveDate> {
    match cell {
        Data::Empty => None,
        Data::DateTime(dt) => from_serial(dt.as_f64()),
        Data::DateTimeIso(s) => parse_iso_prefix(s),
        Data::Float(f) => from_serial(*f),
        Data::Int(i) => from_serial(*i as f64),
        Data::String(s) => parse_date_str(s),
        Data::Bool(_) | Data::DurationIso(_) | Data::Error(_) => None,
    }
}

/// Convert a spreadsheet serial day count to a date.
///
/// Fractional serials carry a time of day; only the whole day is kept.
pub fn from_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial == 0.0 {
        return None;
    }
    let days = (serial.floor() as i64).checked_sub(EXCEL_EPOCH_BIAS)?;
    NaiveDate::from_ymd_opt(1970, 1, 1)?.checked_add_signed(chrono::Duration::try_days(days)?)
}

/// Parse a textual date by trying each supported layout in order
pub fn parse_date_str(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let parts: Vec<&str> = value.split(['/', '-']).collect();
    LAYOUTS
        .iter()
        .find_map(|(_, layout)| parse_with_layout(&parts, layout))
}

fn parse_with_layout(parts: &[&str], layout: &[Part; 3]) -> Option<NaiveDate> {
    let mut year = None;
    let mut month = None;
    let mut day = None;

    for (idx, part) in layout.iter().enumerate() {
        let value = leading_int(parts.get(idx)?)?;
        match part {
            Part::Year => year = Some(value),
            Part::Month => month = Some(value - 1),
            Part::Day => day = Some(value),
        }
    }

    let (year, month, day) = (year?, month?, day?);
    if year == 0 || day == 0 {
        return None;
    }
    if !(0..=11).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }
    // Two-digit years never reproduce themselves
    if !(100..=9999).contains(&year) {
        return None;
    }

    let date = NaiveDate::from_ymd_opt(year as i32, (month + 1) as u32, day as u32)?;
    let round_trips = i64::from(date.year()) == year
        && i64::from(date.month0()) == month
        && i64::from(date.day()) == day;
    round_trips.then_some(date)
}

/// Integer value of the leading digits, ignoring leading whitespace.
///
/// `"05 10:30"` yields 5 so date-time text keeps its date part.
fn leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

fn parse_iso_prefix(s: &str) -> Option<NaiveDate> {
    let date_part = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}
