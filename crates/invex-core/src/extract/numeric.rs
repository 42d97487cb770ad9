//! Locale-aware amount and date parsing.
//!
//! Parsing is fail-safe: anything that does not parse cleanly yields
//! `None`, leaving the corresponding record field absent. Values are
//! never defaulted to zero.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

use super::patterns::{DATE_ISO, DATE_MONTH_NAME, DATE_NUMERIC};

/// Parse a monetary amount in either "1,234.56" or "1 234,56" style.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    let normalized = if cleaned.contains(',') && cleaned.contains('.') {
        // Whichever separator comes last is the decimal point.
        match (cleaned.rfind(','), cleaned.rfind('.')) {
            (Some(c), Some(d)) if c > d => cleaned.replace('.', "").replace(',', "."),
            _ => cleaned.replace(',', ""),
        }
    } else if let Some(pos) = cleaned.rfind(',') {
        // A single comma followed by one or two digits is a decimal
        // separator; comma groups of three are thousands.
        let fraction_digits = cleaned.len() - pos - 1;
        if cleaned.matches(',').count() == 1 && (1..=2).contains(&fraction_digits) {
            cleaned.replace(',', ".")
        } else {
            cleaned.replace(',', "")
        }
    } else {
        cleaned
    };

    Decimal::from_str(&normalized).ok()
}

/// Parse the first recognizable date in the given text.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    if let Some(caps) = DATE_ISO.captures(s) {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    if let Some(caps) = DATE_NUMERIC.captures(s) {
        let first: u32 = caps[1].parse().ok()?;
        let second: u32 = caps[2].parse().ok()?;
        let year = parse_year(&caps[3]);

        // Day-first reading, falling back to month-first.
        return NaiveDate::from_ymd_opt(year, second, first)
            .or_else(|| NaiveDate::from_ymd_opt(year, first, second));
    }

    if let Some(caps) = DATE_MONTH_NAME.captures(s) {
        let day: u32 = caps[1].parse().ok()?;
        let month = month_number(&caps[2])?;
        let year = parse_year(&caps[3]);
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    None
}

fn parse_year(s: &str) -> i32 {
    let year: i32 = s.parse().unwrap_or(0);
    if year < 100 {
        // Two-digit year: assume 2000s for 00-50, 1900s for 51-99.
        if year <= 50 { 2000 + year } else { 1900 + year }
    } else {
        year
    }
}

fn month_number(abbrev: &str) -> Option<u32> {
    match abbrev.to_lowercase().as_str() {
        "jan" => Some(1),
        "feb" => Some(2),
        "mar" => Some(3),
        "apr" => Some(4),
        "may" => Some(5),
        "jun" => Some(6),
        "jul" => Some(7),
        "aug" => Some(8),
        "sep" => Some(9),
        "oct" => Some(10),
        "nov" => Some(11),
        "dec" => Some(12),
        _ => None,
    }
}
