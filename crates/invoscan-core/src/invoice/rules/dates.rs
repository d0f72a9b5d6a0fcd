//! Interpretation of raw invoice date strings.
//!
//! The catalog stores dates as the text it found. These helpers turn that
//! text into a calendar date for reports, when the format is recognizable.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DATE_DMY: Regex = Regex::new(
        r"\b(\d{1,2})[./\-](\d{1,2})[./\-](\d{4}|\d{2})\b"
    ).unwrap();

    static ref DATE_YMD: Regex = Regex::new(
        r"\b(\d{4})[./\-](\d{1,2})[./\-](\d{1,2})\b"
    ).unwrap();

    // "5 de marzo de 2024", "15 janvier 2024", "3. März 2024"
    static ref DATE_LONG_DMY: Regex = Regex::new(
        r"(?i)\b(\d{1,2})\.?\s+(?:de\s+)?(\p{L}+)\.?\s+(?:de\s+)?(\d{4})\b"
    ).unwrap();

    // "March 5, 2024"
    static ref DATE_LONG_MDY: Regex = Regex::new(
        r"(?i)\b(\p{L}+)\.?\s+(\d{1,2}),?\s+(\d{4})\b"
    ).unwrap();
}

/// Parse a date in any of the formats the pattern catalog captures.
///
/// Numeric dates are read day-first, as on European invoices.
pub fn parse_invoice_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();

    if let Some(caps) = DATE_YMD.captures(raw) {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(date);
        }
    }

    if let Some(caps) = DATE_DMY.captures(raw) {
        let day: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let year = parse_year(&caps[3])?;
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(date);
        }
    }

    if let Some(caps) = DATE_LONG_DMY.captures(raw) {
        if let Some(month) = month_to_number(&caps[2]) {
            let day: u32 = caps[1].parse().ok()?;
            let year: i32 = caps[3].parse().ok()?;
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                return Some(date);
            }
        }
    }

    if let Some(caps) = DATE_LONG_MDY.captures(raw) {
        let month = month_to_number(&caps[1])?;
        let day: u32 = caps[2].parse().ok()?;
        let year: i32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    None
}

fn parse_year(s: &str) -> Option<i32> {
    let year: i32 = s.parse().ok()?;
    if year < 100 {
        // Two-digit year: assume 2000s for 00-50, 1900s for 51-99
        if year <= 50 {
            Some(2000 + year)
        } else {
            Some(1900 + year)
        }
    } else {
        Some(year)
    }
}

/// Month name (Spanish, English, French, German, Dutch, Swedish) to number.
fn month_to_number(month: &str) -> Option<u32> {
    let month = month.to_lowercase();
    let number = match month.as_str() {
        "enero" | "january" | "jan" | "janvier" | "januar" | "januari" => 1,
        "febrero" | "february" | "feb" | "février" | "fevrier" | "februar" | "februari" => 2,
        "marzo" | "march" | "mar" | "mars" | "märz" | "maart" => 3,
        "abril" | "april" | "apr" | "avril" => 4,
        "mayo" | "may" | "mai" | "mei" | "maj" => 5,
        "junio" | "june" | "jun" | "juin" | "juni" => 6,
        "julio" | "july" | "jul" | "juillet" | "juli" => 7,
        "agosto" | "august" | "aug" | "août" | "aout" | "augustus" | "augusti" => 8,
        "septiembre" | "setiembre" | "september" | "sep" | "sept" | "septembre" => 9,
        "octubre" | "october" | "oct" | "octobre" | "oktober" | "okt" => 10,
        "noviembre" | "november" | "nov" | "novembre" => 11,
        "diciembre" | "december" | "dec" | "décembre" | "decembre" | "dezember" | "dez" => 12,
        _ => return None,
    };
    Some(number)
}
