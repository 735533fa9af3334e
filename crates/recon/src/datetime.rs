//! Tolerant timestamp parsing for status exports.
//!
//! Exports mix `15/03/2024 14:30`, `2024-03-15 14:30:00`, `15/03/24`, ISO
//! strings with offsets and Excel serial numbers. Offsets and zone names are
//! dropped, never applied: the wall-clock time as written is what gets
//! compared. [`parse`] never fails: text it cannot read maps to the epoch
//! sentinel, which loses every recency comparison against a real timestamp.

use std::sync::OnceLock;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::diagnostics::{Diagnostic, DiagnosticSink};

/// Timestamp assigned to empty or unreadable text (1970-01-01 00:00:00).
pub fn epoch() -> NaiveDateTime {
    NaiveDateTime::default()
}

pub fn is_epoch(ts: &NaiveDateTime) -> bool {
    *ts == epoch()
}

#[derive(Clone, Copy)]
enum FieldOrder {
    DayMonthYear,
    YearMonthDay,
}

struct DatePattern {
    regex: Regex,
    order: FieldOrder,
}

fn patterns() -> &'static [DatePattern] {
    static PATTERNS: OnceLock<Vec<DatePattern>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        // Dates may sit inside surrounding text ("Concluído 15/03/2024 14:30 BRT"),
        // but never inside a longer run of digits.
        const TIME: &str = r"(?:(?:\s+|T)(\d{1,2}):(\d{2})(?::(\d{2}))?)?";
        const START: &str = r"(?:^|\D)";
        const END: &str = r"(?:\D|$)";
        vec![
            // DD/MM/YYYY[ HH:MM[:SS]]
            DatePattern {
                regex: Regex::new(&format!(r"{START}(\d{{1,2}})/(\d{{1,2}})/(\d{{4}}){TIME}{END}")).unwrap(),
                order: FieldOrder::DayMonthYear,
            },
            // YYYY-MM-DD[ HH:MM[:SS]]
            DatePattern {
                regex: Regex::new(&format!(r"{START}(\d{{4}})-(\d{{1,2}})-(\d{{1,2}}){TIME}{END}")).unwrap(),
                order: FieldOrder::YearMonthDay,
            },
            // DD/MM/YY[ HH:MM[:SS]]
            DatePattern {
                regex: Regex::new(&format!(r"{START}(\d{{1,2}})/(\d{{1,2}})/(\d{{2}}){TIME}{END}")).unwrap(),
                order: FieldOrder::DayMonthYear,
            },
        ]
    })
}

/// Parse `text`, falling back to the epoch sentinel. Silent.
pub fn parse(text: &str) -> NaiveDateTime {
    try_parse(text).unwrap_or_else(epoch)
}

/// Parse `text`, reporting non-empty text that falls back to the sentinel.
pub fn parse_with(text: &str, sink: &mut dyn DiagnosticSink) -> NaiveDateTime {
    match try_parse(text) {
        Some(ts) => ts,
        None => {
            if !text.trim().is_empty() {
                sink.emit(Diagnostic::UnparseableDate { text: text.to_string() });
            }
            epoch()
        }
    }
}

pub fn try_parse(text: &str) -> Option<NaiveDateTime> {
    let stripped = strip_offset(text);
    if stripped.is_empty() {
        return None;
    }

    for pattern in patterns() {
        let Some(caps) = pattern.regex.captures(stripped) else {
            continue;
        };
        let num = |i: usize| -> u32 {
            caps.get(i)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0)
        };
        let (year, month, day) = match pattern.order {
            FieldOrder::DayMonthYear => (num(3) as i32, num(2), num(1)),
            FieldOrder::YearMonthDay => (num(1) as i32, num(2), num(3)),
        };
        let year = if year < 100 { 2000 + year } else { year };
        let parsed = NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(num(4), num(5), num(6)));
        if parsed.is_some() {
            return parsed;
        }
    }

    free_form(stripped)
}

/// Drop a trailing `+offset` (`2024-03-15 10:00:00+03` → `2024-03-15 10:00:00`).
fn strip_offset(text: &str) -> &str {
    match text.find('+') {
        Some(pos) => text[..pos].trim(),
        None => text.trim(),
    }
}

const FREE_FORM_DATETIME: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%d/%m/%Y %H:%M:%S%.f",
];

const FREE_FORM_DATE: &[&str] = &["%Y/%m/%d", "%d-%m-%Y", "%d.%m.%Y", "%B %d, %Y", "%d %B %Y"];

fn free_form(text: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.naive_local());
    }
    for fmt in FREE_FORM_DATETIME {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt);
        }
    }
    for fmt in FREE_FORM_DATE {
        if let Ok(d) = NaiveDate::parse_from_str(text, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    excel_serial(text)
}

fn excel_serial(text: &str) -> Option<NaiveDateTime> {
    from_excel_serial(text.parse().ok()?)
}

/// Excel 1900-system serial (days since 1899-12-30, fraction = time of day).
pub fn from_excel_serial(serial: f64) -> Option<NaiveDateTime> {
    if !(1.0..2_958_466.0).contains(&serial) {
        return None;
    }
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    base.checked_add_signed(Duration::milliseconds(millis))
}
