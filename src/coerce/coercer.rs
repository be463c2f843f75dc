use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::form::control_model::{ControlDescriptor, ControlKind, ControlOption};
use crate::resolve::profile::UserProfile;
use crate::resolve::value_map::{RawValue, format_number};

const TRUTHY: &[&str] = &["true", "yes", "on", "1", "checked", "selected", "enabled"];
const FALSY: &[&str] = &["false", "no", "off", "0", "unchecked", "unselected", "disabled"];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%Y-%m",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
];

const TIME_FORMATS: &[&str] = &["%H:%M", "%H:%M:%S", "%H:%M:%S%.f"];

/// The representation a control expects.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CoercedValue {
    Text(String),
    Bool(bool),
    Number(f64),
    /// No stored value for a select or radio; the caller must not assign.
    Unset,
}

impl CoercedValue {
    /// String form written into the element's `value`.
    pub fn as_text(&self) -> String {
        match self {
            CoercedValue::Text(s) => s.clone(),
            CoercedValue::Bool(b) => b.to_string(),
            CoercedValue::Number(n) => format_number(*n),
            CoercedValue::Unset => String::new(),
        }
    }

    /// Checked state for checkbox assignment.
    pub fn is_truthy(&self) -> bool {
        match self {
            CoercedValue::Text(s) => !s.is_empty(),
            CoercedValue::Bool(b) => *b,
            CoercedValue::Number(n) => *n != 0.0 && !n.is_nan(),
            CoercedValue::Unset => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CoercedValue::Text(s) => s.is_empty(),
            CoercedValue::Unset => true,
            _ => false,
        }
    }
}

impl fmt::Display for CoercedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

/// Normalises a raw stored value into the shape a control kind expects.
///
/// Total over every `(value, kind)` pair: malformed dates, times and
/// numbers pass through as trimmed text. The only state is the optional
/// profile used to repair email values.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueCoercer<'a> {
    profile: Option<&'a UserProfile>,
}

impl<'a> ValueCoercer<'a> {
    pub fn new() -> Self {
        Self { profile: None }
    }

    pub fn with_profile(profile: &'a UserProfile) -> Self {
        Self {
            profile: Some(profile),
        }
    }

    pub fn coerce_for(&self, raw: &RawValue, descriptor: &ControlDescriptor) -> CoercedValue {
        self.coerce(raw, descriptor.kind(), &descriptor.options)
    }

    pub fn coerce(&self, raw: &RawValue, kind: ControlKind, options: &[ControlOption]) -> CoercedValue {
        if raw.is_null() {
            return match kind {
                ControlKind::Radio | ControlKind::Select | ControlKind::SelectMultiple => CoercedValue::Unset,
                _ => CoercedValue::Text(String::new()),
            };
        }

        let text = raw.to_string();
        let trimmed = text.trim();

        match kind {
            ControlKind::Checkbox => match raw {
                RawValue::Bool(b) => CoercedValue::Bool(*b),
                _ => CoercedValue::Bool(checkbox_state(trimmed)),
            },
            ControlKind::Radio => CoercedValue::Text(trimmed.to_string()),
            ControlKind::Select | ControlKind::SelectMultiple => {
                CoercedValue::Text(match_option(trimmed, options))
            }
            ControlKind::Number | ControlKind::Range => match parse_float_prefix(trimmed) {
                Some(n) => CoercedValue::Number(n),
                None => CoercedValue::Text(trimmed.to_string()),
            },
            ControlKind::Date => CoercedValue::Text(
                parse_date(trimmed)
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| trimmed.to_string()),
            ),
            ControlKind::Time => CoercedValue::Text(
                parse_time(trimmed)
                    .map(|t| t.format("%H:%M").to_string())
                    .unwrap_or_else(|| trimmed.to_string()),
            ),
            ControlKind::Email => CoercedValue::Text(self.email(trimmed)),
            ControlKind::Tel => CoercedValue::Text(format_phone(trimmed)),
            ControlKind::Url => CoercedValue::Text(ensure_scheme(trimmed)),
            ControlKind::Password => CoercedValue::Text(String::new()),
            ControlKind::Textarea
            | ControlKind::Text
            | ControlKind::Search
            | ControlKind::Hidden
            | ControlKind::Button => CoercedValue::Text(trimmed.to_string()),
        }
    }

    fn email(&self, trimmed: &str) -> String {
        if trimmed.is_empty() || trimmed.contains('@') {
            return trimmed.to_string();
        }
        self.profile
            .and_then(|p| p.email())
            .unwrap_or_else(|| trimmed.to_string())
    }
}

fn checkbox_state(trimmed: &str) -> bool {
    let lowered = trimmed.to_lowercase();
    if TRUTHY.contains(&lowered.as_str()) {
        return true;
    }
    if FALSY.contains(&lowered.as_str()) {
        return false;
    }
    !trimmed.is_empty()
}

/// Exact (case-insensitive) value/text match, then containment either way,
/// first option in document order wins. Falls back to the input itself.
pub fn match_option(trimmed: &str, options: &[ControlOption]) -> String {
    if trimmed.is_empty() {
        return String::new();
    }
    let needle = trimmed.to_lowercase();

    let exact = options
        .iter()
        .find(|o| o.value.to_lowercase() == needle || o.text.to_lowercase() == needle);
    if let Some(option) = exact {
        return option_result(option);
    }

    let fuzzy = options.iter().find(|o| {
        let value = o.value.to_lowercase();
        let text = o.text.to_lowercase();
        let overlaps = |candidate: &str| {
            !candidate.is_empty() && (candidate.contains(&needle) || needle.contains(candidate))
        };
        overlaps(&value) || overlaps(&text)
    });
    match fuzzy {
        Some(option) => option_result(option),
        None => trimmed.to_string(),
    }
}

fn option_result(option: &ControlOption) -> String {
    if option.value.is_empty() {
        option.text.clone()
    } else {
        option.value.clone()
    }
}

/// Leading decimal literal of `s`, as a browser's `parseFloat` reads it.
pub fn parse_float_prefix(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    if s[end..].starts_with("Infinity") {
        let negative = bytes.first() == Some(&b'-');
        return Some(if negative { f64::NEG_INFINITY } else { f64::INFINITY });
    }

    let digits = |from: usize| bytes[from..].iter().take_while(|b| b.is_ascii_digit()).count();

    let int_digits = digits(end);
    end += int_digits;
    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = digits(end + 1);
        end += 1 + frac_digits;
    }
    if int_digits + frac_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e') | Some(b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits = digits(exp_end);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    s[..end].parse().ok()
}

/// Calendar date of a date or date-time string, as written (no timezone shift).
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.date_naive());
    }
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
    {
        return Some(dt.date());
    }
    DATE_FORMATS.iter().find_map(|f| {
        // A bare year-month resolves to the first of the month.
        if *f == "%Y-%m" {
            NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d").ok()
        } else {
            NaiveDate::parse_from_str(s, f).ok()
        }
    })
}

pub fn parse_time(s: &str) -> Option<NaiveTime> {
    if s.is_empty() {
        return None;
    }
    TIME_FORMATS
        .iter()
        .find_map(|f| NaiveTime::parse_from_str(s, f).ok())
}

fn format_phone(trimmed: &str) -> String {
    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() == 10 {
        format!("({}) {}-{}", &digits[..3], &digits[3..6], &digits[6..])
    } else {
        trimmed.to_string()
    }
}

fn ensure_scheme(trimmed: &str) -> String {
    let lowered = trimmed.to_lowercase();
    if trimmed.is_empty() || lowered.starts_with("http://") || lowered.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}
