//! Best-effort field extraction from raw receipt OCR text.
//!
//! Every guess is a suggestion for a form field, never authoritative: a
//! suggestion only lands in a field that is still empty, so user edits are
//! never overwritten. Absent guesses stay `None` and the field stays blank.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

const VENDOR_MAX_CHARS: usize = 80;

fn amount_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$?\s*[0-9][0-9,]*\.[0-9]{2}").expect("amount pattern compiles")
    })
}

fn date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\b(\d{2,4})[-/.](\d{1,2})[-/.](\d{2,4})\b").expect("date pattern compiles")
    })
}

/// Field guesses produced by one scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptSuggestions {
    pub vendor: Option<String>,
    pub amount: Option<String>,
    pub date: Option<String>,
    pub description: Option<String>,
}

/// Editable capture-form fields the suggestions are merged into.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptFormFields {
    #[serde(default)]
    pub vendor: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub description: String,
}

pub fn extract_receipt_fields(text: &str) -> ReceiptSuggestions {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    ReceiptSuggestions {
        vendor: guess_vendor(&lines),
        amount: guess_amount(text),
        date: guess_date(text),
        description: guess_description(&lines),
    }
}

/// Merge suggestions into the form, filling only fields that are still empty.
pub fn apply_suggestions(fields: &mut ReceiptFormFields, suggestions: &ReceiptSuggestions) {
    fill_if_empty(&mut fields.vendor, suggestions.vendor.as_deref());
    fill_if_empty(&mut fields.amount, suggestions.amount.as_deref());
    fill_if_empty(&mut fields.date, suggestions.date.as_deref());
    fill_if_empty(&mut fields.description, suggestions.description.as_deref());
}

fn fill_if_empty(field: &mut String, suggestion: Option<&str>) {
    if field.trim().is_empty() {
        if let Some(value) = suggestion {
            *field = value.to_string();
        }
    }
}

fn guess_vendor(lines: &[&str]) -> Option<String> {
    lines
        .first()
        .map(|line| line.chars().take(VENDOR_MAX_CHARS).collect())
}

/// The LAST currency-like match wins: totals sit below the line items on
/// nearly every receipt layout.
fn guess_amount(text: &str) -> Option<String> {
    amount_pattern().find_iter(text).last().map(|found| {
        found
            .as_str()
            .chars()
            .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
            .collect()
    })
}

/// First date-like token, separators normalized to `-`. A leading component
/// shorter than 4 digits is read as DD-MM-YYYY and reordered to YYYY-MM-DD.
/// Locales writing MM-DD-YYYY are misread by this guess; it stays editable.
fn guess_date(text: &str) -> Option<String> {
    let captures = date_pattern().captures(text)?;
    let (first, second, third) = (&captures[1], &captures[2], &captures[3]);

    if first.len() == 4 {
        Some(format!("{first}-{second}-{third}"))
    } else {
        Some(format!("{third}-{second}-{first}"))
    }
}

fn guess_description(lines: &[&str]) -> Option<String> {
    if lines.is_empty() {
        return None;
    }

    Some(
        lines
            .iter()
            .take(3)
            .copied()
            .collect::<Vec<_>>()
            .join(" "),
    )
}
