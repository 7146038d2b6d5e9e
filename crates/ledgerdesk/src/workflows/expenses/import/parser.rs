use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use std::io::Read;

#[derive(Debug)]
pub(crate) struct ParsedExpenseRow {
    pub(crate) line: u64,
    pub(crate) vendor: Option<String>,
    pub(crate) description: String,
    pub(crate) amount_raw: Option<String>,
    pub(crate) date_raw: Option<String>,
    pub(crate) category: Option<String>,
}

pub(crate) fn parse_rows<R: Read>(reader: R) -> Result<Vec<ParsedExpenseRow>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut rows = Vec::new();

    for (index, record) in csv_reader.deserialize::<ExpenseRow>().enumerate() {
        let row = record?;
        rows.push(ParsedExpenseRow {
            line: index as u64 + 2,
            vendor: row.vendor,
            description: row.description.unwrap_or_default(),
            amount_raw: row.amount,
            date_raw: row.date,
            category: row.category,
        });
    }

    Ok(rows)
}

#[derive(Debug, Deserialize)]
struct ExpenseRow {
    #[serde(rename = "Date", default, deserialize_with = "empty_string_as_none")]
    date: Option<String>,
    #[serde(rename = "Vendor", default, deserialize_with = "empty_string_as_none")]
    vendor: Option<String>,
    #[serde(
        rename = "Description",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    description: Option<String>,
    #[serde(rename = "Amount", default, deserialize_with = "empty_string_as_none")]
    amount: Option<String>,
    #[serde(
        rename = "Category",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    category: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

/// Bank and card exports disagree on formats; accept the common three.
pub(crate) fn parse_row_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    for format in ["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
    }

    None
}

/// Strip currency symbols and thousands separators before parsing.
pub(crate) fn parse_row_amount(value: &str) -> Option<f64> {
    let cleaned: String = value
        .chars()
        .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|amount| *amount >= 0.0)
}

#[cfg(test)]
pub(crate) fn parse_row_date_for_tests(value: &str) -> Option<NaiveDate> {
    parse_row_date(value)
}

#[cfg(test)]
pub(crate) fn parse_row_amount_for_tests(value: &str) -> Option<f64> {
    parse_row_amount(value)
}
