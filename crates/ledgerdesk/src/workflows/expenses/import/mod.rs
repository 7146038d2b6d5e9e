//! CSV intake for expense entries exported from banks, cards, or
//! spreadsheets. Rows become draft expenses; the caller decides what to do
//! with them (typically insert via the service and review in the UI).

mod parser;

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use super::domain::{CategoryId, ExpenseCategory, NewExpense};

#[derive(Debug)]
pub enum ExpenseCsvImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Row { line: u64, reason: String },
}

impl std::fmt::Display for ExpenseCsvImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExpenseCsvImportError::Io(err) => write!(f, "failed to read expense CSV: {}", err),
            ExpenseCsvImportError::Csv(err) => write!(f, "invalid expense CSV data: {}", err),
            ExpenseCsvImportError::Row { line, reason } => {
                write!(f, "row {} rejected: {}", line, reason)
            }
        }
    }
}

impl std::error::Error for ExpenseCsvImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExpenseCsvImportError::Io(err) => Some(err),
            ExpenseCsvImportError::Csv(err) => Some(err),
            ExpenseCsvImportError::Row { .. } => None,
        }
    }
}

impl From<std::io::Error> for ExpenseCsvImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ExpenseCsvImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

pub struct ExpenseCsvImporter;

impl ExpenseCsvImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        categories: &[ExpenseCategory],
    ) -> Result<Vec<NewExpense>, ExpenseCsvImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, categories)
    }

    /// Parse a CSV export into draft expenses. Category names are matched
    /// case-insensitively against the known categories; unknown names leave
    /// the draft uncategorized rather than failing the row.
    pub fn from_reader<R: Read>(
        reader: R,
        categories: &[ExpenseCategory],
    ) -> Result<Vec<NewExpense>, ExpenseCsvImportError> {
        let by_name: HashMap<String, &CategoryId> = categories
            .iter()
            .map(|category| (category.name.to_lowercase(), &category.id))
            .collect();

        let mut drafts = Vec::new();
        for row in parser::parse_rows(reader)? {
            let amount_raw =
                row.amount_raw
                    .as_deref()
                    .ok_or_else(|| ExpenseCsvImportError::Row {
                        line: row.line,
                        reason: "missing amount".to_string(),
                    })?;
            let total_amount =
                parser::parse_row_amount(amount_raw).ok_or_else(|| ExpenseCsvImportError::Row {
                    line: row.line,
                    reason: format!("unparseable amount '{}'", amount_raw),
                })?;

            let date_raw = row
                .date_raw
                .as_deref()
                .ok_or_else(|| ExpenseCsvImportError::Row {
                    line: row.line,
                    reason: "missing date".to_string(),
                })?;
            let incurred_on =
                parser::parse_row_date(date_raw).ok_or_else(|| ExpenseCsvImportError::Row {
                    line: row.line,
                    reason: format!("unparseable date '{}'", date_raw),
                })?;

            let category_id = row
                .category
                .as_deref()
                .and_then(|name| by_name.get(&name.to_lowercase()))
                .map(|id| (*id).clone());

            drafts.push(NewExpense {
                category_id,
                vendor_name: row.vendor,
                description: row.description,
                total_amount,
                incurred_on,
            });
        }

        Ok(drafts)
    }
}
