use std::collections::HashMap;

use super::domain::{Expense, ExpenseCategory};

/// Failures while building a CSV export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to encode CSV row: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to finalize CSV buffer")]
    Buffer,
}

/// Render expenses as RFC4180 CSV: fields containing commas, quotes, or
/// newlines are quoted and embedded quotes are doubled, which the writer
/// handles. Category ids resolve to names where known.
pub fn expenses_to_csv(
    expenses: &[Expense],
    categories: &[ExpenseCategory],
) -> Result<String, ExportError> {
    let names: HashMap<&str, &str> = categories
        .iter()
        .map(|category| (category.id.0.as_str(), category.name.as_str()))
        .collect();

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "id",
        "date",
        "vendor",
        "description",
        "category",
        "status",
        "amount",
    ])?;

    for expense in expenses {
        let category = expense
            .category_id
            .as_ref()
            .and_then(|id| names.get(id.0.as_str()).copied())
            .unwrap_or("");
        let date = expense.incurred_on.format("%Y-%m-%d").to_string();
        let amount = format!("{:.2}", expense.total_amount);
        writer.write_record([
            expense.id.0.as_str(),
            date.as_str(),
            expense.vendor_name.as_deref().unwrap_or(""),
            expense.description.as_str(),
            category,
            expense.status.label(),
            amount.as_str(),
        ])?;
    }

    let bytes = writer.into_inner().map_err(|_| ExportError::Buffer)?;
    String::from_utf8(bytes).map_err(|_| ExportError::Buffer)
}
