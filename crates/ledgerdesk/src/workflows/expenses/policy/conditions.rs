use serde_json::Value;

use super::super::domain::{ExpenseRule, ExpenseRuleType};

/// Typed view of a rule's `conditions` JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleConditions {
    /// Ceiling from the `amount` field, falling back to `limit`. Absent or
    /// zero means the rule never blocks.
    AmountLimit { limit: Option<f64> },
    /// Substrings from the `vendors` field, falling back to `blocked`.
    /// Non-string entries are dropped.
    VendorRestriction { blocked: Vec<String> },
    /// Carries no payload; enforcement happens in the approval role gate.
    ApprovalRequired,
}

/// Raised for conditions that are not valid JSON or not an object. The
/// evaluator logs and skips such rules rather than failing the check, so the
/// historical silent-default behavior survives but is observable.
#[derive(Debug, thiserror::Error)]
pub enum ConditionParseError {
    #[error("rule conditions are not valid JSON: {0}")]
    Syntax(#[from] serde_json::Error),
    #[error("rule conditions must be a JSON object, got {found}")]
    NotAnObject { found: &'static str },
}

pub fn parse_conditions(rule: &ExpenseRule) -> Result<RuleConditions, ConditionParseError> {
    let raw = rule.conditions.trim();
    let value: Value = if raw.is_empty() {
        Value::Object(serde_json::Map::new())
    } else {
        serde_json::from_str(raw)?
    };

    let object = match &value {
        Value::Object(map) => map,
        other => {
            return Err(ConditionParseError::NotAnObject {
                found: json_type_name(other),
            })
        }
    };

    let parsed = match rule.rule_type {
        ExpenseRuleType::AmountLimit => {
            let limit = object
                .get("amount")
                .and_then(Value::as_f64)
                .or_else(|| object.get("limit").and_then(Value::as_f64));
            RuleConditions::AmountLimit { limit }
        }
        ExpenseRuleType::VendorRestriction => {
            let blocked = object
                .get("vendors")
                .and_then(Value::as_array)
                .or_else(|| object.get("blocked").and_then(Value::as_array))
                .map(|entries| {
                    entries
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            RuleConditions::VendorRestriction { blocked }
        }
        ExpenseRuleType::ApprovalRequired => RuleConditions::ApprovalRequired,
    };

    Ok(parsed)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
