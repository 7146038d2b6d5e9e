//! Stateless evaluation of expense records against configured spending rules.
//!
//! Rules run in list order and the first block short-circuits. Malformed rule
//! conditions are logged and skipped so a bad row can never block an action,
//! matching the behavior of the system this service replaced while keeping
//! the failure visible in logs.

mod conditions;

pub use conditions::{parse_conditions, ConditionParseError, RuleConditions};

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::domain::{ActorRole, Expense, ExpenseRule, ExpenseRuleType};

/// Action the policy check guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyAction {
    Submit,
    Approve,
}

/// Whether a single or batch approval is being gated; the wording of the
/// refusal differs between the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalScope {
    Single,
    Bulk,
}

/// Outcome of a policy check. Callers surface the message and abort the
/// mutation; the evaluator itself has no side effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PolicyDecision {
    Permitted,
    Blocked { message: String },
}

impl PolicyDecision {
    pub fn is_permitted(&self) -> bool {
        matches!(self, PolicyDecision::Permitted)
    }

    pub fn blocked_message(&self) -> Option<&str> {
        match self {
            PolicyDecision::Permitted => None,
            PolicyDecision::Blocked { message } => Some(message),
        }
    }
}

/// Expense-like record under evaluation. Field fallback chains mirror the
/// wire shapes this service accepts: `total_amount` wins over `amount`, and
/// a missing vendor name skips vendor restrictions entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicySubject {
    pub total_amount: Option<f64>,
    pub amount: Option<f64>,
    pub vendor_name: Option<String>,
}

impl PolicySubject {
    pub fn from_expense(expense: &Expense) -> Self {
        Self {
            total_amount: Some(expense.total_amount),
            amount: None,
            vendor_name: expense.vendor_name.clone(),
        }
    }

    pub fn resolved_amount(&self) -> f64 {
        self.total_amount.or(self.amount).unwrap_or(0.0)
    }
}

/// Apply amount-limit and vendor-restriction rules to one subject. Inactive
/// rules are ignored; approval_required rules carry no check here.
pub fn evaluate_rules(subject: &PolicySubject, rules: &[ExpenseRule]) -> PolicyDecision {
    for rule in rules.iter().filter(|rule| rule.is_active) {
        let parsed = match parse_conditions(rule) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(rule_id = %rule.id.0, %err, "skipping expense rule with malformed conditions");
                continue;
            }
        };

        match parsed {
            RuleConditions::AmountLimit { limit: Some(limit) } if limit != 0.0 => {
                if subject.resolved_amount() > limit {
                    return PolicyDecision::Blocked {
                        message: format!("Amount exceeds policy limit of {limit}"),
                    };
                }
            }
            RuleConditions::VendorRestriction { blocked } if !blocked.is_empty() => {
                if let Some(vendor) = subject.vendor_name.as_deref() {
                    let vendor = vendor.to_lowercase();
                    if blocked
                        .iter()
                        .any(|entry| vendor.contains(&entry.to_lowercase()))
                    {
                        return PolicyDecision::Blocked {
                            message: "Vendor restricted by policy".to_string(),
                        };
                    }
                }
            }
            _ => {}
        }
    }

    PolicyDecision::Permitted
}

/// Role gate applied only at approval time: any active approval_required
/// rule demands an approver role.
pub fn approval_role_gate(
    rules: &[ExpenseRule],
    role: ActorRole,
    scope: ApprovalScope,
) -> PolicyDecision {
    let approval_demanded = rules
        .iter()
        .any(|rule| rule.is_active && rule.rule_type == ExpenseRuleType::ApprovalRequired);

    if approval_demanded && !role.is_approver() {
        let message = match scope {
            ApprovalScope::Single => "Approval requires an approver role",
            ApprovalScope::Bulk => "Bulk approval requires an approver role",
        };
        return PolicyDecision::Blocked {
            message: message.to_string(),
        };
    }

    PolicyDecision::Permitted
}

/// Full check for one action: submit runs the rules alone; approve runs the
/// rules and then the role gate.
pub fn evaluate_action(
    subject: &PolicySubject,
    rules: &[ExpenseRule],
    action: PolicyAction,
    role: ActorRole,
) -> PolicyDecision {
    let decision = evaluate_rules(subject, rules);
    if !decision.is_permitted() {
        return decision;
    }

    match action {
        PolicyAction::Submit => PolicyDecision::Permitted,
        PolicyAction::Approve => approval_role_gate(rules, role, ApprovalScope::Single),
    }
}
