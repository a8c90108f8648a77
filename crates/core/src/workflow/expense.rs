//! Expense records and submission drafts.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::workflow::error::WorkflowError;
use crate::workflow::rule::{ApprovalPolicy, RuleSnapshot};
use crate::workflow::types::ExpenseStatus;

/// Maximum category length accepted on submission.
const MAX_CATEGORY_LEN: usize = 100;

/// Validated field values for a new expense.
///
/// Currency conversion and receipt OCR happen upstream; the draft only
/// carries final values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseDraft {
    /// The employee submitting the expense.
    pub submitter_id: Uuid,
    /// The company the expense is charged to.
    pub company_id: Uuid,
    /// Claimed amount, strictly positive.
    pub amount: Decimal,
    /// ISO 4217 currency code, e.g. "USD".
    pub currency: String,
    /// Expense category, e.g. "travel".
    pub category: String,
    /// Optional description.
    pub description: Option<String>,
    /// The day the expense was incurred.
    pub expense_date: NaiveDate,
    /// Optional link to the receipt image.
    pub receipt_url: Option<String>,
}

impl ExpenseDraft {
    /// Validates the draft.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::InvalidExpense` when:
    /// - the amount is zero or negative
    /// - the currency is not a three-letter uppercase code
    /// - the category is blank or too long
    pub fn validate(&self) -> Result<(), WorkflowError> {
        if self.amount <= Decimal::ZERO {
            return Err(WorkflowError::InvalidExpense(format!(
                "amount must be positive, got {}",
                self.amount
            )));
        }

        let currency = self.currency.trim();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(WorkflowError::InvalidExpense(format!(
                "currency must be an ISO 4217 code, got {:?}",
                self.currency
            )));
        }

        let category = self.category.trim();
        if category.is_empty() {
            return Err(WorkflowError::InvalidExpense(
                "category is required".to_string(),
            ));
        }
        if category.len() > MAX_CATEGORY_LEN {
            return Err(WorkflowError::InvalidExpense(format!(
                "category must be at most {MAX_CATEGORY_LEN} characters"
            )));
        }

        Ok(())
    }
}

/// A submitted expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    /// Unique identifier.
    pub id: Uuid,
    /// The employee who submitted it.
    pub submitter_id: Uuid,
    /// The company the expense is charged to.
    pub company_id: Uuid,
    /// Claimed amount.
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Expense category.
    pub category: String,
    /// Optional description.
    pub description: Option<String>,
    /// The day the expense was incurred.
    pub expense_date: NaiveDate,
    /// Optional link to the receipt image.
    pub receipt_url: Option<String>,
    /// Current workflow status.
    pub status: ExpenseStatus,
    /// Rule the approval chain was built from.
    pub rule_id: Uuid,
    /// Version of that rule at submission time.
    pub rule_version: i32,
    /// Policy snapshot used for every evaluation of this expense.
    pub policy: ApprovalPolicy,
    /// Optimistic concurrency counter, bumped on every decision.
    pub version: i32,
    /// When the expense was submitted.
    pub created_at: DateTime<Utc>,
    /// When the expense last changed.
    pub updated_at: DateTime<Utc>,
}

impl Expense {
    /// Creates a pending expense from a draft and a rule snapshot.
    #[must_use]
    pub fn from_draft(id: Uuid, draft: ExpenseDraft, rule: &RuleSnapshot, now: DateTime<Utc>) -> Self {
        Self {
            id,
            submitter_id: draft.submitter_id,
            company_id: draft.company_id,
            amount: draft.amount,
            currency: draft.currency.trim().to_string(),
            category: draft.category.trim().to_string(),
            description: draft.description,
            expense_date: draft.expense_date,
            receipt_url: draft.receipt_url,
            status: ExpenseStatus::Pending,
            rule_id: rule.rule_id,
            rule_version: rule.rule_version,
            policy: rule.policy,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true once the expense reached a terminal status.
    #[must_use]
    pub fn is_final(&self) -> bool {
        self.status.is_terminal()
    }
}
