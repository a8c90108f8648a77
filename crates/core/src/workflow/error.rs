//! Workflow error types for expense approval.
//!
//! This module defines all error types that can occur while submitting
//! expenses and recording approver decisions.

use thiserror::Error;
use uuid::Uuid;

use spendflow_shared::AppError;

use crate::workflow::types::{ExpenseStatus, StepDecision};

/// Broad category of a workflow error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input shape, rejected before any state mutation.
    Validation,
    /// Unknown expense, step or rule.
    NotFound,
    /// Idempotency or ordering violation. Final, never retried automatically.
    Conflict,
    /// Acting user does not own the step.
    Authorization,
    /// Infrastructure failure.
    Internal,
}

/// Errors that can occur during workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The submitted expense failed validation.
    #[error("Invalid expense: {0}")]
    InvalidExpense(String),

    /// The approval rule is malformed.
    #[error("Invalid approval rule: {0}")]
    InvalidRule(String),

    /// The decision payload is not `approved` or `rejected`.
    #[error("Invalid decision: {0}")]
    InvalidDecision(String),

    /// Approval rule not found (or no longer active).
    #[error("Approval rule {0} not found")]
    RuleNotFound(Uuid),

    /// Expense not found.
    #[error("Expense {0} not found")]
    ExpenseNotFound(Uuid),

    /// Approval step not found.
    #[error("Approval step {0} not found")]
    StepNotFound(Uuid),

    /// The acting user is not the approver assigned to the step.
    #[error("User {user_id} is not the approver of step {step_id}")]
    NotApprover {
        /// The step being decided.
        step_id: Uuid,
        /// The user who attempted the decision.
        user_id: Uuid,
    },

    /// The step already carries a decision.
    #[error("Approval step {step_id} has already been decided ({decision})")]
    StepAlreadyDecided {
        /// The step being decided.
        step_id: Uuid,
        /// The decision already on record.
        decision: StepDecision,
    },

    /// The expense already reached a terminal status.
    #[error("Expense {expense_id} is already final ({status})")]
    ExpenseAlreadyFinal {
        /// The expense.
        expense_id: Uuid,
        /// Its terminal status.
        status: ExpenseStatus,
    },

    /// Approval steps already exist for the expense.
    #[error("Approval steps already initiated for expense {0}")]
    DuplicateInitiation(Uuid),

    /// A sequential step was decided before its predecessors were approved.
    #[error("Step {step_id} (sequence {sequence}) is waiting on sequence {blocking_sequence}")]
    OutOfOrderDecision {
        /// The step being decided.
        step_id: Uuid,
        /// Its sequence index.
        sequence: u32,
        /// The lowest sequence that is not yet approved.
        blocking_sequence: u32,
    },

    /// The expense changed underneath the caller.
    #[error("Expense {0} was modified concurrently")]
    ConcurrentModification(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl WorkflowError {
    /// Returns the category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidExpense(_) | Self::InvalidRule(_) | Self::InvalidDecision(_) => {
                ErrorKind::Validation
            }
            Self::RuleNotFound(_) | Self::ExpenseNotFound(_) | Self::StepNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::StepAlreadyDecided { .. }
            | Self::ExpenseAlreadyFinal { .. }
            | Self::DuplicateInitiation(_)
            | Self::OutOfOrderDecision { .. }
            | Self::ConcurrentModification(_) => ErrorKind::Conflict,
            Self::NotApprover { .. } => ErrorKind::Authorization,
            Self::Database(_) => ErrorKind::Internal,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::Validation => 400,
            ErrorKind::Authorization => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::Internal => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidExpense(_) => "INVALID_EXPENSE",
            Self::InvalidRule(_) => "INVALID_RULE",
            Self::InvalidDecision(_) => "INVALID_DECISION",
            Self::RuleNotFound(_) => "RULE_NOT_FOUND",
            Self::ExpenseNotFound(_) => "EXPENSE_NOT_FOUND",
            Self::StepNotFound(_) => "STEP_NOT_FOUND",
            Self::NotApprover { .. } => "NOT_APPROVER",
            Self::StepAlreadyDecided { .. } => "STEP_ALREADY_DECIDED",
            Self::ExpenseAlreadyFinal { .. } => "EXPENSE_ALREADY_FINAL",
            Self::DuplicateInitiation(_) => "DUPLICATE_INITIATION",
            Self::OutOfOrderDecision { .. } => "OUT_OF_ORDER_DECISION",
            Self::ConcurrentModification(_) => "CONCURRENT_MODIFICATION",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        let message = err.to_string();
        match err.kind() {
            ErrorKind::Validation => Self::Validation(message),
            ErrorKind::NotFound => Self::NotFound(message),
            ErrorKind::Conflict => Self::Conflict(message),
            ErrorKind::Authorization => Self::Forbidden(message),
            ErrorKind::Internal => Self::Database(message),
        }
    }
}
