//! Expense approval workflow.
//!
//! This module implements the approval rule model, the per-expense step
//! ledger, the evaluation engine and the status state machine.
//!
//! # Modules
//!
//! - `types` - Status, decision and mode enums
//! - `error` - Workflow-specific error types
//! - `rule` - Approval rules, policies and snapshots
//! - `expense` - Expense drafts and records
//! - `ledger` - Approval steps and write-once decisions
//! - `evaluation` - Sequential and parallel outcome evaluation
//! - `service` - Submission and decision state transitions
//! - `event` - Status change events

pub mod error;
pub mod evaluation;
pub mod event;
pub mod expense;
pub mod ledger;
pub mod rule;
pub mod service;
pub mod types;

#[cfg(test)]
mod evaluation_props;
#[cfg(test)]
mod ledger_props;
#[cfg(test)]
mod service_props;

pub use error::{ErrorKind, WorkflowError};
pub use evaluation::{EvaluationEngine, Tally};
pub use event::StatusChanged;
pub use expense::{Expense, ExpenseDraft};
pub use ledger::{ApprovalStep, StepLedger};
pub use rule::{ApprovalPolicy, ApprovalRule, RuleSnapshot};
pub use service::{DecisionOutcome, Submission, WorkflowService};
pub use types::{ApprovalMode, Decision, DecisionRequest, ExpenseStatus, StepDecision};
