//! Workflow service for expense submission and approver decisions.
//!
//! This module implements the per-expense state machine
//! (`Pending → Approved | Rejected`) on top of the step ledger and the
//! evaluation engine. It is pure: callers load the expense and its steps,
//! call into the service, then persist what it returns.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::workflow::error::WorkflowError;
use crate::workflow::evaluation::EvaluationEngine;
use crate::workflow::event::StatusChanged;
use crate::workflow::expense::{Expense, ExpenseDraft};
use crate::workflow::ledger::{ApprovalStep, StepLedger};
use crate::workflow::rule::ApprovalRule;
use crate::workflow::types::{DecisionRequest, ExpenseStatus};

/// A freshly submitted expense with its approval chain.
#[derive(Debug, Clone)]
pub struct Submission {
    /// The pending expense.
    pub expense: Expense,
    /// One pending step per approver, in rule order.
    pub steps: Vec<ApprovalStep>,
}

/// The result of applying one decision.
#[derive(Debug, Clone)]
pub struct DecisionOutcome {
    /// The step after the decision was recorded.
    pub step: ApprovalStep,
    /// The expense after re-evaluation, with its version bumped.
    pub expense: Expense,
    /// Set when this decision moved the expense to a terminal status.
    pub event: Option<StatusChanged>,
}

impl DecisionOutcome {
    /// Returns true if the decision finalized the expense.
    #[must_use]
    pub fn is_transition(&self) -> bool {
        self.event.is_some()
    }
}

/// Stateless service for managing expense workflow transitions.
pub struct WorkflowService;

impl WorkflowService {
    /// Builds a pending expense and its approval steps.
    ///
    /// # Arguments
    /// * `expense_id` - Identifier for the new expense
    /// * `draft` - Validated field values from the caller
    /// * `rule` - The resolved approval rule, snapshotted onto the expense
    /// * `now` - Submission timestamp
    ///
    /// # Errors
    ///
    /// - `WorkflowError::InvalidExpense` if the draft fails validation
    /// - `WorkflowError::InvalidRule` if the rule is malformed
    pub fn submit(
        expense_id: Uuid,
        draft: ExpenseDraft,
        rule: &ApprovalRule,
        now: DateTime<Utc>,
    ) -> Result<Submission, WorkflowError> {
        draft.validate()?;
        rule.validate()?;

        let snapshot = rule.snapshot();
        let expense = Expense::from_draft(expense_id, draft, &snapshot, now);
        let steps = StepLedger::initiate(expense_id, &snapshot.approvers, &[], now)?;

        Ok(Submission { expense, steps })
    }

    /// Applies one approver decision and re-evaluates the expense.
    ///
    /// Checks run in this order, and nothing is modified when one fails:
    /// 1. the step exists
    /// 2. `acting_approver` owns it
    /// 3. the step is still pending
    /// 4. the expense is not final
    /// 5. in sequential mode, every earlier step is approved
    ///
    /// The step check precedes the expense check so that re-issuing a
    /// decision always reports `StepAlreadyDecided`, even after the
    /// expense was finalized by that very decision.
    ///
    /// # Errors
    ///
    /// `StepNotFound`, `NotApprover`, `StepAlreadyDecided`,
    /// `ExpenseAlreadyFinal` or `OutOfOrderDecision`.
    pub fn decide(
        expense: &Expense,
        steps: &[ApprovalStep],
        step_id: Uuid,
        request: &DecisionRequest,
        acting_approver: Uuid,
        now: DateTime<Utc>,
    ) -> Result<DecisionOutcome, WorkflowError> {
        let step = StepLedger::find(steps, step_id)?;
        if step.expense_id != expense.id {
            return Err(WorkflowError::StepNotFound(step_id));
        }

        if step.approver_id != acting_approver {
            return Err(WorkflowError::NotApprover {
                step_id,
                user_id: acting_approver,
            });
        }

        if !step.is_pending() {
            return Err(WorkflowError::StepAlreadyDecided {
                step_id,
                decision: step.decision,
            });
        }

        if expense.is_final() {
            return Err(WorkflowError::ExpenseAlreadyFinal {
                expense_id: expense.id,
                status: expense.status,
            });
        }

        let mut ledger = steps.to_vec();
        let step = StepLedger::record_decision(
            expense.policy.mode(),
            &mut ledger,
            step_id,
            request.decision,
            request.normalized_comments(),
            now,
        )?;

        let status = EvaluationEngine::evaluate(&expense.policy, &ledger);
        let event =
            Self::transition(expense.id, expense.status, status)?.map(|status| StatusChanged {
                expense_id: expense.id,
                status,
                occurred_at: now,
            });

        let mut updated = expense.clone();
        updated.status = status;
        updated.version += 1;
        updated.updated_at = now;

        Ok(DecisionOutcome {
            step,
            expense: updated,
            event,
        })
    }

    /// Validates a status change.
    ///
    /// # Returns
    /// * `Ok(Some(to))` for `Pending → Approved | Rejected`
    /// * `Ok(None)` when the status does not change
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::ExpenseAlreadyFinal` when leaving a terminal status.
    pub fn transition(
        expense_id: Uuid,
        from: ExpenseStatus,
        to: ExpenseStatus,
    ) -> Result<Option<ExpenseStatus>, WorkflowError> {
        if from == to {
            return Ok(None);
        }
        if Self::is_valid_transition(from, to) {
            Ok(Some(to))
        } else {
            Err(WorkflowError::ExpenseAlreadyFinal {
                expense_id,
                status: from,
            })
        }
    }

    /// Check if a status transition is valid.
    ///
    /// Valid transitions:
    /// - Pending → Approved
    /// - Pending → Rejected
    #[must_use]
    pub fn is_valid_transition(from: ExpenseStatus, to: ExpenseStatus) -> bool {
        matches!(
            (from, to),
            (
                ExpenseStatus::Pending,
                ExpenseStatus::Approved | ExpenseStatus::Rejected
            )
        )
    }
}
