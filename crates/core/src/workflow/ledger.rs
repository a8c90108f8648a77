//! Step ledger: the per-expense collection of approval steps.
//!
//! Steps are created in bulk at submission, one per approver in rule
//! order. A step's decision is write-once: it moves from `Pending` to a
//! terminal decision exactly once and never changes again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::workflow::error::WorkflowError;
use crate::workflow::types::{ApprovalMode, Decision, StepDecision};

/// One approver's decision slot within an expense's approval chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalStep {
    /// Unique identifier.
    pub id: Uuid,
    /// The expense this step belongs to.
    pub expense_id: Uuid,
    /// The approver who owns the step.
    pub approver_id: Uuid,
    /// 1-based position in the rule's approver list.
    pub sequence: u32,
    /// Current decision.
    pub decision: StepDecision,
    /// When the decision was recorded.
    pub decided_at: Option<DateTime<Utc>>,
    /// Optional approver comments.
    pub comments: Option<String>,
    /// When the step was created.
    pub created_at: DateTime<Utc>,
}

impl ApprovalStep {
    /// Returns true if the step has not been decided.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.decision == StepDecision::Pending
    }

    /// Records a decision, moving the step out of `Pending`.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::StepAlreadyDecided` if the step was already decided.
    pub fn record(
        &mut self,
        decision: Decision,
        comments: Option<String>,
        decided_at: DateTime<Utc>,
    ) -> Result<(), WorkflowError> {
        if !self.is_pending() {
            return Err(WorkflowError::StepAlreadyDecided {
                step_id: self.id,
                decision: self.decision,
            });
        }

        self.decision = decision.into();
        self.comments = comments;
        self.decided_at = Some(decided_at);
        Ok(())
    }
}

/// Stateless operations over an expense's steps.
pub struct StepLedger;

impl StepLedger {
    /// Creates one pending step per approver, in rule order.
    ///
    /// # Arguments
    /// * `expense_id` - The expense being initiated
    /// * `approvers` - Approvers in decision order
    /// * `existing` - Steps already stored for the expense
    /// * `now` - Creation timestamp
    ///
    /// # Errors
    ///
    /// - `WorkflowError::DuplicateInitiation` if `existing` is not empty
    /// - `WorkflowError::InvalidRule` if the approver list is empty
    pub fn initiate(
        expense_id: Uuid,
        approvers: &[Uuid],
        existing: &[ApprovalStep],
        now: DateTime<Utc>,
    ) -> Result<Vec<ApprovalStep>, WorkflowError> {
        if !existing.is_empty() {
            return Err(WorkflowError::DuplicateInitiation(expense_id));
        }
        if approvers.is_empty() {
            return Err(WorkflowError::InvalidRule(
                "at least one approver is required".to_string(),
            ));
        }

        Ok(approvers
            .iter()
            .zip(1u32..)
            .map(|(approver_id, sequence)| ApprovalStep {
                id: Uuid::now_v7(),
                expense_id,
                approver_id: *approver_id,
                sequence,
                decision: StepDecision::Pending,
                decided_at: None,
                comments: None,
                created_at: now,
            })
            .collect())
    }

    /// Finds a step by id.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::StepNotFound` if no step has the id.
    pub fn find(steps: &[ApprovalStep], step_id: Uuid) -> Result<&ApprovalStep, WorkflowError> {
        steps
            .iter()
            .find(|s| s.id == step_id)
            .ok_or(WorkflowError::StepNotFound(step_id))
    }

    /// Returns the lowest sequence below `step` that is not approved yet.
    ///
    /// Always `None` in parallel mode.
    #[must_use]
    pub fn blocking_sequence(
        mode: ApprovalMode,
        steps: &[ApprovalStep],
        step: &ApprovalStep,
    ) -> Option<u32> {
        match mode {
            ApprovalMode::Parallel => None,
            ApprovalMode::Sequential => steps
                .iter()
                .filter(|s| s.sequence < step.sequence && s.decision != StepDecision::Approved)
                .map(|s| s.sequence)
                .min(),
        }
    }

    /// Returns true if `step` may be decided now under `mode`.
    #[must_use]
    pub fn is_turn(mode: ApprovalMode, steps: &[ApprovalStep], step: &ApprovalStep) -> bool {
        step.is_pending() && Self::blocking_sequence(mode, steps, step).is_none()
    }

    /// Records a decision on one step of the ledger.
    ///
    /// # Errors
    ///
    /// - `WorkflowError::StepNotFound` if the step is not in the ledger
    /// - `WorkflowError::StepAlreadyDecided` if it already has a decision
    /// - `WorkflowError::OutOfOrderDecision` if, in sequential mode, a lower
    ///   sequence step is not approved yet
    pub fn record_decision(
        mode: ApprovalMode,
        steps: &mut [ApprovalStep],
        step_id: Uuid,
        decision: Decision,
        comments: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<ApprovalStep, WorkflowError> {
        let step = Self::find(steps, step_id)?;
        if !step.is_pending() {
            return Err(WorkflowError::StepAlreadyDecided {
                step_id,
                decision: step.decision,
            });
        }
        if let Some(blocking_sequence) = Self::blocking_sequence(mode, steps, step) {
            return Err(WorkflowError::OutOfOrderDecision {
                step_id,
                sequence: step.sequence,
                blocking_sequence,
            });
        }

        let step = steps
            .iter_mut()
            .find(|s| s.id == step_id)
            .ok_or(WorkflowError::StepNotFound(step_id))?;
        step.record(decision, comments, now)?;
        Ok(step.clone())
    }

    /// Returns the steps `approver_id` can act on right now.
    #[must_use]
    pub fn pending_for_approver(
        mode: ApprovalMode,
        steps: &[ApprovalStep],
        approver_id: Uuid,
    ) -> Vec<&ApprovalStep> {
        steps
            .iter()
            .filter(|s| s.approver_id == approver_id)
            .filter(|s| Self::is_turn(mode, steps, s))
            .collect()
    }
}
