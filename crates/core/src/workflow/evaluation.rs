//! Evaluation engine: turns a ledger snapshot into an expense status.
//!
//! Evaluation is pure and deterministic. All percentage arithmetic is done
//! on integers and rounds toward zero, so `2 of 3` approvals is 66%, not
//! 66.67% and never 67%.

use serde::{Deserialize, Serialize};

use crate::workflow::ledger::ApprovalStep;
use crate::workflow::rule::ApprovalPolicy;
use crate::workflow::types::{ExpenseStatus, StepDecision};

/// Decision counts over a set of steps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    /// Number of steps.
    pub total: u32,
    /// Steps decided `Approved`.
    pub approved: u32,
    /// Steps decided `Rejected`.
    pub rejected: u32,
    /// Steps still `Pending`.
    pub pending: u32,
}

impl Tally {
    /// Counts the decisions in `steps`.
    #[must_use]
    pub fn of(steps: &[ApprovalStep]) -> Self {
        steps.iter().fold(Self::default(), |mut tally, step| {
            tally.total += 1;
            match step.decision {
                StepDecision::Approved => tally.approved += 1,
                StepDecision::Rejected => tally.rejected += 1,
                StepDecision::Pending => tally.pending += 1,
            }
            tally
        })
    }

    /// Percentage of steps approved so far, rounded down.
    #[must_use]
    pub fn approved_percent(&self) -> u32 {
        EvaluationEngine::percent(self.approved, self.total)
    }

    /// Best percentage still reachable if every pending step approves, rounded down.
    #[must_use]
    pub fn reachable_percent(&self) -> u32 {
        EvaluationEngine::percent(self.approved + self.pending, self.total)
    }
}

/// Stateless engine for evaluating approval ledgers.
pub struct EvaluationEngine;

impl EvaluationEngine {
    /// Computes the status an expense should have given its steps.
    ///
    /// # Arguments
    /// * `policy` - The policy snapshot taken at submission
    /// * `steps` - Every step of the expense, in any order
    ///
    /// # Returns
    /// `Approved` or `Rejected` once the outcome is certain, `Pending` otherwise.
    /// An empty ledger is `Pending`.
    #[must_use]
    pub fn evaluate(policy: &ApprovalPolicy, steps: &[ApprovalStep]) -> ExpenseStatus {
        if steps.is_empty() {
            return ExpenseStatus::Pending;
        }

        match policy {
            ApprovalPolicy::Sequential => Self::evaluate_sequential(steps),
            ApprovalPolicy::Parallel {
                min_approval_percent,
            } => Self::evaluate_parallel(u32::from(*min_approval_percent), Tally::of(steps)),
        }
    }

    /// Sequential chain: the first rejection ends it, full approval completes it.
    fn evaluate_sequential(steps: &[ApprovalStep]) -> ExpenseStatus {
        let tally = Tally::of(steps);
        if tally.rejected > 0 {
            ExpenseStatus::Rejected
        } else if tally.approved == tally.total {
            ExpenseStatus::Approved
        } else {
            ExpenseStatus::Pending
        }
    }

    /// Parallel consensus with early exit in both directions.
    fn evaluate_parallel(min_approval_percent: u32, tally: Tally) -> ExpenseStatus {
        if tally.approved_percent() >= min_approval_percent {
            ExpenseStatus::Approved
        } else if tally.reachable_percent() < min_approval_percent {
            ExpenseStatus::Rejected
        } else {
            ExpenseStatus::Pending
        }
    }

    /// `floor(100 * part / total)`; zero when `total` is zero.
    #[must_use]
    pub fn percent(part: u32, total: u32) -> u32 {
        if total == 0 {
            return 0;
        }
        let scaled = u64::from(part) * 100 / u64::from(total);
        u32::try_from(scaled).unwrap_or(u32::MAX)
    }

    /// Returns the step currently awaiting a decision in a sequential chain.
    ///
    /// `None` once the chain reached an outcome.
    #[must_use]
    pub fn current_step(steps: &[ApprovalStep]) -> Option<&ApprovalStep> {
        if Self::evaluate_sequential(steps) != ExpenseStatus::Pending {
            return None;
        }
        steps
            .iter()
            .filter(|s| s.is_pending())
            .min_by_key(|s| s.sequence)
    }
}
