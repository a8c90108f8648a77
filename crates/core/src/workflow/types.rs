//! Workflow domain types for expense approval.
//!
//! This module defines the status and decision enums shared by the
//! rule model, the step ledger and the evaluation engine.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::workflow::error::WorkflowError;

/// Overall status of an expense in the approval workflow.
///
/// The only valid transitions are:
/// - Pending → Approved
/// - Pending → Rejected
///
/// Both targets are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseStatus {
    /// Waiting for the approval chain to reach an outcome.
    Pending,
    /// The approval chain approved the expense.
    Approved,
    /// The approval chain rejected the expense.
    Rejected,
}

impl ExpenseStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns true if no further transitions are possible.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl fmt::Display for ExpenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Decision recorded on a single approval step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepDecision {
    /// Approver has not decided yet.
    Pending,
    /// Approver approved.
    Approved,
    /// Approver rejected.
    Rejected,
}

impl StepDecision {
    /// Returns the string representation of the decision.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a decision from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns true once the step has been decided.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for StepDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the approvers of a rule are consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalMode {
    /// Approvers decide strictly in order, any rejection halts the chain.
    Sequential,
    /// Approvers decide independently against a percentage threshold.
    Parallel,
}

impl ApprovalMode {
    /// Returns the string representation of the mode.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Parallel => "parallel",
        }
    }

    /// Parses a mode from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sequential" => Some(Self::Sequential),
            "parallel" => Some(Self::Parallel),
            _ => None,
        }
    }
}

impl fmt::Display for ApprovalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A terminal decision submitted by an approver.
///
/// Unlike [`StepDecision`] this cannot be `Pending`, so a decision payload
/// that asks to "un-decide" a step is rejected at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// Approve the step.
    Approved,
    /// Reject the step.
    Rejected,
}

impl Decision {
    /// Parses a decision payload value.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::InvalidDecision` for anything other than
    /// `approved` or `rejected`.
    pub fn parse(s: &str) -> Result<Self, WorkflowError> {
        match StepDecision::parse(s) {
            Some(decision) => Self::try_from(decision),
            None => Err(WorkflowError::InvalidDecision(s.to_string())),
        }
    }
}

impl From<Decision> for StepDecision {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Approved => Self::Approved,
            Decision::Rejected => Self::Rejected,
        }
    }
}

impl TryFrom<StepDecision> for Decision {
    type Error = WorkflowError;

    fn try_from(decision: StepDecision) -> Result<Self, Self::Error> {
        match decision {
            StepDecision::Approved => Ok(Self::Approved),
            StepDecision::Rejected => Ok(Self::Rejected),
            StepDecision::Pending => Err(WorkflowError::InvalidDecision(
                decision.as_str().to_string(),
            )),
        }
    }
}

/// Decision payload: `{ decision, comments? }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRequest {
    /// The decision being recorded.
    pub decision: Decision,
    /// Optional free-text comments from the approver.
    #[serde(default)]
    pub comments: Option<String>,
}

impl DecisionRequest {
    /// Creates an approval payload.
    #[must_use]
    pub fn approve(comments: Option<String>) -> Self {
        Self {
            decision: Decision::Approved,
            comments,
        }
    }

    /// Creates a rejection payload.
    #[must_use]
    pub fn reject(comments: Option<String>) -> Self {
        Self {
            decision: Decision::Rejected,
            comments,
        }
    }

    /// Returns the comments with surrounding whitespace removed, dropping blanks.
    #[must_use]
    pub fn normalized_comments(&self) -> Option<String> {
        self.comments
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
    }
}
