//! Approval rule model.
//!
//! A rule is one company's approval policy: an ordered list of approvers
//! plus the way their decisions are combined. Expenses keep a snapshot of
//! the rule they were submitted under, so later edits never reach
//! in-flight approvals.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::workflow::error::WorkflowError;
use crate::workflow::types::ApprovalMode;

/// Largest valid approval threshold.
pub const MAX_APPROVAL_PERCENT: u8 = 100;

/// How approver decisions combine into an outcome.
///
/// Each variant carries exactly the data its evaluation needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ApprovalPolicy {
    /// Every approver in turn; any rejection halts the chain.
    Sequential,
    /// Independent approvers; the expense is approved once at least
    /// `min_approval_percent` of them approve.
    Parallel {
        /// Threshold in whole percent, `1..=100`.
        min_approval_percent: u8,
    },
}

impl ApprovalPolicy {
    /// Builds a policy from its stored parts.
    ///
    /// The threshold is validated for both modes even though sequential
    /// evaluation does not consult it.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::InvalidRule` if the threshold is outside `1..=100`.
    pub fn new(mode: ApprovalMode, min_approval_percent: u8) -> Result<Self, WorkflowError> {
        if min_approval_percent == 0 || min_approval_percent > MAX_APPROVAL_PERCENT {
            return Err(WorkflowError::InvalidRule(format!(
                "minimum approval percent must be between 1 and 100, got {min_approval_percent}"
            )));
        }

        Ok(match mode {
            ApprovalMode::Sequential => Self::Sequential,
            ApprovalMode::Parallel => Self::Parallel {
                min_approval_percent,
            },
        })
    }

    /// Returns the approval mode.
    #[must_use]
    pub fn mode(&self) -> ApprovalMode {
        match self {
            Self::Sequential => ApprovalMode::Sequential,
            Self::Parallel { .. } => ApprovalMode::Parallel,
        }
    }

    /// Returns the effective approval threshold.
    ///
    /// Sequential chains need every approver, which is a 100% threshold.
    #[must_use]
    pub fn min_approval_percent(&self) -> u8 {
        match self {
            Self::Sequential => MAX_APPROVAL_PERCENT,
            Self::Parallel {
                min_approval_percent,
            } => *min_approval_percent,
        }
    }
}

/// A company's approval rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRule {
    /// Unique identifier for the rule.
    pub id: Uuid,
    /// The company that owns the rule.
    pub company_id: Uuid,
    /// Human-readable name for the rule.
    pub name: String,
    /// Approvers in decision order.
    pub approvers: Vec<Uuid>,
    /// How decisions combine.
    pub policy: ApprovalPolicy,
    /// Incremented on every edit.
    pub version: i32,
}

impl ApprovalRule {
    /// Creates a validated rule.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::InvalidRule` if the rule is malformed.
    pub fn new(
        id: Uuid,
        company_id: Uuid,
        name: impl Into<String>,
        approvers: Vec<Uuid>,
        policy: ApprovalPolicy,
        version: i32,
    ) -> Result<Self, WorkflowError> {
        let rule = Self {
            id,
            company_id,
            name: name.into(),
            approvers,
            policy,
            version,
        };
        rule.validate()?;
        Ok(rule)
    }

    /// Validates the rule.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::InvalidRule` when:
    /// - the name is blank
    /// - there are no approvers
    /// - an approver is listed twice
    /// - the version is not positive
    pub fn validate(&self) -> Result<(), WorkflowError> {
        if self.name.trim().is_empty() {
            return Err(WorkflowError::InvalidRule("name is required".to_string()));
        }

        Self::validate_approvers(&self.approvers)?;

        if self.version < 1 {
            return Err(WorkflowError::InvalidRule(format!(
                "version must be positive, got {}",
                self.version
            )));
        }

        // Re-check the threshold in case the policy was built by hand.
        ApprovalPolicy::new(self.policy.mode(), self.policy.min_approval_percent())?;
        Ok(())
    }

    /// Validates an approver list: non-empty and free of duplicates.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::InvalidRule` if the list is empty or repeats an approver.
    pub fn validate_approvers(approvers: &[Uuid]) -> Result<(), WorkflowError> {
        if approvers.is_empty() {
            return Err(WorkflowError::InvalidRule(
                "at least one approver is required".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(approvers.len());
        for approver in approvers {
            if !seen.insert(approver) {
                return Err(WorkflowError::InvalidRule(format!(
                    "approver {approver} is listed more than once"
                )));
            }
        }
        Ok(())
    }

    /// Returns the rule's approval mode.
    #[must_use]
    pub fn mode(&self) -> ApprovalMode {
        self.policy.mode()
    }

    /// Takes an immutable snapshot for a new expense.
    #[must_use]
    pub fn snapshot(&self) -> RuleSnapshot {
        RuleSnapshot {
            rule_id: self.id,
            rule_version: self.version,
            approvers: self.approvers.clone(),
            policy: self.policy,
        }
    }
}

/// The part of a rule an expense carries from submission onwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSnapshot {
    /// Rule the snapshot was taken from.
    pub rule_id: Uuid,
    /// Version of the rule at snapshot time.
    pub rule_version: i32,
    /// Approvers in decision order.
    pub approvers: Vec<Uuid>,
    /// How decisions combine.
    pub policy: ApprovalPolicy,
}
