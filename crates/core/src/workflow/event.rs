//! Workflow events published to subscribers such as notifiers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::workflow::types::ExpenseStatus;

/// Emitted exactly once when an expense reaches a terminal status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChanged {
    /// The expense that changed.
    pub expense_id: Uuid,
    /// Its new (terminal) status.
    pub status: ExpenseStatus,
    /// When the transition was committed.
    pub occurred_at: DateTime<Utc>,
}
