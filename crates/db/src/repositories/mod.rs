//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod approval_rule;
pub mod locks;
pub mod workflow;

pub use approval_rule::{ApprovalRuleRepository, CreateRuleInput, UpdateRuleInput};
pub use locks::{ExpenseGuard, ExpenseLocks};
pub use workflow::{PendingApproval, WorkflowRepository};
