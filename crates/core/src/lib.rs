//! Core business logic for Spendflow.
//!
//! This crate contains the approval engine with ZERO web or database
//! dependencies. Rule validation, step ledger transitions, outcome
//! evaluation and the expense state machine all live here; persistence
//! and event delivery are layered on top by `spendflow-db`.
//!
//! # Modules
//!
//! - `workflow` - Expense approval rules, steps, evaluation and transitions

pub mod workflow;
