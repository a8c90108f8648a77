//! Shared errors, configuration, and common types for Spendflow.
//!
//! This crate provides common types used across all other crates:
//! - Application-wide error taxonomy
//! - Configuration management
//! - Pagination types for list queries

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, DatabaseConfig, LoggingConfig, WorkflowConfig};
pub use error::{AppError, AppResult};
pub use types::{PageMeta, PageRequest, PageResponse};
