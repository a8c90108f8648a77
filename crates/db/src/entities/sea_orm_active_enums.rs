//! Text-backed enums shared by the workflow tables.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use spendflow_core::workflow::types as domain;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum ExpenseStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum StepDecision {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum ApprovalMode {
    #[sea_orm(string_value = "sequential")]
    Sequential,
    #[sea_orm(string_value = "parallel")]
    Parallel,
}

impl From<ExpenseStatus> for domain::ExpenseStatus {
    fn from(value: ExpenseStatus) -> Self {
        match value {
            ExpenseStatus::Pending => Self::Pending,
            ExpenseStatus::Approved => Self::Approved,
            ExpenseStatus::Rejected => Self::Rejected,
        }
    }
}

impl From<domain::ExpenseStatus> for ExpenseStatus {
    fn from(value: domain::ExpenseStatus) -> Self {
        match value {
            domain::ExpenseStatus::Pending => Self::Pending,
            domain::ExpenseStatus::Approved => Self::Approved,
            domain::ExpenseStatus::Rejected => Self::Rejected,
        }
    }
}

impl From<StepDecision> for domain::StepDecision {
    fn from(value: StepDecision) -> Self {
        match value {
            StepDecision::Pending => Self::Pending,
            StepDecision::Approved => Self::Approved,
            StepDecision::Rejected => Self::Rejected,
        }
    }
}

impl From<domain::StepDecision> for StepDecision {
    fn from(value: domain::StepDecision) -> Self {
        match value {
            domain::StepDecision::Pending => Self::Pending,
            domain::StepDecision::Approved => Self::Approved,
            domain::StepDecision::Rejected => Self::Rejected,
        }
    }
}

impl From<ApprovalMode> for domain::ApprovalMode {
    fn from(value: ApprovalMode) -> Self {
        match value {
            ApprovalMode::Sequential => Self::Sequential,
            ApprovalMode::Parallel => Self::Parallel,
        }
    }
}

impl From<domain::ApprovalMode> for ApprovalMode {
    fn from(value: domain::ApprovalMode) -> Self {
        match value {
            domain::ApprovalMode::Sequential => Self::Sequential,
            domain::ApprovalMode::Parallel => Self::Parallel,
        }
    }
}
