//! `SeaORM` Entity for expenses table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use spendflow_core::workflow::{ApprovalPolicy, Expense, WorkflowError};

use super::sea_orm_active_enums::{ApprovalMode, ExpenseStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub submitter_id: Uuid,
    pub company_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub amount: Decimal,
    pub currency: String,
    pub category: String,
    pub description: Option<String>,
    pub expense_date: Date,
    pub receipt_url: Option<String>,
    pub status: ExpenseStatus,
    pub rule_id: Uuid,
    pub rule_version: i32,
    pub approval_mode: ApprovalMode,
    pub min_approval_percent: i16,
    pub version: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::approval_rules::Entity",
        from = "Column::RuleId",
        to = "super::approval_rules::Column::Id"
    )]
    ApprovalRules,
    #[sea_orm(has_many = "super::approval_steps::Entity")]
    ApprovalSteps,
}

impl Related<super::approval_rules::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApprovalRules.def()
    }
}

impl Related<super::approval_steps::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApprovalSteps.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Expense {
    type Error = WorkflowError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let percent = u8::try_from(model.min_approval_percent).map_err(|_| {
            WorkflowError::Database(format!(
                "expense {} has a corrupt approval threshold: {}",
                model.id, model.min_approval_percent
            ))
        })?;
        let policy = ApprovalPolicy::new(model.approval_mode.into(), percent)?;

        Ok(Self {
            id: model.id,
            submitter_id: model.submitter_id,
            company_id: model.company_id,
            amount: model.amount,
            currency: model.currency,
            category: model.category,
            description: model.description,
            expense_date: model.expense_date,
            receipt_url: model.receipt_url,
            status: model.status.into(),
            rule_id: model.rule_id,
            rule_version: model.rule_version,
            policy,
            version: model.version,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

impl From<&Expense> for ActiveModel {
    fn from(expense: &Expense) -> Self {
        use sea_orm::ActiveValue::Set;

        Self {
            id: Set(expense.id),
            submitter_id: Set(expense.submitter_id),
            company_id: Set(expense.company_id),
            amount: Set(expense.amount),
            currency: Set(expense.currency.clone()),
            category: Set(expense.category.clone()),
            description: Set(expense.description.clone()),
            expense_date: Set(expense.expense_date),
            receipt_url: Set(expense.receipt_url.clone()),
            status: Set(expense.status.into()),
            rule_id: Set(expense.rule_id),
            rule_version: Set(expense.rule_version),
            approval_mode: Set(expense.policy.mode().into()),
            min_approval_percent: Set(i16::from(expense.policy.min_approval_percent())),
            version: Set(expense.version),
            created_at: Set(expense.created_at),
            updated_at: Set(expense.updated_at),
        }
    }
}
