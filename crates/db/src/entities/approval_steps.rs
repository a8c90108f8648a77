//! `SeaORM` Entity for approval_steps table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use spendflow_core::workflow::{ApprovalStep, WorkflowError};

use super::sea_orm_active_enums::StepDecision;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "approval_steps")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub expense_id: Uuid,
    pub approver_id: Uuid,
    pub sequence: i32,
    pub decision: StepDecision,
    pub decided_at: Option<DateTimeUtc>,
    pub comments: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::expenses::Entity",
        from = "Column::ExpenseId",
        to = "super::expenses::Column::Id",
        on_delete = "Cascade"
    )]
    Expenses,
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for ApprovalStep {
    type Error = WorkflowError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let sequence = u32::try_from(model.sequence).map_err(|_| {
            WorkflowError::Database(format!(
                "step {} has a negative sequence: {}",
                model.id, model.sequence
            ))
        })?;

        Ok(Self {
            id: model.id,
            expense_id: model.expense_id,
            approver_id: model.approver_id,
            sequence,
            decision: model.decision.into(),
            decided_at: model.decided_at,
            comments: model.comments,
            created_at: model.created_at,
        })
    }
}

impl TryFrom<&ApprovalStep> for ActiveModel {
    type Error = WorkflowError;

    fn try_from(step: &ApprovalStep) -> Result<Self, Self::Error> {
        use sea_orm::ActiveValue::Set;

        let sequence = i32::try_from(step.sequence)
            .map_err(|_| WorkflowError::InvalidRule(format!("too many approvers: {}", step.sequence)))?;

        Ok(Self {
            id: Set(step.id),
            expense_id: Set(step.expense_id),
            approver_id: Set(step.approver_id),
            sequence: Set(sequence),
            decision: Set(step.decision.into()),
            decided_at: Set(step.decided_at),
            comments: Set(step.comments.clone()),
            created_at: Set(step.created_at),
        })
    }
}
