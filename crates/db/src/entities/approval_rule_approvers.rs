//! `SeaORM` Entity for approval_rule_approvers table.
//!
//! One row per approver; `position` keeps the rule order (1-based).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "approval_rule_approvers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub rule_id: Uuid,
    pub approver_id: Uuid,
    pub position: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::approval_rules::Entity",
        from = "Column::RuleId",
        to = "super::approval_rules::Column::Id",
        on_delete = "Cascade"
    )]
    ApprovalRules,
}

impl Related<super::approval_rules::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApprovalRules.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
