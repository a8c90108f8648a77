//! Approval rule repository.
//!
//! Rules are edited in place with a bumped version. Expenses snapshot the
//! rule at submission, so edits only affect later submissions.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use spendflow_core::workflow::{ApprovalMode, ApprovalPolicy, ApprovalRule, WorkflowError};

use crate::entities::{approval_rule_approvers, approval_rules};

/// Input for creating an approval rule.
#[derive(Debug, Clone)]
pub struct CreateRuleInput {
    /// Owning company.
    pub company_id: Uuid,
    /// Display name.
    pub name: String,
    /// Approvers in decision order.
    pub approvers: Vec<Uuid>,
    /// How decisions combine.
    pub mode: ApprovalMode,
    /// Threshold for parallel rules; ignored (stored as 100) for sequential ones.
    pub min_approval_percent: u8,
}

/// Input for editing an approval rule. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct UpdateRuleInput {
    /// New display name.
    pub name: Option<String>,
    /// New approver list, replacing the old one entirely.
    pub approvers: Option<Vec<Uuid>>,
    /// New approval mode.
    pub mode: Option<ApprovalMode>,
    /// New parallel threshold.
    pub min_approval_percent: Option<u8>,
}

/// Repository for approval rule operations.
#[derive(Debug, Clone)]
pub struct ApprovalRuleRepository {
    db: DatabaseConnection,
}

impl ApprovalRuleRepository {
    /// Creates a new approval rule repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a new approval rule at version 1.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::InvalidRule` if the rule is malformed.
    pub async fn create_rule(&self, input: CreateRuleInput) -> Result<ApprovalRule, WorkflowError> {
        let policy = ApprovalPolicy::new(input.mode, input.min_approval_percent)?;
        let rule = ApprovalRule::new(
            Uuid::now_v7(),
            input.company_id,
            input.name,
            input.approvers,
            policy,
            1,
        )?;

        let txn = self.db.begin().await.map_err(db_err)?;
        let now = Utc::now();

        approval_rules::ActiveModel {
            id: Set(rule.id),
            company_id: Set(rule.company_id),
            name: Set(rule.name.clone()),
            mode: Set(rule.mode().into()),
            min_approval_percent: Set(i16::from(rule.policy.min_approval_percent())),
            version: Set(rule.version),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        insert_approvers(&txn, rule.id, &rule.approvers).await?;

        txn.commit().await.map_err(db_err)?;

        info!(
            rule_id = %rule.id,
            company_id = %rule.company_id,
            approvers = rule.approvers.len(),
            mode = %rule.mode(),
            "approval rule created"
        );

        Ok(rule)
    }

    /// Gets a rule by ID, active or not.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::RuleNotFound` if no such rule exists.
    pub async fn get_rule(&self, rule_id: Uuid) -> Result<ApprovalRule, WorkflowError> {
        let model = approval_rules::Entity::find_by_id(rule_id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(WorkflowError::RuleNotFound(rule_id))?;

        load_rule(&self.db, model).await
    }

    /// Resolves the active rule used for a new submission.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::RuleNotFound` if the rule is unknown or inactive.
    pub async fn resolve(&self, rule_id: Uuid) -> Result<ApprovalRule, WorkflowError> {
        resolve_active(&self.db, rule_id).await
    }

    /// Lists the active rules of a company, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::Database` on query failure.
    pub async fn list_rules(&self, company_id: Uuid) -> Result<Vec<ApprovalRule>, WorkflowError> {
        let models = approval_rules::Entity::find()
            .filter(approval_rules::Column::CompanyId.eq(company_id))
            .filter(approval_rules::Column::IsActive.eq(true))
            .order_by_asc(approval_rules::Column::Name)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let mut rules = Vec::with_capacity(models.len());
        for model in models {
            rules.push(load_rule(&self.db, model).await?);
        }
        Ok(rules)
    }

    /// Edits an active rule and bumps its version.
    ///
    /// A new approver list replaces the old one. Expenses already submitted
    /// keep the snapshot they were created with.
    ///
    /// # Errors
    ///
    /// - `WorkflowError::RuleNotFound` if the rule is unknown or inactive
    /// - `WorkflowError::InvalidRule` if the edited rule is malformed
    pub async fn update_rule(
        &self,
        rule_id: Uuid,
        input: UpdateRuleInput,
    ) -> Result<ApprovalRule, WorkflowError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let current = resolve_active(&txn, rule_id).await?;

        let mode = input.mode.unwrap_or(current.mode());
        let percent = input
            .min_approval_percent
            .unwrap_or(current.policy.min_approval_percent());
        let policy = ApprovalPolicy::new(mode, percent)?;
        let approvers_changed = input.approvers.is_some();

        let updated = ApprovalRule::new(
            current.id,
            current.company_id,
            input.name.unwrap_or(current.name),
            input.approvers.unwrap_or(current.approvers),
            policy,
            current.version + 1,
        )?;

        approval_rules::ActiveModel {
            id: Set(updated.id),
            name: Set(updated.name.clone()),
            mode: Set(updated.mode().into()),
            min_approval_percent: Set(i16::from(updated.policy.min_approval_percent())),
            version: Set(updated.version),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(&txn)
        .await
        .map_err(db_err)?;

        if approvers_changed {
            approval_rule_approvers::Entity::delete_many()
                .filter(approval_rule_approvers::Column::RuleId.eq(rule_id))
                .exec(&txn)
                .await
                .map_err(db_err)?;
            insert_approvers(&txn, rule_id, &updated.approvers).await?;
        }

        txn.commit().await.map_err(db_err)?;

        info!(rule_id = %rule_id, version = updated.version, "approval rule updated");

        Ok(updated)
    }

    /// Soft deletes a rule. Existing expenses keep evaluating against their snapshot.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::RuleNotFound` if the rule is unknown or already inactive.
    pub async fn deactivate_rule(&self, rule_id: Uuid) -> Result<(), WorkflowError> {
        let result = approval_rules::Entity::update_many()
            .set(approval_rules::ActiveModel {
                is_active: Set(false),
                updated_at: Set(Utc::now()),
                ..Default::default()
            })
            .filter(approval_rules::Column::Id.eq(rule_id))
            .filter(approval_rules::Column::IsActive.eq(true))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(WorkflowError::RuleNotFound(rule_id));
        }

        info!(rule_id = %rule_id, "approval rule deactivated");
        Ok(())
    }
}

/// Loads an active rule with its approvers on any connection or transaction.
pub(crate) async fn resolve_active<C: ConnectionTrait>(
    conn: &C,
    rule_id: Uuid,
) -> Result<ApprovalRule, WorkflowError> {
    let model = approval_rules::Entity::find_by_id(rule_id)
        .filter(approval_rules::Column::IsActive.eq(true))
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or(WorkflowError::RuleNotFound(rule_id))?;

    load_rule(conn, model).await
}

async fn load_rule<C: ConnectionTrait>(
    conn: &C,
    model: approval_rules::Model,
) -> Result<ApprovalRule, WorkflowError> {
    let approvers = approval_rule_approvers::Entity::find()
        .filter(approval_rule_approvers::Column::RuleId.eq(model.id))
        .order_by_asc(approval_rule_approvers::Column::Position)
        .all(conn)
        .await
        .map_err(db_err)?
        .into_iter()
        .map(|a| a.approver_id)
        .collect();

    let percent = u8::try_from(model.min_approval_percent).map_err(|_| {
        WorkflowError::Database(format!(
            "rule {} has a corrupt approval threshold: {}",
            model.id, model.min_approval_percent
        ))
    })?;

    Ok(ApprovalRule {
        id: model.id,
        company_id: model.company_id,
        name: model.name,
        approvers,
        policy: ApprovalPolicy::new(model.mode.into(), percent)?,
        version: model.version,
    })
}

async fn insert_approvers<C: ConnectionTrait>(
    conn: &C,
    rule_id: Uuid,
    approvers: &[Uuid],
) -> Result<(), WorkflowError> {
    let rows = approvers
        .iter()
        .zip(1i32..)
        .map(|(approver_id, position)| approval_rule_approvers::ActiveModel {
            id: Set(Uuid::now_v7()),
            rule_id: Set(rule_id),
            approver_id: Set(*approver_id),
            position: Set(position),
        });

    approval_rule_approvers::Entity::insert_many(rows)
        .exec(conn)
        .await
        .map_err(db_err)?;

    Ok(())
}

pub(crate) fn db_err(e: sea_orm::DbErr) -> WorkflowError {
    WorkflowError::Database(e.to_string())
}
