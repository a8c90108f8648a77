//! Workflow repository: the durable step ledger and the decision controller.
//!
//! Every mutation runs in one database transaction. Decisions on the same
//! expense are serialized in-process by [`ExpenseLocks`] and guarded across
//! processes by two compare-and-swap updates: the step is written only while
//! still pending, and the expense only while its version is unchanged.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use spendflow_core::workflow::{
    ApprovalStep, DecisionOutcome, DecisionRequest, Expense, ExpenseDraft, ExpenseStatus,
    StatusChanged, StepLedger, WorkflowError, WorkflowService,
};
use spendflow_shared::{PageRequest, PageResponse, WorkflowConfig};

use super::approval_rule::{db_err, resolve_active};
use super::locks::ExpenseLocks;
use crate::entities::{approval_steps, expenses, sea_orm_active_enums};

/// A step the approver can act on now, with its expense.
#[derive(Debug, Clone)]
pub struct PendingApproval {
    /// The expense awaiting the decision.
    pub expense: Expense,
    /// The approver's pending step.
    pub step: ApprovalStep,
}

/// Repository for submitting expenses and recording decisions.
#[derive(Debug, Clone)]
pub struct WorkflowRepository {
    db: DatabaseConnection,
    locks: ExpenseLocks,
    events: broadcast::Sender<StatusChanged>,
}

impl WorkflowRepository {
    /// Creates a repository whose event channel holds `event_buffer` events.
    #[must_use]
    pub fn new(db: DatabaseConnection, event_buffer: usize) -> Self {
        let (events, _) = broadcast::channel(event_buffer.max(1));
        Self {
            db,
            locks: ExpenseLocks::new(),
            events,
        }
    }

    /// Creates a repository from the workflow configuration.
    #[must_use]
    pub fn from_config(db: DatabaseConnection, config: &WorkflowConfig) -> Self {
        Self::new(db, config.event_buffer)
    }

    /// Subscribes to status changes published after each terminal transition.
    pub fn subscribe(&self) -> broadcast::Receiver<StatusChanged> {
        self.events.subscribe()
    }

    /// Submits an expense for approval under `rule_id`.
    ///
    /// The rule is snapshotted onto the expense and one pending step per
    /// approver is created, all in one transaction.
    ///
    /// # Errors
    ///
    /// - `WorkflowError::InvalidExpense` if the draft fails validation
    /// - `WorkflowError::RuleNotFound` if the rule is unknown or inactive
    pub async fn submit(
        &self,
        draft: ExpenseDraft,
        rule_id: Uuid,
    ) -> Result<Expense, WorkflowError> {
        draft.validate()?;

        let txn = self.db.begin().await.map_err(db_err)?;

        let rule = resolve_active(&txn, rule_id).await?;
        let submission = WorkflowService::submit(Uuid::now_v7(), draft, &rule, Utc::now())?;

        expenses::Entity::insert(expenses::ActiveModel::from(&submission.expense))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        insert_steps(&txn, submission.expense.id, &submission.steps).await?;

        txn.commit().await.map_err(db_err)?;

        let expense = submission.expense;
        info!(
            expense_id = %expense.id,
            submitter_id = %expense.submitter_id,
            rule_id = %expense.rule_id,
            rule_version = expense.rule_version,
            steps = submission.steps.len(),
            "expense submitted"
        );

        Ok(expense)
    }

    /// Records an approver's decision and re-evaluates the expense.
    ///
    /// A terminal outcome is persisted once and announced on the event
    /// channel after the transaction commits.
    ///
    /// # Errors
    ///
    /// - `WorkflowError::StepNotFound` if the step does not exist
    /// - `WorkflowError::NotApprover` if `acting_approver` does not own the step
    /// - `WorkflowError::StepAlreadyDecided` if the step was already decided
    /// - `WorkflowError::ExpenseAlreadyFinal` if the expense is approved or rejected
    /// - `WorkflowError::OutOfOrderDecision` if an earlier sequential step is open
    /// - `WorkflowError::ConcurrentModification` if another writer changed the expense
    pub async fn decide(
        &self,
        step_id: Uuid,
        request: &DecisionRequest,
        acting_approver: Uuid,
    ) -> Result<Expense, WorkflowError> {
        let expense_id = approval_steps::Entity::find_by_id(step_id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(WorkflowError::StepNotFound(step_id))?
            .expense_id;

        let _guard = self.locks.acquire(expense_id).await;

        let txn = self.db.begin().await.map_err(db_err)?;

        let expense = find_expense(&txn, expense_id).await?;
        let steps = find_steps(&txn, expense_id).await?;

        let outcome = WorkflowService::decide(
            &expense,
            &steps,
            step_id,
            request,
            acting_approver,
            Utc::now(),
        )
        .inspect_err(|e| {
            warn!(
                step_id = %step_id,
                expense_id = %expense_id,
                approver_id = %acting_approver,
                error = %e,
                "decision refused"
            );
        })?;

        persist_decision(&txn, &expense, &outcome).await?;
        let updated = outcome.expense;

        txn.commit().await.map_err(db_err)?;

        debug!(
            step_id = %step_id,
            expense_id = %expense_id,
            approver_id = %acting_approver,
            decision = %outcome.step.decision,
            status = %updated.status,
            "decision recorded"
        );

        if let Some(event) = outcome.event {
            info!(
                expense_id = %event.expense_id,
                status = %event.status,
                "expense finalized"
            );
            self.publish(event);
        }

        Ok(updated)
    }

    /// Gets an expense by ID.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::ExpenseNotFound` if no such expense exists.
    pub async fn get_expense(&self, expense_id: Uuid) -> Result<Expense, WorkflowError> {
        find_expense(&self.db, expense_id).await
    }

    /// Lists an expense's steps ordered by sequence.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::ExpenseNotFound` if no such expense exists.
    pub async fn list_steps_for_expense(
        &self,
        expense_id: Uuid,
    ) -> Result<Vec<ApprovalStep>, WorkflowError> {
        find_expense(&self.db, expense_id).await?;
        find_steps(&self.db, expense_id).await
    }

    /// Lists the steps `approver_id` can decide right now.
    ///
    /// Parallel steps are always actionable; a sequential step only once
    /// every earlier step is approved. Steps of finalized expenses are
    /// never listed. Oldest expenses come first.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::Database` on query failure.
    pub async fn list_pending_for_approver(
        &self,
        approver_id: Uuid,
    ) -> Result<Vec<PendingApproval>, WorkflowError> {
        let expense_ids: Vec<Uuid> = approval_steps::Entity::find()
            .select_only()
            .column(approval_steps::Column::ExpenseId)
            .filter(approval_steps::Column::ApproverId.eq(approver_id))
            .filter(approval_steps::Column::Decision.eq(sea_orm_active_enums::StepDecision::Pending))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(db_err)?;

        if expense_ids.is_empty() {
            return Ok(Vec::new());
        }

        let expenses = expenses::Entity::find()
            .filter(expenses::Column::Id.is_in(expense_ids))
            .filter(expenses::Column::Status.eq(sea_orm_active_enums::ExpenseStatus::Pending))
            .order_by_asc(expenses::Column::CreatedAt)
            .order_by_asc(expenses::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let mut ledgers: HashMap<Uuid, Vec<ApprovalStep>> = HashMap::new();
        for model in approval_steps::Entity::find()
            .filter(approval_steps::Column::ExpenseId.is_in(expenses.iter().map(|e| e.id)))
            .order_by_asc(approval_steps::Column::Sequence)
            .all(&self.db)
            .await
            .map_err(db_err)?
        {
            let step = ApprovalStep::try_from(model)?;
            ledgers.entry(step.expense_id).or_default().push(step);
        }

        let mut pending = Vec::new();
        for model in expenses {
            let expense = Expense::try_from(model)?;
            let Some(steps) = ledgers.get(&expense.id) else {
                continue;
            };
            for step in StepLedger::pending_for_approver(expense.policy.mode(), steps, approver_id)
            {
                pending.push(PendingApproval {
                    expense: expense.clone(),
                    step: step.clone(),
                });
            }
        }

        Ok(pending)
    }

    /// Lists a submitter's expenses, newest first, optionally by status.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::Database` on query failure.
    pub async fn list_expenses_for_submitter(
        &self,
        submitter_id: Uuid,
        status: Option<ExpenseStatus>,
        page: &PageRequest,
    ) -> Result<PageResponse<Expense>, WorkflowError> {
        let mut query =
            expenses::Entity::find().filter(expenses::Column::SubmitterId.eq(submitter_id));
        if let Some(status) = status {
            query = query.filter(
                expenses::Column::Status.eq(sea_orm_active_enums::ExpenseStatus::from(status)),
            );
        }

        let total = query.clone().count(&self.db).await.map_err(db_err)?;

        let data = query
            .order_by_desc(expenses::Column::CreatedAt)
            .order_by_desc(expenses::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(Expense::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PageResponse::new(data, page.page, page.per_page, total))
    }

    /// Lists a company's expenses still awaiting a decision, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::Database` on query failure.
    pub async fn list_pending_expenses_for_company(
        &self,
        company_id: Uuid,
        page: &PageRequest,
    ) -> Result<PageResponse<Expense>, WorkflowError> {
        let query = expenses::Entity::find()
            .filter(expenses::Column::CompanyId.eq(company_id))
            .filter(expenses::Column::Status.eq(sea_orm_active_enums::ExpenseStatus::Pending));

        let total = query.clone().count(&self.db).await.map_err(db_err)?;

        let data = query
            .order_by_asc(expenses::Column::CreatedAt)
            .order_by_asc(expenses::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(Expense::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PageResponse::new(data, page.page, page.per_page, total))
    }

    fn publish(&self, event: StatusChanged) {
        if self.events.send(event).is_err() {
            debug!("no status subscribers");
        }
    }
}

/// Inserts a freshly initiated ledger.
///
/// A clash with the `(expense_id, approver_id)` or `(expense_id, sequence)`
/// unique indexes means the expense already has steps.
pub(crate) async fn insert_steps<C: ConnectionTrait>(
    conn: &C,
    expense_id: Uuid,
    steps: &[ApprovalStep],
) -> Result<(), WorkflowError> {
    let rows = steps
        .iter()
        .map(approval_steps::ActiveModel::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    approval_steps::Entity::insert_many(rows)
        .exec(conn)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                WorkflowError::DuplicateInitiation(expense_id)
            }
            _ => db_err(e),
        })?;

    Ok(())
}

/// Writes an evaluated decision with two compare-and-swap updates.
///
/// The step is written only while still pending, and the expense only while
/// it is pending at the version `before` was read at. Either miss means
/// another writer got there first; the caller's transaction must be dropped.
pub(crate) async fn persist_decision<C: ConnectionTrait>(
    conn: &C,
    before: &Expense,
    outcome: &DecisionOutcome,
) -> Result<(), WorkflowError> {
    let step_id = outcome.step.id;
    let written = approval_steps::Entity::update_many()
        .set(approval_steps::ActiveModel {
            decision: Set(outcome.step.decision.into()),
            decided_at: Set(outcome.step.decided_at),
            comments: Set(outcome.step.comments.clone()),
            ..Default::default()
        })
        .filter(approval_steps::Column::Id.eq(step_id))
        .filter(approval_steps::Column::Decision.eq(sea_orm_active_enums::StepDecision::Pending))
        .exec(conn)
        .await
        .map_err(db_err)?;

    if written.rows_affected != 1 {
        let decision = approval_steps::Entity::find_by_id(step_id)
            .one(conn)
            .await
            .map_err(db_err)?
            .ok_or(WorkflowError::StepNotFound(step_id))?
            .decision;
        warn!(step_id = %step_id, "step decided by another writer");
        return Err(WorkflowError::StepAlreadyDecided {
            step_id,
            decision: decision.into(),
        });
    }

    let updated = &outcome.expense;
    let swapped = expenses::Entity::update_many()
        .set(expenses::ActiveModel {
            status: Set(updated.status.into()),
            version: Set(updated.version),
            updated_at: Set(updated.updated_at),
            ..Default::default()
        })
        .filter(expenses::Column::Id.eq(before.id))
        .filter(expenses::Column::Version.eq(before.version))
        .filter(expenses::Column::Status.eq(sea_orm_active_enums::ExpenseStatus::Pending))
        .exec(conn)
        .await
        .map_err(db_err)?;

    if swapped.rows_affected != 1 {
        warn!(
            expense_id = %before.id,
            version = before.version,
            "expense modified concurrently, rolling back decision"
        );
        return Err(WorkflowError::ConcurrentModification(before.id));
    }

    Ok(())
}

async fn find_expense<C: ConnectionTrait>(
    conn: &C,
    expense_id: Uuid,
) -> Result<Expense, WorkflowError> {
    expenses::Entity::find_by_id(expense_id)
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or(WorkflowError::ExpenseNotFound(expense_id))
        .and_then(Expense::try_from)
}

async fn find_steps<C: ConnectionTrait>(
    conn: &C,
    expense_id: Uuid,
) -> Result<Vec<ApprovalStep>, WorkflowError> {
    approval_steps::Entity::find()
        .filter(approval_steps::Column::ExpenseId.eq(expense_id))
        .order_by_asc(approval_steps::Column::Sequence)
        .all(conn)
        .await
        .map_err(db_err)?
        .into_iter()
        .map(ApprovalStep::try_from)
        .collect()
}
