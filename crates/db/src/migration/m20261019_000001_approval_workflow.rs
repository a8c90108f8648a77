//! Approval workflow schema.
//!
//! Creates rules, their ordered approvers, expenses, and the step ledger.
//! Built with the schema builder so it runs on PostgreSQL and SQLite alike.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DatabaseBackend;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ApprovalRules::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ApprovalRules::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(ApprovalRules::CompanyId).uuid().not_null())
                    .col(ColumnDef::new(ApprovalRules::Name).string_len(200).not_null())
                    .col(ColumnDef::new(ApprovalRules::Mode).string_len(16).not_null())
                    .col(
                        ColumnDef::new(ApprovalRules::MinApprovalPercent)
                            .small_integer()
                            .not_null()
                            .check(
                                Expr::col(ApprovalRules::MinApprovalPercent)
                                    .between(1, 100),
                            ),
                    )
                    .col(
                        ColumnDef::new(ApprovalRules::Version)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(ApprovalRules::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(ApprovalRules::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ApprovalRules::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_approval_rules_company")
                    .table(ApprovalRules::Table)
                    .col(ApprovalRules::CompanyId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ApprovalRuleApprovers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ApprovalRuleApprovers::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ApprovalRuleApprovers::RuleId).uuid().not_null())
                    .col(
                        ColumnDef::new(ApprovalRuleApprovers::ApproverId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ApprovalRuleApprovers::Position)
                            .integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rule_approvers_rule")
                            .from(ApprovalRuleApprovers::Table, ApprovalRuleApprovers::RuleId)
                            .to(ApprovalRules::Table, ApprovalRules::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_rule_approvers_approver")
                    .table(ApprovalRuleApprovers::Table)
                    .col(ApprovalRuleApprovers::RuleId)
                    .col(ApprovalRuleApprovers::ApproverId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_rule_approvers_position")
                    .table(ApprovalRuleApprovers::Table)
                    .col(ApprovalRuleApprovers::RuleId)
                    .col(ApprovalRuleApprovers::Position)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Expenses::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Expenses::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Expenses::SubmitterId).uuid().not_null())
                    .col(ColumnDef::new(Expenses::CompanyId).uuid().not_null())
                    .col(amount_column(manager.get_database_backend()).not_null())
                    .col(ColumnDef::new(Expenses::Currency).string_len(3).not_null())
                    .col(ColumnDef::new(Expenses::Category).string_len(100).not_null())
                    .col(ColumnDef::new(Expenses::Description).text())
                    .col(ColumnDef::new(Expenses::ExpenseDate).date().not_null())
                    .col(ColumnDef::new(Expenses::ReceiptUrl).text())
                    .col(ColumnDef::new(Expenses::Status).string_len(16).not_null())
                    .col(ColumnDef::new(Expenses::RuleId).uuid().not_null())
                    .col(ColumnDef::new(Expenses::RuleVersion).integer().not_null())
                    .col(ColumnDef::new(Expenses::ApprovalMode).string_len(16).not_null())
                    .col(
                        ColumnDef::new(Expenses::MinApprovalPercent)
                            .small_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Expenses::Version)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(Expenses::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Expenses::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expenses_rule")
                            .from(Expenses::Table, Expenses::RuleId)
                            .to(ApprovalRules::Table, ApprovalRules::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_expenses_submitter")
                    .table(Expenses::Table)
                    .col(Expenses::SubmitterId)
                    .col(Expenses::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_expenses_company_status")
                    .table(Expenses::Table)
                    .col(Expenses::CompanyId)
                    .col(Expenses::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ApprovalSteps::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ApprovalSteps::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(ApprovalSteps::ExpenseId).uuid().not_null())
                    .col(ColumnDef::new(ApprovalSteps::ApproverId).uuid().not_null())
                    .col(ColumnDef::new(ApprovalSteps::Sequence).integer().not_null())
                    .col(ColumnDef::new(ApprovalSteps::Decision).string_len(16).not_null())
                    .col(ColumnDef::new(ApprovalSteps::DecidedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(ApprovalSteps::Comments).text())
                    .col(
                        ColumnDef::new(ApprovalSteps::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_approval_steps_expense")
                            .from(ApprovalSteps::Table, ApprovalSteps::ExpenseId)
                            .to(Expenses::Table, Expenses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_approval_steps_approver")
                    .table(ApprovalSteps::Table)
                    .col(ApprovalSteps::ExpenseId)
                    .col(ApprovalSteps::ApproverId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_approval_steps_sequence")
                    .table(ApprovalSteps::Table)
                    .col(ApprovalSteps::ExpenseId)
                    .col(ApprovalSteps::Sequence)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Inbox lookups: pending steps by approver
        manager
            .create_index(
                Index::create()
                    .name("idx_approval_steps_approver_decision")
                    .table(ApprovalSteps::Table)
                    .col(ApprovalSteps::ApproverId)
                    .col(ApprovalSteps::Decision)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ApprovalSteps::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Expenses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ApprovalRuleApprovers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ApprovalRules::Table).to_owned())
            .await?;
        Ok(())
    }
}

/// `DECIMAL(19, 4)` where supported. SQLite caps declared precision at 16.
fn amount_column(backend: DatabaseBackend) -> ColumnDef {
    let mut column = ColumnDef::new(Expenses::Amount);
    if backend == DatabaseBackend::Sqlite {
        column.decimal_len(16, 4);
    } else {
        column.decimal_len(19, 4);
    }
    column
}

#[derive(DeriveIden)]
enum ApprovalRules {
    Table,
    Id,
    CompanyId,
    Name,
    Mode,
    MinApprovalPercent,
    Version,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ApprovalRuleApprovers {
    Table,
    Id,
    RuleId,
    ApproverId,
    Position,
}

#[derive(DeriveIden)]
enum Expenses {
    Table,
    Id,
    SubmitterId,
    CompanyId,
    Amount,
    Currency,
    Category,
    Description,
    ExpenseDate,
    ReceiptUrl,
    Status,
    RuleId,
    RuleVersion,
    ApprovalMode,
    MinApprovalPercent,
    Version,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ApprovalSteps {
    Table,
    Id,
    ExpenseId,
    ApproverId,
    Sequence,
    Decision,
    DecidedAt,
    Comments,
    CreatedAt,
}
