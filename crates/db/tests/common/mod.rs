//! Shared fixtures for the database integration tests.
//!
//! Each test gets a private in-memory SQLite database with migrations applied.
//! The pool is capped at one connection because every SQLite memory
//! connection opens its own empty database.

#![allow(dead_code)]

use chrono::NaiveDate;
use rust_decimal_macros::dec;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use uuid::Uuid;

use spendflow_core::workflow::{ApprovalMode, ApprovalRule, ExpenseDraft};
use spendflow_db::migration::{Migrator, MigratorTrait};
use spendflow_db::{ApprovalRuleRepository, CreateRuleInput};

pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .expect("Failed to open in-memory database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

pub fn approvers(n: usize) -> Vec<Uuid> {
    (0..n).map(|_| Uuid::new_v4()).collect()
}

pub async fn create_rule(
    db: &DatabaseConnection,
    company_id: Uuid,
    approvers: Vec<Uuid>,
    mode: ApprovalMode,
    min_approval_percent: u8,
) -> ApprovalRule {
    ApprovalRuleRepository::new(db.clone())
        .create_rule(CreateRuleInput {
            company_id,
            name: format!("{mode} rule"),
            approvers,
            mode,
            min_approval_percent,
        })
        .await
        .expect("Failed to create rule")
}

pub fn draft(submitter_id: Uuid, company_id: Uuid) -> ExpenseDraft {
    ExpenseDraft {
        submitter_id,
        company_id,
        amount: dec!(120.50),
        currency: "USD".to_string(),
        category: "Travel".to_string(),
        description: Some("Client visit taxi".to_string()),
        expense_date: NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
        receipt_url: None,
    }
}
