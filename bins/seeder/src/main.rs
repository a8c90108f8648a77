//! Database seeder for Spendflow development and testing.
//!
//! Seeds a demo company's approval rules, then walks one expense through a
//! sequential chain and one through a parallel panel, logging every
//! status change the workflow announces.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm_migration::MigratorTrait;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use spendflow_core::workflow::{ApprovalMode, ApprovalRule, DecisionRequest, ExpenseDraft};
use spendflow_db::migration::Migrator;
use spendflow_db::{ApprovalRuleRepository, CreateRuleInput, WorkflowRepository};
use spendflow_shared::{AppConfig, AppError};

/// Demo company (consistent for all seeds)
const DEMO_COMPANY_ID: Uuid = Uuid::from_u128(0x0000_0001);
/// Demo employee submitting every expense
const DEMO_SUBMITTER_ID: Uuid = Uuid::from_u128(0x0000_0002);

/// Manager, finance, director
const CHAIN: [Uuid; 3] = [
    Uuid::from_u128(0x0000_0101),
    Uuid::from_u128(0x0000_0102),
    Uuid::from_u128(0x0000_0103),
];

/// Five-member review panel
const PANEL: [Uuid; 5] = [
    Uuid::from_u128(0x0000_0201),
    Uuid::from_u128(0x0000_0202),
    Uuid::from_u128(0x0000_0203),
    Uuid::from_u128(0x0000_0204),
    Uuid::from_u128(0x0000_0205),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Connecting to database...");
    let db = spendflow_db::connect_with(&config.database).await?;
    Migrator::up(&db, None).await?;

    info!("Seeding approval rules...");
    let rules = ApprovalRuleRepository::new(db.clone());
    let chain = rules
        .create_rule(CreateRuleInput {
            company_id: DEMO_COMPANY_ID,
            name: "Travel: manager, finance, director".to_string(),
            approvers: CHAIN.to_vec(),
            mode: ApprovalMode::Sequential,
            min_approval_percent: 100,
        })
        .await?;
    let panel = rules
        .create_rule(CreateRuleInput {
            company_id: DEMO_COMPANY_ID,
            name: "Equipment: review panel".to_string(),
            approvers: PANEL.to_vec(),
            mode: ApprovalMode::Parallel,
            min_approval_percent: 60,
        })
        .await?;

    let workflow = WorkflowRepository::from_config(db, &config.workflow);
    let listener = spawn_listener(&workflow);

    info!("Running sequential approval...");
    run_chain(&workflow, &chain).await?;

    info!("Running parallel approval...");
    run_panel(&workflow, &panel).await?;

    // Closing the channel stops the listener.
    drop(workflow);
    listener.await?;

    info!("Seeding complete!");
    Ok(())
}

fn spawn_listener(workflow: &WorkflowRepository) -> JoinHandle<()> {
    let mut events = workflow.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    let payload = serde_json::to_string(&event).unwrap_or_default();
                    info!(
                        expense_id = %event.expense_id,
                        status = %event.status,
                        %payload,
                        "status changed"
                    );
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "status listener fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

fn demo_draft(amount: Decimal, category: &str, description: &str) -> ExpenseDraft {
    ExpenseDraft {
        submitter_id: DEMO_SUBMITTER_ID,
        company_id: DEMO_COMPANY_ID,
        amount,
        currency: "USD".to_string(),
        category: category.to_string(),
        description: Some(description.to_string()),
        expense_date: Utc::now().date_naive(),
        receipt_url: None,
    }
}

async fn run_chain(workflow: &WorkflowRepository, rule: &ApprovalRule) -> anyhow::Result<()> {
    let expense = workflow
        .submit(
            demo_draft(Decimal::new(48_250, 2), "Travel", "Flight to customer site"),
            rule.id,
        )
        .await?;
    let steps = workflow.list_steps_for_expense(expense.id).await?;

    // Director tries to jump the queue.
    if let Err(err) = workflow
        .decide(steps[2].id, &DecisionRequest::approve(None), CHAIN[2])
        .await
    {
        let code = AppError::from(err).error_code();
        info!(code, "director must wait for earlier approvers");
    }

    for (step, approver) in steps.iter().zip(CHAIN) {
        let updated = workflow
            .decide(
                step.id,
                &DecisionRequest::approve(Some("Looks good".to_string())),
                approver,
            )
            .await?;
        info!(sequence = step.sequence, status = %updated.status, "chain step approved");
    }

    Ok(())
}

async fn run_panel(workflow: &WorkflowRepository, rule: &ApprovalRule) -> anyhow::Result<()> {
    let expense = workflow
        .submit(
            demo_draft(Decimal::new(129_900, 2), "Equipment", "Laptop replacement"),
            rule.id,
        )
        .await?;
    let steps = workflow.list_steps_for_expense(expense.id).await?;

    for (step, approver) in steps.iter().zip(PANEL) {
        match workflow
            .decide(step.id, &DecisionRequest::approve(None), approver)
            .await
        {
            Ok(updated) => info!(status = %updated.status, "panel vote recorded"),
            Err(err) => {
                let err = AppError::from(err);
                info!(code = err.error_code(), %err, "panel vote refused");
            }
        }
    }

    let inbox = workflow.list_pending_for_approver(PANEL[4]).await?;
    info!(pending = inbox.len(), "last panelist inbox after approval");

    Ok(())
}
