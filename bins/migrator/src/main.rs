//! Database migration runner for Spendflow.
//!
//! Usage:
//!   migrator up      - Create the rule, expense, and approval step tables
//!   migrator down    - Rollback last migration
//!   migrator status  - Show migration status
//!   migrator fresh   - Drop all tables and re-run migrations
//!
//! The database is read from `DATABASE_URL` (a `.env` file is honored).

use sea_orm_migration::prelude::*;
use spendflow_db::migration::Migrator;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // The migrator CLI sets up its own tracing
    cli::run_cli(Migrator).await;
}
