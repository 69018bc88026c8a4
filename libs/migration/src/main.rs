//! Migration CLI
//!
//! `DATABASE_URL=postgres://... cargo run -p migration -- up`
//!
//! The API binary applies pending migrations on startup as well; this CLI is
//! for `status`, `down` and `fresh` during development.

use migration::Migrator;
use sea_orm_migration::cli;

#[tokio::main]
async fn main() {
    cli::run_cli(Migrator).await;
}
