//! Database migration runner.
//!
//! Usage:
//!   migrator up      - Apply pending migrations
//!   migrator down    - Roll back the last migration
//!   migrator status  - Show applied and pending migrations
//!   migrator fresh   - Drop every table and re-apply all migrations
//!
//! The connection URL comes from `DATABASE_URL` (a `.env` file is honored).

use ecoop_db::Migrator;
use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    cli::run_cli(Migrator).await;
}
