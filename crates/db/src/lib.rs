//! PostgreSQL persistence for the computation engine.
//!
//! This crate provides:
//! - `SeaORM` entity definitions for the ledger, reference and batch tables
//! - [`SeaStore`], the database-backed implementation of the engine store
//! - Database migrations

pub mod entities;
pub mod migration;

mod mapping;
mod query;
mod store;

pub use migration::Migrator;
pub use store::SeaStore;

use ecoop_shared::config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a pooled connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .sqlx_logging(false);

    tracing::debug!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Connecting to database"
    );
    Database::connect(options).await
}
