//! PostgreSQL persistence for generation records and shot lookups.
//!
//! Repositories are zero-sized structs providing async CRUD methods that
//! take `&PgPool` as their first argument. The [`store`] module adapts them
//! to the collaborator traits in `reelforge-core` so the pipeline never
//! depends on sqlx directly.

use sqlx::postgres::PgPoolOptions;

pub mod models;
pub mod repositories;
pub mod store;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Run the embedded migrations against the pool.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
