//! Test database setup
#![allow(dead_code)]

use sea_orm::{DatabaseConnection, DbErr};

/// A fresh in-memory SQLite database with the full schema applied.
///
/// Every call returns an isolated database, so tests can run in parallel.
pub async fn setup_test_database() -> Result<DatabaseConnection, DbErr> {
    let db = surveyor::db::connect("sqlite::memory:").await?;
    surveyor::db::migrate(&db).await?;
    Ok(db)
}

/// Initializes the global pool used by the HTTP handlers.
///
/// The pool outlives the runtime that created it, so each test binary that
/// calls this must drive it from a single test.
pub async fn setup_global_database() -> Result<&'static DatabaseConnection, DbErr> {
    let db = surveyor::db::init_db("sqlite::memory:".to_string()).await;
    surveyor::db::migrate(db).await?;
    Ok(db)
}
