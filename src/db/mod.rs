//! SQLite persistence layer.
//!
//! One pooled connection set shared by the HTTP handlers, the backlog drainer
//! and the fast path; every access goes through the narrow functions in the
//! submodules rather than ad-hoc queries.

pub mod init;
pub mod keywords;
pub mod posts;
pub mod stats;

pub use keywords::{add_keyword, delete_keyword, list_keywords, Keyword};
pub use posts::{
    create_post, get_post, list_pending, mark_ignored, mark_processed, processed_since,
    recent_processed, Post,
};
pub use stats::{dashboard_stats, hourly_trends, DashboardStats, TrendBucket};

use crate::error::Result;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

/// Open the pool and make sure the schema exists.
pub async fn connect(database_url: &str) -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;
    init::init_schema(&pool).await?;
    Ok(pool)
}

/// In-memory database for tests. A single connection keeps every query on the
/// same memory instance.
pub async fn connect_in_memory() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;
    init::init_schema(&pool).await?;
    Ok(pool)
}
