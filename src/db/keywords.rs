//! Keyword registry: the mutable set of tracked keywords.
//!
//! Keywords are stored lowercased so uniqueness is case-insensitive.
//! `list_keywords` returns most-recently-added first; the processor's
//! first-match policy depends on that order.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Keyword {
    pub id: i64,
    pub keyword: String,
    pub created_at: DateTime<Utc>,
}

/// Insert a new keyword. Fails with [`Error::DuplicateKeyword`] when the
/// lowercased text is already tracked.
pub async fn add_keyword(pool: &SqlitePool, keyword: &str) -> Result<i64> {
    let normalized = keyword.trim().to_lowercase();
    let res = sqlx::query("INSERT INTO keywords (keyword, created_at) VALUES (?, ?)")
        .bind(&normalized)
        .bind(Utc::now())
        .execute(pool)
        .await;

    match res {
        Ok(done) => Ok(done.last_insert_rowid()),
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            Err(Error::DuplicateKeyword(normalized))
        }
        Err(e) => Err(e.into()),
    }
}

/// All keywords, most-recently-added first. `id DESC` keeps the order stable
/// when creation timestamps collide.
pub async fn list_keywords(pool: &SqlitePool) -> Result<Vec<Keyword>> {
    let rows = sqlx::query_as::<_, Keyword>(
        "SELECT id, keyword, created_at FROM keywords ORDER BY created_at DESC, id DESC",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Delete by id. No-op when the id is unknown.
pub async fn delete_keyword(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM keywords WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
