//! Post store: the durable record of posts and their processing status.
//!
//! A post is created `pending` and transitions exactly once to `processed` or
//! `ignored`. Both transition updates are guarded on the row still being
//! `pending`, so a drainer/fast-path race cannot double-transition a row; the
//! loser's write is a no-op.

use crate::error::Result;
use crate::sentiment::SentimentLabel;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_PROCESSED: &str = "processed";
pub const STATUS_IGNORED: &str = "ignored";

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub text: String,
    /// Source-supplied event timestamp, distinct from `created_at`.
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub keyword_matched: Option<String>,
    pub sentiment_label: Option<String>,
    pub sentiment_score: Option<f64>,
    pub processing_status: String,
    pub created_at: DateTime<Utc>,
}

const POST_COLUMNS: &str = "id, text, timestamp, source, keyword_matched, sentiment_label, \
                            sentiment_score, processing_status, created_at";

/// Insert a new post with status `pending`; returns its id.
pub async fn create_post(
    pool: &SqlitePool,
    text: &str,
    timestamp: DateTime<Utc>,
    source: &str,
) -> Result<i64> {
    let done = sqlx::query(
        "INSERT INTO posts (text, timestamp, source, processing_status, created_at) \
         VALUES (?, ?, ?, 'pending', ?)",
    )
    .bind(text)
    .bind(timestamp)
    .bind(source)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(done.last_insert_rowid())
}

pub async fn get_post(pool: &SqlitePool, id: i64) -> Result<Option<Post>> {
    let row = sqlx::query_as::<_, Post>(&format!(
        "SELECT {POST_COLUMNS} FROM posts WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// All pending posts in ascending creation order, the order the drainer
/// processes them in.
pub async fn list_pending(pool: &SqlitePool) -> Result<Vec<Post>> {
    let rows = sqlx::query_as::<_, Post>(&format!(
        "SELECT {POST_COLUMNS} FROM posts \
         WHERE processing_status = 'pending' ORDER BY created_at ASC, id ASC"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Record the classification result and move the post to `processed`.
/// Only applies while the post is still `pending`.
pub async fn mark_processed(
    pool: &SqlitePool,
    id: i64,
    label: SentimentLabel,
    score: f64,
    keyword: &str,
) -> Result<()> {
    sqlx::query(
        "UPDATE posts SET sentiment_label = ?, sentiment_score = ?, keyword_matched = ?, \
         processing_status = 'processed' \
         WHERE id = ? AND processing_status = 'pending'",
    )
    .bind(label.as_str())
    .bind(score)
    .bind(keyword)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Move the post to `ignored`, leaving the sentiment fields null.
/// Only applies while the post is still `pending`.
pub async fn mark_ignored(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query(
        "UPDATE posts SET processing_status = 'ignored' \
         WHERE id = ? AND processing_status = 'pending'",
    )
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Most recent processed posts by event timestamp, for the dashboard feed.
pub async fn recent_processed(pool: &SqlitePool, limit: i64) -> Result<Vec<Post>> {
    let rows = sqlx::query_as::<_, Post>(&format!(
        "SELECT {POST_COLUMNS} FROM posts \
         WHERE processing_status = 'processed' ORDER BY timestamp DESC LIMIT ?"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Processed posts with an id greater than `since_id`, ascending. Lets a
/// polling client catch up without the live stream.
pub async fn processed_since(pool: &SqlitePool, since_id: i64) -> Result<Vec<Post>> {
    let rows = sqlx::query_as::<_, Post>(&format!(
        "SELECT {POST_COLUMNS} FROM posts \
         WHERE processing_status = 'processed' AND id > ? ORDER BY id ASC"
    ))
    .bind(since_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
