//! Aggregation queries for the dashboard. Read-only over processed posts.

use crate::error::Result;
use serde::Serialize;
use sqlx::SqlitePool;

#[derive(Debug, Clone, Default, Serialize)]
pub struct SentimentBreakdown {
    pub positive: i64,
    pub neutral: i64,
    pub negative: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total_mentions: i64,
    pub sentiment_breakdown: SentimentBreakdown,
}

/// One hour-aligned bucket of processed-post counts. Hours with no processed
/// posts produce no bucket at all.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TrendBucket {
    /// Hour-truncated event timestamp, `YYYY-MM-DD HH:00:00`.
    pub hour: String,
    pub positive: i64,
    pub neutral: i64,
    pub negative: i64,
}

/// Total processed count plus the per-label breakdown.
pub async fn dashboard_stats(pool: &SqlitePool) -> Result<DashboardStats> {
    let total_mentions: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE processing_status = 'processed'")
            .fetch_one(pool)
            .await?;

    let rows: Vec<(Option<String>, i64)> = sqlx::query_as(
        "SELECT sentiment_label, COUNT(*) FROM posts \
         WHERE processing_status = 'processed' GROUP BY sentiment_label",
    )
    .fetch_all(pool)
    .await?;

    let mut breakdown = SentimentBreakdown::default();
    for (label, count) in rows {
        match label.as_deref() {
            Some("POSITIVE") => breakdown.positive = count,
            Some("NEUTRAL") => breakdown.neutral = count,
            Some("NEGATIVE") => breakdown.negative = count,
            _ => {}
        }
    }

    Ok(DashboardStats {
        total_mentions,
        sentiment_breakdown: breakdown,
    })
}

/// Hourly sentiment counts over the trailing `hours` window, grouped by the
/// hour-truncated event timestamp, ascending.
pub async fn hourly_trends(pool: &SqlitePool, hours: i64) -> Result<Vec<TrendBucket>> {
    let rows = sqlx::query_as::<_, TrendBucket>(
        r#"
        SELECT
            strftime('%Y-%m-%d %H:00:00', timestamp) AS hour,
            SUM(CASE WHEN sentiment_label = 'POSITIVE' THEN 1 ELSE 0 END) AS positive,
            SUM(CASE WHEN sentiment_label = 'NEUTRAL' THEN 1 ELSE 0 END) AS neutral,
            SUM(CASE WHEN sentiment_label = 'NEGATIVE' THEN 1 ELSE 0 END) AS negative
        FROM posts
        WHERE processing_status = 'processed'
          AND datetime(timestamp) >= datetime('now', '-' || ? || ' hours')
        GROUP BY hour
        ORDER BY hour ASC
        "#,
    )
    .bind(hours)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
