//! Schema creation, run once at startup.

use crate::error::Result;
use sqlx::SqlitePool;
use tracing::info;

pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS keywords (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            keyword TEXT UNIQUE NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS posts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            text TEXT NOT NULL,
            timestamp TIMESTAMP NOT NULL,
            source VARCHAR(50) NOT NULL,
            keyword_matched VARCHAR(100),
            sentiment_label VARCHAR(20),
            sentiment_score FLOAT,
            processing_status VARCHAR(20) NOT NULL DEFAULT 'pending',
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    for stmt in [
        "CREATE INDEX IF NOT EXISTS idx_posts_timestamp ON posts(timestamp)",
        "CREATE INDEX IF NOT EXISTS idx_posts_sentiment ON posts(sentiment_label)",
        "CREATE INDEX IF NOT EXISTS idx_posts_keyword ON posts(keyword_matched)",
        "CREATE INDEX IF NOT EXISTS idx_posts_status ON posts(processing_status)",
    ] {
        sqlx::query(stmt).execute(pool).await?;
    }

    info!("database schema ready");
    Ok(())
}
