//! Pipeline orchestrator: per-post match → classify → persist → emit.
//!
//! A post leaves `pending` exactly once. Processing failures are reported as
//! an outcome and leave the post `pending`, so the backlog drainer retries it
//! on the next sweep (at-least-once, no per-post backoff).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::db::{self, Keyword};
use crate::error::Result;
use crate::sentiment::{SentimentLabel, SentimentResult};
use crate::state::AppContext;

/// The enriched record carried to subscribers and back to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedPost {
    pub post_id: i64,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub keyword_matched: String,
    pub sentiment: SentimentLabel,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ProcessingOutcome {
    Processed(ProcessedPost),
    Ignored { post_id: i64, reason: String },
    #[serde(rename = "error")]
    Failed { post_id: i64, message: String },
}

/// First keyword in registry iteration order (most-recently-added first) that
/// is a case-insensitive substring of the text. First match wins; this is
/// deliberately not a best-match search.
pub fn first_keyword_match<'a>(text: &str, keywords: &'a [Keyword]) -> Option<&'a Keyword> {
    let text_lower = text.to_lowercase();
    keywords.iter().find(|k| text_lower.contains(&k.keyword))
}

/// Run a single post through the pipeline. Never returns `Err`: anything that
/// goes wrong becomes a `Failed` outcome and the post stays `pending`.
pub async fn process_post(ctx: &AppContext, post_id: i64) -> ProcessingOutcome {
    match try_process(ctx, post_id).await {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(post_id, error = %e, "post processing failed");
            ProcessingOutcome::Failed {
                post_id,
                message: e.to_string(),
            }
        }
    }
}

async fn try_process(ctx: &AppContext, post_id: i64) -> Result<ProcessingOutcome> {
    let Some(post) = db::get_post(&ctx.db, post_id).await? else {
        return Ok(ProcessingOutcome::Failed {
            post_id,
            message: "post not found".to_string(),
        });
    };

    let keywords = db::list_keywords(&ctx.db).await?;
    if keywords.is_empty() {
        db::mark_ignored(&ctx.db, post_id).await?;
        return Ok(ProcessingOutcome::Ignored {
            post_id,
            reason: "no keywords configured".to_string(),
        });
    }

    let Some(matched) = first_keyword_match(&post.text, &keywords) else {
        db::mark_ignored(&ctx.db, post_id).await?;
        return Ok(ProcessingOutcome::Ignored {
            post_id,
            reason: "no keyword match".to_string(),
        });
    };

    let SentimentResult {
        sentiment,
        confidence,
        raw_label,
    } = ctx.analyzer.analyze(&post.text).await;
    debug!(post_id, %sentiment, confidence, raw_label, "classified");

    db::mark_processed(&ctx.db, post_id, sentiment, confidence, &matched.keyword).await?;

    Ok(ProcessingOutcome::Processed(ProcessedPost {
        post_id,
        text: post.text,
        timestamp: post.timestamp,
        source: post.source,
        keyword_matched: matched.keyword.clone(),
        sentiment,
        confidence,
    }))
}

/// Process a post and, when it comes out `Processed`, push it to the live
/// feed. Shared by the ingestion fast path, the drainer and the simulator.
pub async fn process_and_notify(ctx: &AppContext, post_id: i64) -> ProcessingOutcome {
    let outcome = process_post(ctx, post_id).await;
    if let ProcessingOutcome::Processed(post) = &outcome {
        ctx.feed.publish(post.clone());
    }
    outcome
}
