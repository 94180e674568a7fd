//! HTTP surface: keyword management, post ingestion, dashboard reads and the
//! live SSE stream. The handlers stay thin; everything interesting happens in
//! the processor, drainer and db modules.

use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{KeepAlive, Sse},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use futures::stream::Stream;
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::db;
use crate::error::Result;
use crate::processor;
use crate::simulate;
use crate::state::AppContext;
use crate::supervisor::Supervisor;

pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/keywords", post(create_keyword).get(list_keywords))
        .route("/api/keywords/{id}", delete(remove_keyword))
        .route("/api/posts/ingest", post(ingest_post))
        .route("/api/posts/bulk-ingest", post(bulk_ingest_posts))
        .route("/api/posts/processed", get(processed_since))
        .route("/api/posts/simulate", post(simulate_posts))
        .route("/api/posts/simulate/status", get(simulation_status))
        .route("/api/dashboard/stats", get(dashboard_stats))
        .route("/api/dashboard/recent", get(recent_posts))
        .route("/api/dashboard/trends", get(trends))
        .route("/api/events", get(event_stream))
        .layer(CorsLayer::very_permissive())
        .with_state(ctx)
}

// ============== keyword management ==============

#[derive(Deserialize)]
struct KeywordCreate {
    keyword: String,
}

async fn create_keyword(
    State(ctx): State<AppContext>,
    Json(body): Json<KeywordCreate>,
) -> Result<(StatusCode, Json<Value>)> {
    let keyword_id = db::add_keyword(&ctx.db, &body.keyword).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "keyword_id": keyword_id,
            "keyword": body.keyword.trim().to_lowercase(),
        })),
    ))
}

async fn list_keywords(State(ctx): State<AppContext>) -> Result<Json<Value>> {
    let keywords = db::list_keywords(&ctx.db).await?;
    Ok(Json(json!({ "keywords": keywords })))
}

/// Idempotent: deleting an unknown id still reports success.
async fn remove_keyword(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
) -> Result<Json<Value>> {
    db::delete_keyword(&ctx.db, id).await?;
    Ok(Json(json!({ "status": "success", "message": "Keyword deleted" })))
}

// ============== post ingestion ==============

#[derive(Deserialize)]
struct PostCreate {
    text: String,
    timestamp: DateTime<Utc>,
    source: String,
}

async fn ingest_post(
    State(ctx): State<AppContext>,
    Json(body): Json<PostCreate>,
) -> Result<(StatusCode, Json<Value>)> {
    let post_id = db::create_post(&ctx.db, &body.text, body.timestamp, &body.source).await?;

    // fast path; the drainer would also pick this up eventually
    let fast = ctx.clone();
    tokio::spawn(async move {
        processor::process_and_notify(&fast, post_id).await;
    });

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "queued",
            "post_id": post_id,
            "message": "Post queued for processing",
        })),
    ))
}

async fn bulk_ingest_posts(
    State(ctx): State<AppContext>,
    Json(posts): Json<Vec<PostCreate>>,
) -> Result<(StatusCode, Json<Value>)> {
    let mut post_ids = Vec::with_capacity(posts.len());
    for post in &posts {
        let post_id = db::create_post(&ctx.db, &post.text, post.timestamp, &post.source).await?;
        post_ids.push(post_id);

        let fast = ctx.clone();
        tokio::spawn(async move {
            processor::process_and_notify(&fast, post_id).await;
        });
    }

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "queued",
            "count": post_ids.len(),
            "post_ids": post_ids,
        })),
    ))
}

#[derive(Deserialize)]
struct SinceQuery {
    #[serde(default)]
    since_id: i64,
}

async fn processed_since(
    State(ctx): State<AppContext>,
    Query(q): Query<SinceQuery>,
) -> Result<Json<Value>> {
    let posts = db::processed_since(&ctx.db, q.since_id).await?;
    Ok(Json(json!({ "posts": posts })))
}

// ============== simulation ==============

#[derive(Deserialize)]
struct PostsSimulate {
    #[serde(default = "default_sim_count")]
    count: u32,
    /// Seconds between simulated posts.
    #[serde(default = "default_sim_interval")]
    interval: u64,
}

fn default_sim_count() -> u32 {
    10
}

fn default_sim_interval() -> u64 {
    2
}

async fn simulate_posts(
    State(ctx): State<AppContext>,
    Json(config): Json<PostsSimulate>,
) -> Json<Value> {
    let Some(guard) = Supervisor::begin_simulation(&ctx.supervisor) else {
        return Json(json!({
            "status": "already_running",
            "message": "Simulation already in progress",
        }));
    };

    let message = format!(
        "Simulating {} posts with {}s interval",
        config.count, config.interval
    );
    tokio::spawn(simulate::run_simulation(
        ctx.clone(),
        config.count,
        Duration::from_secs(config.interval),
        guard,
    ));

    Json(json!({ "status": "started", "message": message }))
}

async fn simulation_status(State(ctx): State<AppContext>) -> Json<Value> {
    Json(json!({ "running": ctx.supervisor.simulation_running() }))
}

// ============== dashboard ==============

async fn dashboard_stats(State(ctx): State<AppContext>) -> Result<Json<db::DashboardStats>> {
    Ok(Json(db::dashboard_stats(&ctx.db).await?))
}

async fn recent_posts(State(ctx): State<AppContext>) -> Result<Json<Value>> {
    let posts = db::recent_processed(&ctx.db, 20).await?;
    Ok(Json(json!({ "posts": posts })))
}

#[derive(Deserialize)]
struct TrendsQuery {
    hours: Option<i64>,
}

async fn trends(
    State(ctx): State<AppContext>,
    Query(q): Query<TrendsQuery>,
) -> Result<Json<Value>> {
    let trends = db::hourly_trends(&ctx.db, q.hours.unwrap_or(24)).await?;
    Ok(Json(json!({ "trends": trends })))
}

// ============== live updates ==============

/// SSE stream of newly processed posts. The keep-alive comment doubles as the
/// idle signal so transport timeouts don't fire on quiet streams.
async fn event_stream(
    State(ctx): State<AppContext>,
) -> Sse<impl Stream<Item = std::result::Result<axum::response::sse::Event, std::convert::Infallible>>>
{
    Sse::new(ctx.feed.sse_stream()).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("heartbeat"),
    )
}

// ============== health ==============

async fn root() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "message": "Social Pulse Monitor API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health(State(ctx): State<AppContext>) -> Result<Json<Value>> {
    let keywords = db::list_keywords(&ctx.db).await?;
    let stats = db::dashboard_stats(&ctx.db).await?;

    Ok(Json(json!({
        "status": "healthy",
        "database": "connected",
        "keywords_count": keywords.len(),
        "total_posts": stats.total_mentions,
        "background_processor": if ctx.supervisor.drainer_running() { "running" } else { "stopped" },
    })))
}
