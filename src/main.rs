//! Social Pulse Monitor binary entrypoint.
//! Boots the Axum HTTP server, the SQLite store and the backlog drainer.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use social_pulse_monitor::config::{ClassifierKind, Config};
use social_pulse_monitor::sentiment::{
    DynClassifier, HttpClassifier, LexiconClassifier, SentimentAnalyzer,
};
use social_pulse_monitor::{api, db, drainer, AppContext};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("social_pulse_monitor=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

fn build_classifier(config: &Config) -> DynClassifier {
    match config.classifier {
        ClassifierKind::Lexicon => Arc::new(LexiconClassifier::new()),
        ClassifierKind::Http => Arc::new(HttpClassifier::new(config.classifier_endpoint.clone())),
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = Config::from_env();
    let pool = db::connect(&config.database_url).await?;

    let analyzer = SentimentAnalyzer::new(build_classifier(&config));
    let ctx = AppContext::new(pool, analyzer, config.clone());

    // Background drainer with its own shutdown line so in-flight processing
    // can finish before exit.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let drainer_task = tokio::spawn(drainer::run_drainer(ctx.clone(), shutdown_rx));

    let router = api::create_router(ctx);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %config.bind_addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    let _ = drainer_task.await;
    Ok(())
}
