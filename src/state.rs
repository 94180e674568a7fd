//! Shared application context handed to handlers and background tasks.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::Config;
use crate::feed::PostFeed;
use crate::sentiment::SentimentAnalyzer;
use crate::supervisor::Supervisor;

#[derive(Clone)]
pub struct AppContext {
    pub db: SqlitePool,
    pub analyzer: SentimentAnalyzer,
    pub feed: PostFeed,
    pub supervisor: Arc<Supervisor>,
    pub config: Config,
}

impl AppContext {
    pub fn new(db: SqlitePool, analyzer: SentimentAnalyzer, config: Config) -> Self {
        Self {
            db,
            analyzer,
            feed: PostFeed::default(),
            supervisor: Arc::new(Supervisor::new()),
            config,
        }
    }
}
