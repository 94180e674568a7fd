// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod config;
pub mod db;
pub mod drainer;
pub mod error;
pub mod feed;
pub mod processor;
pub mod sentiment;
pub mod simulate;
pub mod state;
pub mod supervisor;

// ---- Re-exports for stable public API ----
pub use crate::api::create_router;
pub use crate::config::Config;
pub use crate::error::Error;
pub use crate::processor::{ProcessedPost, ProcessingOutcome};
pub use crate::sentiment::{SentimentAnalyzer, SentimentLabel, SentimentResult};
pub use crate::state::AppContext;
