//! Runtime configuration, read from the environment once at startup.
//! `dotenvy` has already loaded `.env` by the time `from_env` runs.

use std::env;
use std::time::Duration;

/// Which classifier backend to run behind the sentiment analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierKind {
    /// Embedded lexicon scorer, no network.
    Lexicon,
    /// Remote classifier service over HTTP.
    Http,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub classifier: ClassifierKind,
    pub classifier_endpoint: String,
    /// Pause between backlog sweeps.
    pub drain_interval: Duration,
    /// Longer pause after a failed sweep.
    pub drain_backoff: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        let classifier = match env::var("PULSE_CLASSIFIER").ok().as_deref() {
            Some("http") => ClassifierKind::Http,
            _ => ClassifierKind::Lexicon,
        };

        Self {
            database_url: env::var("PULSE_DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://pulse.db?mode=rwc".to_string()),
            bind_addr: env::var("PULSE_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string()),
            classifier,
            classifier_endpoint: env::var("CLASSIFIER_ENDPOINT")
                .unwrap_or_else(|_| "http://127.0.0.1:9000/classify".to_string()),
            drain_interval: Duration::from_secs(env_secs("DRAIN_INTERVAL_SECS", 2)),
            drain_backoff: Duration::from_secs(env_secs("DRAIN_BACKOFF_SECS", 5)),
        }
    }
}

fn env_secs(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
