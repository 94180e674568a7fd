//! Backlog drainer: a perpetual loop that sweeps pending posts through the
//! orchestrator, oldest first.
//!
//! Per-post failures are already absorbed by the processor; a failure to list
//! the backlog itself backs the whole loop off for a longer interval. The loop
//! exits only on shutdown, letting the in-flight sweep finish first.

use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::db;
use crate::processor::{self, ProcessingOutcome};
use crate::state::AppContext;

pub async fn run_drainer(ctx: AppContext, mut shutdown: watch::Receiver<bool>) {
    let interval = ctx.config.drain_interval;
    let backoff = ctx.config.drain_backoff;

    info!("backlog drainer started");
    ctx.supervisor.set_drainer_running(true);

    loop {
        match db::list_pending(&ctx.db).await {
            Ok(pending) => {
                if !pending.is_empty() {
                    debug!(count = pending.len(), "sweeping pending posts");
                }
                for post in pending {
                    match processor::process_and_notify(&ctx, post.id).await {
                        ProcessingOutcome::Processed(p) => {
                            debug!(post_id = p.post_id, sentiment = %p.sentiment, "processed")
                        }
                        ProcessingOutcome::Ignored { post_id, reason } => {
                            debug!(post_id, reason = %reason, "ignored")
                        }
                        ProcessingOutcome::Failed { post_id, message } => {
                            // stays pending; retried next sweep
                            warn!(post_id, message = %message, "processing failed")
                        }
                    }
                }
                if sleep_or_shutdown(&mut shutdown, interval).await {
                    break;
                }
            }
            Err(e) => {
                warn!(error = %e, "backlog sweep failed, backing off");
                if sleep_or_shutdown(&mut shutdown, backoff).await {
                    break;
                }
            }
        }
    }

    ctx.supervisor.set_drainer_running(false);
    info!("backlog drainer stopped");
}

/// Sleep for `dur`, returning early with `true` when shutdown is signaled.
async fn sleep_or_shutdown(shutdown: &mut watch::Receiver<bool>, dur: Duration) -> bool {
    if *shutdown.borrow() {
        return true;
    }
    tokio::select! {
        _ = tokio::time::sleep(dur) => false,
        res = shutdown.changed() => res.is_err() || *shutdown.borrow(),
    }
}
