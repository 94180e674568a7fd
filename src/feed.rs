//! Live notification fan-out.
//!
//! Every subscriber gets its own mailbox at subscribe time and every processed
//! post is copied to all currently registered mailboxes, in the order the
//! outcomes were produced. The channel is bounded; a subscriber that falls too
//! far behind loses the oldest entries rather than blocking the pipeline.

use std::convert::Infallible;

use axum::response::sse::Event;
use futures::stream::{Stream, StreamExt};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};

use crate::processor::ProcessedPost;

/// Per-subscriber backlog before drop-oldest kicks in.
pub const FEED_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct PostFeed {
    tx: broadcast::Sender<ProcessedPost>,
}

impl PostFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Copy a processed post to every active mailbox. A send with no
    /// subscribers is a no-op.
    pub fn publish(&self, post: ProcessedPost) {
        if let Ok(n) = self.tx.send(post) {
            debug!(subscribers = n, "published processed post");
        }
    }

    /// Register a new mailbox. Dropping the receiver deregisters it.
    pub fn subscribe(&self) -> broadcast::Receiver<ProcessedPost> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Adapt a fresh subscription into an SSE event stream. Lag errors are
    /// logged and skipped so one slow client only loses its own backlog.
    pub fn sse_stream(&self) -> impl Stream<Item = Result<Event, Infallible>> {
        let rx = self.subscribe();
        BroadcastStream::new(rx).filter_map(|item| async move {
            match item {
                Ok(post) => match Event::default().event("processed_post").json_data(&post) {
                    Ok(event) => Some(Ok(event)),
                    Err(e) => {
                        warn!("failed to serialize processed post for SSE: {e}");
                        None
                    }
                },
                Err(e) => {
                    warn!("SSE subscriber lagged: {e:?}");
                    None
                }
            }
        })
    }
}

impl Default for PostFeed {
    fn default() -> Self {
        Self::new(FEED_CAPACITY)
    }
}
