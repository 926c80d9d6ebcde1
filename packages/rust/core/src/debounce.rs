//! Debounced query execution.
//!
//! Query updates (one per keystroke) are sent to a background task. Each new
//! update cancels the pending one; once the input has been quiet for the
//! debounce delay, the latest query is searched and its results emitted.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::search::{SearchHit, SearchIndex};

/// Results for one settled query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResults {
    pub query: String,
    pub hits: Vec<SearchHit>,
}

/// Sending side of a debounced search. Dropping it flushes the pending query
/// and stops the task.
#[derive(Debug, Clone)]
pub struct QueryInput {
    tx: mpsc::UnboundedSender<String>,
}

impl QueryInput {
    /// Replace the current query. Returns `false` once the task has stopped.
    pub fn update(&self, query: impl Into<String>) -> bool {
        self.tx.send(query.into()).is_ok()
    }
}

/// Spawn the debouncing task.
///
/// Returns the query input, the stream of settled results and the task handle.
pub fn spawn_debounced_search(
    index: Arc<SearchIndex>,
    delay: Duration,
) -> (QueryInput, mpsc::Receiver<SearchResults>, JoinHandle<()>) {
    let (query_tx, query_rx) = mpsc::unbounded_channel();
    let (result_tx, result_rx) = mpsc::channel(16);

    let handle = tokio::spawn(run(index, delay, query_rx, result_tx));
    (QueryInput { tx: query_tx }, result_rx, handle)
}

async fn run(
    index: Arc<SearchIndex>,
    delay: Duration,
    mut queries: mpsc::UnboundedReceiver<String>,
    results: mpsc::Sender<SearchResults>,
) {
    let mut pending: Option<String> = None;

    loop {
        let Some(query) = pending.take() else {
            match queries.recv().await {
                Some(next) => {
                    pending = Some(next);
                    continue;
                }
                None => break,
            }
        };

        tokio::select! {
            next = queries.recv() => match next {
                Some(next) => {
                    trace!(cancelled = %query, next = %next, "query superseded");
                    pending = Some(next);
                }
                None => {
                    // Input closed: the pending query is the latest one.
                    let _ = emit(&index, query, &results).await;
                    break;
                }
            },
            () = tokio::time::sleep(delay) => {
                if !emit(&index, query, &results).await {
                    break;
                }
            }
        }
    }

    debug!("debounced search stopped");
}

/// Search and publish. Returns `false` when nobody listens any more.
async fn emit(index: &SearchIndex, query: String, results: &mpsc::Sender<SearchResults>) -> bool {
    let hits = index.search(&query);
    debug!(query = %query, hits = hits.len(), "query settled");
    results.send(SearchResults { query, hits }).await.is_ok()
}
