use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;

use super::client::{get_json, FetchError};
use super::types::{FeedSnapshot, RawCatalog};

/// Default catalog endpoint.
pub const FEED_URL: &str = "https://tv.jsrdn.com/tv_v5/getfeed.php";

/// How long a snapshot is served before the next caller refreshes it.
pub const FRESHNESS_WINDOW: Duration = Duration::from_secs(12 * 60 * 60);

const FEED_TIMEOUT: Duration = Duration::from_secs(10);

/// Failure to obtain a catalog snapshot.
///
/// The underlying [`FetchError`] is shared so that every caller queued
/// behind one refresh receives the same failure.
#[derive(Debug, Clone, Error)]
pub enum FeedError {
    #[error("Failed to load channel catalog: {0}")]
    FetchFailed(Arc<FetchError>),
}

/// Source of "now" for freshness decisions.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Default)]
struct StoreState {
    snapshot: Option<Arc<FeedSnapshot>>,
    last_failure: Option<Arc<FetchError>>,
}

/// Owns the single cached catalog snapshot.
///
/// The state lock is held for the whole refresh, so at most one catalog
/// request is in flight. Callers that queued behind a refresh get its
/// outcome rather than issuing their own request.
pub struct FeedStore {
    client: reqwest::Client,
    feed_url: String,
    clock: Arc<dyn Clock>,
    state: Mutex<StoreState>,
    /// Completed refresh attempts, successful or not.
    refreshes: AtomicU64,
}

impl FeedStore {
    pub fn new(client: reqwest::Client, feed_url: impl Into<String>) -> Self {
        Self {
            client,
            feed_url: feed_url.into(),
            clock: Arc::new(SystemClock),
            state: Mutex::new(StoreState::default()),
            refreshes: AtomicU64::new(0),
        }
    }

    /// Replaces the time source used for freshness checks and fetch stamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the current snapshot, refreshing it first if it is absent or stale.
    ///
    /// # Errors
    ///
    /// [`FeedError::FetchFailed`] when the refresh fails. The cached snapshot
    /// is cleared in that case, so the next call tries again.
    pub async fn snapshot(&self) -> Result<Arc<FeedSnapshot>, FeedError> {
        let seen = self.refreshes.load(Ordering::Acquire);
        let mut state = self.state.lock().await;

        if let Some(snapshot) = &state.snapshot {
            if is_fresh(snapshot, self.clock.now()) {
                tracing::debug!(fetched_at = %snapshot.fetched_at, "Using cached catalog");
                return Ok(Arc::clone(snapshot));
            }
        }

        // A refresh finished while we waited for the lock and it failed.
        if self.refreshes.load(Ordering::Acquire) != seen {
            if let Some(failure) = &state.last_failure {
                return Err(FeedError::FetchFailed(Arc::clone(failure)));
            }
        }

        self.refresh(&mut state).await
    }

    async fn refresh(&self, state: &mut StoreState) -> Result<Arc<FeedSnapshot>, FeedError> {
        tracing::info!(url = %self.feed_url, "Loading channel catalog");

        let result = get_json::<RawCatalog>(&self.client, &self.feed_url, FEED_TIMEOUT).await;
        let outcome = match result {
            Ok(catalog) => {
                let snapshot = Arc::new(FeedSnapshot::from_catalog(catalog, self.clock.now()));
                tracing::info!(
                    shows = snapshot.shows.len(),
                    topics = snapshot.topics.len(),
                    "Channel catalog loaded"
                );
                state.snapshot = Some(Arc::clone(&snapshot));
                state.last_failure = None;
                Ok(snapshot)
            }
            Err(e) => {
                tracing::warn!(url = %self.feed_url, error = %e, "Failed to load channel catalog");
                let failure = Arc::new(e);
                state.snapshot = None;
                state.last_failure = Some(Arc::clone(&failure));
                Err(FeedError::FetchFailed(failure))
            }
        };

        self.refreshes.fetch_add(1, Ordering::Release);
        outcome
    }
}

fn is_fresh(snapshot: &FeedSnapshot, now: DateTime<Utc>) -> bool {
    match now.signed_duration_since(snapshot.fetched_at).to_std() {
        Ok(age) => age < FRESHNESS_WINDOW,
        // Clock stepped backwards past the fetch time
        Err(_) => true,
    }
}
