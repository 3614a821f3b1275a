//! Bounded, time-expiring cache shared by the resolution stages
//!
//! Each stage owns one [`StageCache`]. Entries expire after the stage TTL or
//! are evicted least-recently-used once the capacity is reached, whichever
//! comes first.
//!
//! Misses are filled with single-flight semantics: concurrent callers for the
//! same cold key wait on one fill and all observe its result. The fill runs in
//! a detached task, so a caller that is cancelled while waiting does not abort
//! a fill other callers rely on, and its result is still cached. Failed fills
//! are never cached.

use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use moka::policy::EvictionPolicy;
use tracing::{debug, info};

use crate::error::{AuthError, AuthResult};

/// Outcome of a cache fill that produced no value
#[derive(Debug)]
pub(crate) enum FillError {
    /// The fill ran and returned an error
    Failed(AuthError),
    /// The fill task died before returning
    Aborted(String),
}

impl FillError {
    /// Convert into an [`AuthError`], classifying an aborted fill with `on_abort`
    pub(crate) fn or_aborted(self, on_abort: impl FnOnce(String) -> AuthError) -> AuthError {
        match self {
            Self::Failed(e) => e,
            Self::Aborted(reason) => on_abort(reason),
        }
    }
}

pub(crate) struct StageCache<K, V> {
    name: &'static str,
    inner: Cache<K, V>,
}

impl<K, V> Clone for StageCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            inner: self.inner.clone(),
        }
    }
}

impl<K, V> fmt::Debug for StageCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageCache")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<K, V> StageCache<K, V>
where
    K: Hash + Eq + Clone + fmt::Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(name: &'static str, ttl: Duration, capacity: u64) -> Self {
        let inner = Cache::builder()
            .name(name)
            .max_capacity(capacity)
            .time_to_live(ttl)
            .eviction_policy(EvictionPolicy::lru())
            .build();

        Self { name, inner }
    }

    /// Return the cached value for `key`, or run `fill` once to produce it
    ///
    /// # Errors
    ///
    /// [`FillError::Failed`] carries the fill's own error.
    /// [`FillError::Aborted`] means the fill task died without producing a
    /// result (panic, runtime shutdown); the stage decides how to report it.
    pub(crate) async fn get_or_fill<F>(&self, key: K, fill: F) -> Result<V, FillError>
    where
        F: Future<Output = AuthResult<V>> + Send + 'static,
    {
        if let Some(value) = self.inner.get(&key).await {
            debug!(cache = self.name, key = ?key, "Cache hit");
            return Ok(value);
        }

        info!(cache = self.name, key = ?key, "Cache miss");

        let inner = self.inner.clone();
        let task = tokio::spawn(async move {
            inner
                .try_get_with(key, fill)
                .await
                .map_err(Arc::unwrap_or_clone)
        });

        match task.await {
            Ok(result) => result.map_err(FillError::Failed),
            Err(e) => Err(FillError::Aborted(e.to_string())),
        }
    }

    pub(crate) async fn invalidate(&self, key: &K) {
        self.inner.invalidate(key).await;
    }
}
