//! Session-scoped memoization of data source responses.
//!
//! History is keyed by the full [`HistoryRequest`] (ticker, start, end,
//! interval) and snapshots by ticker. Only successful responses are stored,
//! so a failed fetch is attempted again on the next identical query.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::data_source::{HistoryRequest, MarketDataSource, SourceFuture};
use crate::{MarketSnapshot, PriceSeries, ProviderId, Symbol};

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

#[derive(Debug)]
struct CacheInner<K, V> {
    map: HashMap<K, CacheEntry<V>>,
    ttl: Duration,
}

/// Thread-safe in-memory cache with a single TTL.
#[derive(Debug, Clone)]
pub struct CacheStore<K, V> {
    inner: Arc<RwLock<CacheInner<K, V>>>,
}

impl<K, V> CacheStore<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(CacheInner {
                map: HashMap::new(),
                ttl,
            })),
        }
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        let store = self.inner.read().await;
        store.map.get(key).and_then(|entry| {
            if Instant::now() <= entry.expires_at {
                Some(entry.value.clone())
            } else {
                None
            }
        })
    }

    /// Stores `value` and drops every entry whose TTL has elapsed.
    ///
    /// A zero TTL stores nothing.
    pub async fn put(&self, key: K, value: V) {
        let mut store = self.inner.write().await;
        if store.ttl == Duration::ZERO {
            return;
        }
        let now = Instant::now();
        store.map.retain(|_, entry| entry.expires_at > now);
        let expires_at = now + store.ttl;
        store.map.insert(key, CacheEntry { value, expires_at });
    }

    /// Number of stored entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.inner.read().await.map.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Hit/miss counters of a [`CachedSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// [`MarketDataSource`] decorator that memoizes responses for one session.
pub struct CachedSource {
    inner: Arc<dyn MarketDataSource>,
    history: CacheStore<HistoryRequest, PriceSeries>,
    snapshots: CacheStore<Symbol, MarketSnapshot>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CachedSource {
    pub fn new(inner: Arc<dyn MarketDataSource>, ttl: Duration) -> Self {
        Self {
            inner,
            history: CacheStore::new(ttl),
            snapshots: CacheStore::new(ttl),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    fn record(&self, hit: bool) {
        let counter = if hit { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

impl MarketDataSource for CachedSource {
    fn id(&self) -> ProviderId {
        self.inner.id()
    }

    fn history<'a>(&'a self, req: HistoryRequest) -> SourceFuture<'a, PriceSeries> {
        Box::pin(async move {
            if let Some(series) = self.history.get(&req).await {
                self.record(true);
                tracing::debug!(symbol = %req.symbol, interval = %req.interval, "history cache hit");
                return Ok(series);
            }

            self.record(false);
            let series = self.inner.history(req.clone()).await?;
            self.history.put(req, series.clone()).await;
            Ok(series)
        })
    }

    fn snapshot<'a>(&'a self, symbol: Symbol) -> SourceFuture<'a, MarketSnapshot> {
        Box::pin(async move {
            if let Some(snapshot) = self.snapshots.get(&symbol).await {
                self.record(true);
                tracing::debug!(%symbol, "snapshot cache hit");
                return Ok(snapshot);
            }

            self.record(false);
            let snapshot = self.inner.snapshot(symbol.clone()).await?;
            self.snapshots.put(symbol, snapshot.clone()).await;
            Ok(snapshot)
        })
    }
}
