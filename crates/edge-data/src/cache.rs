//! CompositeRecord 캐시.
//!
//! 키는 `ticker:{SYMBOL}`, 값은 직렬화된 레코드입니다. 만료는 저장소 TTL에 맡깁니다.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use edge_core::{CompositeRecord, Ticker};

use crate::error::Result;
use crate::storage::KeyValueStore;

/// Cache 통계.
#[derive(Debug, Default, Clone, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub hit_rate: f64,
}

/// 티커별 CompositeRecord 캐시.
pub struct CacheStore {
    store: Arc<dyn KeyValueStore>,
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
}

impl CacheStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            writes: AtomicU64::new(0),
        }
    }

    /// 캐시된 레코드를 가져옵니다.
    ///
    /// 진행 중인 계산을 기다리지 않습니다. 역직렬화할 수 없는 항목은 미스로 처리하고
    /// 다음 쓰기에서 덮어씁니다.
    #[instrument(skip(self, ticker), fields(ticker = %ticker))]
    pub async fn get(&self, ticker: &Ticker) -> Result<Option<CompositeRecord>> {
        let raw = self.store.get(&ticker.cache_key()).await?;

        let record = match raw {
            Some(json) => match serde_json::from_str::<CompositeRecord>(&json) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(error = %e, "Unreadable cache entry, treating as miss");
                    None
                }
            },
            None => None,
        };

        if record.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!("Cache hit");
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!("Cache miss");
        }

        Ok(record)
    }

    /// 레코드를 TTL과 함께 저장합니다 (원자적 교체).
    #[instrument(skip(self, ticker, record), fields(ticker = %ticker, origin = ?record.origin))]
    pub async fn put(&self, ticker: &Ticker, record: &CompositeRecord, ttl: Duration) -> Result<()> {
        let json = serde_json::to_string(record)?;
        self.store.set_ex(&ticker.cache_key(), &json, ttl).await?;
        self.writes.fetch_add(1, Ordering::Relaxed);
        debug!(ttl_secs = ttl.as_secs(), "Cached record");
        Ok(())
    }

    /// 캐시 항목을 삭제합니다.
    pub async fn invalidate(&self, ticker: &Ticker) -> Result<bool> {
        self.store.delete(&ticker.cache_key()).await
    }

    /// Cache 통계를 가져옵니다.
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        CacheStats {
            hits,
            misses,
            writes: self.writes.load(Ordering::Relaxed),
            hit_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use chrono::Utc;

    fn record(symbol: &str) -> CompositeRecord {
        CompositeRecord::empty(Ticker::parse(symbol).unwrap(), None, Utc::now())
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_then_expire() {
        let store = Arc::new(MemoryStore::new());
        let cache = CacheStore::new(store.clone());
        let ticker = Ticker::parse("AAPL").unwrap();
        let ttl = Duration::from_secs(2 * 60 * 60);

        cache.put(&ticker, &record("AAPL"), ttl).await.unwrap();
        assert!(store.contains("ticker:AAPL"));
        assert!(cache.get(&ticker).await.unwrap().is_some());

        tokio::time::advance(ttl).await;
        assert!(cache.get(&ticker).await.unwrap().is_none());

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.writes, 1);
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_miss() {
        let store = Arc::new(MemoryStore::new());
        store
            .set_ex("ticker:MSFT", "not json", Duration::from_secs(60))
            .await
            .unwrap();

        let cache = CacheStore::new(store);
        let ticker = Ticker::parse("MSFT").unwrap();
        assert!(cache.get(&ticker).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalidate_removes_entry() {
        let cache = CacheStore::new(Arc::new(MemoryStore::new()));
        let ticker = Ticker::parse("TSLA").unwrap();

        cache
            .put(&ticker, &record("TSLA"), Duration::from_secs(60))
            .await
            .unwrap();

        assert!(cache.invalidate(&ticker).await.unwrap());
        assert!(!cache.invalidate(&ticker).await.unwrap());
        assert!(cache.get(&ticker).await.unwrap().is_none());
    }
}
