//! 인메모리 저장소.
//!
//! 단일 프로세스 실행과 테스트용입니다. 만료는 `tokio::time::Instant` 기준이라
//! `tokio::time::pause`/`advance`로 시간을 앞당길 수 있습니다.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

use super::KeyValueStore;
use crate::error::{DataError, Result};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// 프로세스 로컬 키-값 저장소.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 만료되지 않은 키 개수.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .map(|entries| entries.values().filter(|e| e.is_live(now)).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 키가 존재하고 만료되지 않았는지 확인합니다.
    pub fn contains(&self, key: &str) -> bool {
        let now = Instant::now();
        self.entries
            .lock()
            .map(|entries| entries.get(key).is_some_and(|e| e.is_live(now)))
            .unwrap_or(false)
    }

    fn with_entries<T>(&self, f: impl FnOnce(&mut HashMap<String, Entry>) -> T) -> Result<T> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| DataError::Store("memory store mutex poisoned".to_string()))?;
        Ok(f(&mut entries))
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = Instant::now();
        self.with_entries(|entries| match entries.get(key) {
            Some(entry) if entry.is_live(now) => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        })
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let expires_at = Instant::now() + ttl;
        self.with_entries(|entries| {
            entries.insert(
                key.to_string(),
                Entry {
                    value: value.to_string(),
                    expires_at,
                },
            );
        })
    }

    async fn set_nx_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        let now = Instant::now();
        self.with_entries(|entries| {
            if entries.get(key).is_some_and(|e| e.is_live(now)) {
                return false;
            }
            entries.insert(
                key.to_string(),
                Entry {
                    value: value.to_string(),
                    expires_at: now + ttl,
                },
            );
            true
        })
    }

    async fn delete_if_equals(&self, key: &str, expected: &str) -> Result<bool> {
        let now = Instant::now();
        self.with_entries(|entries| {
            let matches = entries
                .get(key)
                .is_some_and(|e| e.is_live(now) && e.value == expected);
            if matches {
                entries.remove(key);
            }
            matches
        })
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let now = Instant::now();
        self.with_entries(|entries| {
            entries
                .remove(key)
                .is_some_and(|e| e.is_live(now))
        })
    }

    async fn ping(&self) -> Result<bool> {
        self.with_entries(|_| true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let store = MemoryStore::new();
        store
            .set_ex("ticker:AAPL", "{}", Duration::from_secs(10))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(9)).await;
        assert_eq!(store.get("ticker:AAPL").await.unwrap().as_deref(), Some("{}"));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(store.get("ticker:AAPL").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_nx_after_expiry() {
        let store = MemoryStore::new();
        let ttl = Duration::from_secs(5);

        assert!(store.set_nx_ex("lock:AAPL", "a", ttl).await.unwrap());
        assert!(!store.set_nx_ex("lock:AAPL", "b", ttl).await.unwrap());

        tokio::time::advance(ttl).await;
        assert!(store.set_nx_ex("lock:AAPL", "b", ttl).await.unwrap());
        assert!(!store.delete_if_equals("lock:AAPL", "a").await.unwrap());
        assert!(store.delete_if_equals("lock:AAPL", "b").await.unwrap());
        assert!(store.is_empty());
    }
}
