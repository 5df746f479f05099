//! Redis 저장소 구현.
//!
//! 여러 워커 인스턴스가 같은 Redis를 공유하므로 잠금과 캐시가 프로세스 경계를 넘어 일관됩니다.

use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, AsyncCommands, Client, Script};
use std::time::Duration;
use tracing::{debug, info, instrument};

use super::{ttl_secs, KeyValueStore};
use crate::error::{DataError, Result};

/// 값이 일치할 때만 삭제하는 스크립트.
const COMPARE_AND_DELETE: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

/// Redis 연결 래퍼.
///
/// `MultiplexedConnection`은 복제 비용이 낮고 동시 요청을 파이프라이닝하므로
/// 호출마다 복제해서 사용합니다.
#[derive(Clone)]
pub struct RedisStore {
    client: Client,
    connection: MultiplexedConnection,
    compare_and_delete: Script,
}

impl RedisStore {
    /// 새로운 Redis 연결을 생성합니다.
    pub async fn connect(url: &str) -> Result<Self> {
        info!("Connecting to Redis...");

        let client = Client::open(url).map_err(|e| DataError::Config(e.to_string()))?;
        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| DataError::Connection(e.to_string()))?;

        info!("Redis connection established");

        Ok(Self {
            client,
            connection,
            compare_and_delete: Script::new(COMPARE_AND_DELETE),
        })
    }

    /// 블로킹 명령(BRPOP 등)용 전용 연결을 엽니다.
    ///
    /// 공유 연결에서 블로킹 명령을 실행하면 다른 요청이 모두 대기하므로 분리합니다.
    pub async fn dedicated_connection(&self) -> Result<MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| DataError::Connection(e.to_string()))
    }

    /// 공유 연결의 복제본을 반환합니다.
    pub fn connection(&self) -> MultiplexedConnection {
        self.connection.clone()
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    #[instrument(skip(self, value), fields(bytes = value.len()))]
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.connection.clone();
        let _: () = conn.set_ex(key, value, ttl_secs(ttl)).await?;
        Ok(())
    }

    #[instrument(skip(self, value))]
    async fn set_nx_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        let mut conn = self.connection.clone();

        // 원자적 획득을 위해 SET NX EX 사용
        let result: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl_secs(ttl))
            .query_async(&mut conn)
            .await?;

        debug!(acquired = result.is_some(), "SET NX EX");
        Ok(result.is_some())
    }

    #[instrument(skip(self, expected))]
    async fn delete_if_equals(&self, key: &str, expected: &str) -> Result<bool> {
        let mut conn = self.connection.clone();
        let deleted: i64 = self
            .compare_and_delete
            .key(key)
            .arg(expected)
            .invoke_async(&mut conn)
            .await?;
        Ok(deleted > 0)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection.clone();
        let deleted: i64 = conn.del(key).await?;
        Ok(deleted > 0)
    }

    async fn ping(&self) -> Result<bool> {
        let mut conn = self.connection.clone();
        let result: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(result == "PONG")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 실행: REDIS_URL=redis://localhost:6379 cargo test -p edge-data -- --ignored
    fn redis_url() -> String {
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string())
    }

    #[tokio::test]
    #[ignore]
    async fn test_set_nx_is_exclusive() {
        let store = RedisStore::connect(&redis_url()).await.unwrap();
        let key = format!("test:lock:{}", uuid::Uuid::new_v4());

        assert!(store.set_nx_ex(&key, "a", Duration::from_secs(5)).await.unwrap());
        assert!(!store.set_nx_ex(&key, "b", Duration::from_secs(5)).await.unwrap());

        assert!(!store.delete_if_equals(&key, "b").await.unwrap());
        assert!(store.delete_if_equals(&key, "a").await.unwrap());
        assert_eq!(store.get(&key).await.unwrap(), None);
    }

    #[tokio::test]
    #[ignore]
    async fn test_ping() {
        let store = RedisStore::connect(&redis_url()).await.unwrap();
        assert!(store.ping().await.unwrap());
    }
}
