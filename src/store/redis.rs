use crate::error::{Result, SessionError};
use crate::traits::store::BackingStore;
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Redis backing store implementation
///
/// All clones share one multiplexed connection, established on first use.
/// Records are written with plain `SET` (no store-side TTL): expiry is
/// decided from the session record itself.
#[derive(Clone)]
pub struct RedisStore {
    client: redis::Client,
    connection: Arc<OnceCell<MultiplexedConnection>>,
    /// Cached health status (updated by every round trip)
    healthy: Arc<AtomicBool>,
}

impl RedisStore {
    /// Create a new Redis store from a connection URL
    ///
    /// No connection is opened until the first command.
    pub fn new(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| SessionError::invalid_config(format!("Failed to create Redis client: {}", e)))?;

        Ok(Self {
            client,
            connection: Arc::new(OnceCell::new()),
            healthy: Arc::new(AtomicBool::new(true)),
        })
    }

    /// Get the shared connection, connecting on first use
    async fn get_connection(&self) -> Result<MultiplexedConnection> {
        let conn = self
            .connection
            .get_or_try_init(|| async {
                tracing::debug!("Opening Redis connection");
                self.client.get_multiplexed_async_connection().await
            })
            .await
            .map_err(|e| self.unavailable("Failed to get Redis connection", e))?;

        Ok(conn.clone())
    }

    /// Send `PING` and update the cached health status
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.get_connection().await?;

        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(|e| self.unavailable("Redis PING failed", e))?;

        self.healthy.store(true, Ordering::Relaxed);
        Ok(())
    }

    fn unavailable(&self, context: &str, err: redis::RedisError) -> SessionError {
        self.healthy.store(false, Ordering::Relaxed);
        SessionError::store_unavailable(format!("{}: {}", context, err))
    }

    fn mark_healthy<T>(&self, value: T) -> T {
        self.healthy.store(true, Ordering::Relaxed);
        value
    }
}

#[async_trait]
impl BackingStore for RedisStore {
    async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.get_connection().await?;

        let value = redis::cmd("GET")
            .arg(key)
            .query_async::<Option<Vec<u8>>>(&mut conn)
            .await
            .map_err(|e| self.unavailable("Redis GET failed", e))?;

        Ok(self.mark_healthy(value))
    }

    async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let mut conn = self.get_connection().await?;

        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| self.unavailable("Redis SET failed", e))?;

        Ok(self.mark_healthy(()))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.get_connection().await?;

        redis::cmd("DEL")
            .arg(key)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| self.unavailable("Redis DEL failed", e))?;

        Ok(self.mark_healthy(()))
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let mut conn = self.get_connection().await?;

        let keys = redis::cmd("KEYS")
            .arg(pattern)
            .query_async::<Vec<String>>(&mut conn)
            .await
            .map_err(|e| self.unavailable("Redis KEYS failed", e))?;

        Ok(self.mark_healthy(keys))
    }

    fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Relaxed)
    }
}
