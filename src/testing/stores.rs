use crate::error::{Result, SessionError};
use crate::store::InMemoryStore;
use crate::traits::store::BackingStore;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// In-memory store that records how often it is called
#[derive(Default)]
pub struct CountingStore {
    inner: InMemoryStore,
    reads: AtomicUsize,
    writes: AtomicUsize,
    deletes: AtomicUsize,
    fail_writes: AtomicBool,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `get_bytes` calls
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of successful `set_bytes` calls
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of successful `delete` calls
    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    /// Make subsequent `set_bytes` and `delete` calls fail with `StoreUnavailable`
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// The wrapped store, for inspecting or seeding raw records
    pub fn inner(&self) -> &InMemoryStore {
        &self.inner
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SessionError::store_unavailable("write rejected by CountingStore"));
        }
        Ok(())
    }
}

#[async_trait]
impl BackingStore for CountingStore {
    async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let value = self.inner.get_bytes(key).await?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(value)
    }

    async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.check_writable()?;
        self.inner.set_bytes(key, value).await?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.check_writable()?;
        self.inner.delete(key).await?;
        self.deletes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        self.inner.keys(pattern).await
    }

    fn is_healthy(&self) -> bool {
        true
    }
}

/// Store whose every call fails with `StoreUnavailable`
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableStore;

#[async_trait]
impl BackingStore for UnavailableStore {
    async fn get_bytes(&self, _key: &str) -> Result<Option<Vec<u8>>> {
        Err(SessionError::store_unavailable("connection refused"))
    }

    async fn set_bytes(&self, _key: &str, _value: Vec<u8>) -> Result<()> {
        Err(SessionError::store_unavailable("connection refused"))
    }

    async fn delete(&self, _key: &str) -> Result<()> {
        Err(SessionError::store_unavailable("connection refused"))
    }

    async fn keys(&self, _pattern: &str) -> Result<Vec<String>> {
        Err(SessionError::store_unavailable("connection refused"))
    }

    fn is_healthy(&self) -> bool {
        false
    }
}

/// In-memory store that sleeps for a fixed delay before every call
#[derive(Clone)]
pub struct SlowStore {
    inner: InMemoryStore,
    delay: Duration,
}

impl SlowStore {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: InMemoryStore::new(),
            delay,
        }
    }
}

#[async_trait]
impl BackingStore for SlowStore {
    async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        tokio::time::sleep(self.delay).await;
        self.inner.get_bytes(key).await
    }

    async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<()> {
        tokio::time::sleep(self.delay).await;
        self.inner.set_bytes(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        tokio::time::sleep(self.delay).await;
        self.inner.delete(key).await
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        tokio::time::sleep(self.delay).await;
        self.inner.keys(pattern).await
    }

    fn is_healthy(&self) -> bool {
        true
    }
}
