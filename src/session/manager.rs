use crate::error::{Result, SessionError};
use crate::session::config::SessionConfig;
use crate::session::id::SessionId;
use crate::session::lookup::{Lookup, classify};
use crate::session::record::{SessionRecord, expiry_millis};
use crate::session::state::Session;
use crate::store;
use crate::traits::entropy::{EntropySource, OsEntropy};
use crate::traits::store::BackingStore;
use chrono::Utc;
use futures::stream::{self, BoxStream, StreamExt};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Callback invoked with the identifier of every session removed from the store
///
/// Called from whichever task performs the deletion, so it must be safe to
/// invoke concurrently.
pub type DeletionHook = Arc<dyn Fn(&SessionId) + Send + Sync>;

/// Default session lifetime (2 hours)
pub const DEFAULT_EXPIRY: Duration = Duration::from_secs(7200);

/// Sole gateway between [`Session`] working copies and the backing store
///
/// Construct one at startup and hand clones to request handlers; clones share
/// the store connection, expiry policy and deletion hook.
///
/// # Example
///
/// ```rust,ignore
/// use tidestore::{SessionManager, store::InMemoryStore};
/// use std::sync::Arc;
///
/// let manager = SessionManager::builder(Arc::new(InMemoryStore::new())).build();
///
/// // In a request handler: never fails, worst case a fresh empty session
/// let mut session = manager.get_session(cookie.as_deref()).await;
/// session.set("user_id", &42).await?;
/// // send session.id() back in the cookie
/// ```
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<ManagerInner>,
}

struct ManagerInner {
    store: Arc<dyn BackingStore>,
    entropy: Arc<dyn EntropySource>,
    default_expiry: Duration,
    key_prefix: String,
    operation_timeout: Option<Duration>,
    on_delete: Option<DeletionHook>,
}

impl SessionManager {
    /// Create a new SessionManager builder over `store`
    pub fn builder(store: Arc<dyn BackingStore>) -> SessionManagerBuilder {
        SessionManagerBuilder::new(store)
    }

    /// Connect to the configured store and build a manager without a deletion hook
    pub fn from_config(config: &SessionConfig) -> Result<Self> {
        config.validate()?;
        let store = store::connect(&config.store)?;
        Ok(Self::builder(store).config(config).build())
    }

    pub fn default_expiry(&self) -> Duration {
        self.inner.default_expiry
    }

    pub(crate) fn operation_timeout(&self) -> Option<Duration> {
        self.inner.operation_timeout
    }

    pub fn is_healthy(&self) -> bool {
        self.inner.store.is_healthy()
    }

    pub(crate) fn generate_id(&self) -> SessionId {
        SessionId::generate(self.inner.entropy.as_ref())
    }

    /// Fresh session under this manager's policy, not yet persisted
    pub fn new_session(&self) -> Session {
        Session::create(self.clone())
    }

    /// Fetch and classify the record for a caller-supplied identifier
    pub async fn lookup(&self, cookie: Option<&str>) -> Lookup {
        self.lookup_within(cookie, self.inner.operation_timeout).await
    }

    async fn lookup_within(&self, cookie: Option<&str>, limit: Option<Duration>) -> Lookup {
        let Some(id) = cookie.and_then(SessionId::parse) else {
            tracing::debug!(present = cookie.is_some(), "No usable session identifier");
            return Lookup::Miss;
        };

        let key = self.store_key(&id);
        let fetched = within(limit, self.inner.store.get_bytes(&key)).await;
        classify(&id, fetched, Utc::now())
    }

    /// Return the caller's session, or a brand-new one
    ///
    /// Never fails: an absent, unknown, expired or corrupt identifier, an
    /// unreachable store and a timed-out fetch all yield a fresh session with
    /// a new identifier. A live session is renewed (and re-persisted) first.
    pub async fn get_session(&self, cookie: Option<&str>) -> Session {
        let lookup = self.lookup(cookie).await;
        self.resolve(lookup).await
    }

    /// [`get_session`](Self::get_session) bounded by an overall deadline
    ///
    /// The fetch, the renewal write and any expired-record cleanup together
    /// get `limit`. A fetch that runs out of time is a miss; a renewal or
    /// cleanup that runs out of time is logged and the session still returned.
    pub async fn get_session_within(&self, cookie: Option<&str>, limit: Duration) -> Session {
        let deadline = Instant::now() + limit;
        let lookup = self.lookup_within(cookie, Some(limit)).await;
        let remaining = deadline.saturating_duration_since(Instant::now());
        self.resolve_within(lookup, Some(remaining)).await
    }

    /// Turn a lookup outcome into a usable session
    pub async fn resolve(&self, lookup: Lookup) -> Session {
        self.resolve_within(lookup, self.inner.operation_timeout).await
    }

    async fn resolve_within(&self, lookup: Lookup, limit: Option<Duration>) -> Session {
        match lookup {
            Lookup::Hit(record) => {
                let mut session = Session::from_record(record, self.clone());
                if let Err(e) = session.renew_within(limit).await {
                    tracing::warn!(
                        session_id = session.id().short(),
                        error = %e,
                        "Failed to persist session renewal"
                    );
                }
                tracing::debug!(session_id = session.id().short(), "Session hit");
                session
            }
            Lookup::Expired(record) => {
                tracing::debug!(session_id = record.id.short(), "Session expired");
                if let Err(e) = self.delete_within(&record.id, limit).await {
                    tracing::warn!(
                        session_id = record.id.short(),
                        error = %e,
                        "Failed to remove expired session"
                    );
                }
                self.new_session()
            }
            Lookup::Corrupt(reason) => {
                tracing::warn!(reason = %reason, "Stored session could not be decoded");
                self.new_session()
            }
            Lookup::Miss => self.new_session(),
        }
    }

    /// Write the full session record under its identifier
    pub async fn save_session(&self, session: &Session) -> Result<()> {
        self.save_within(session, self.inner.operation_timeout).await
    }

    pub(crate) async fn save_within(&self, session: &Session, limit: Option<Duration>) -> Result<()> {
        let bytes = session.to_record().encode()?;
        let key = self.store_key(session.id());

        within(limit, self.inner.store.set_bytes(&key, bytes)).await?;

        tracing::debug!(session_id = session.id().short(), keys = session.len(), "Session saved");
        Ok(())
    }

    /// Notify the deletion hook, then remove the record from the store
    pub async fn delete_session(&self, session: &Session) -> Result<()> {
        self.delete_by_id(session.id()).await
    }

    async fn delete_by_id(&self, id: &SessionId) -> Result<()> {
        self.delete_within(id, self.inner.operation_timeout).await
    }

    async fn delete_within(&self, id: &SessionId, limit: Option<Duration>) -> Result<()> {
        if let Some(hook) = &self.inner.on_delete {
            hook(id);
        }

        let key = self.store_key(id);
        within(limit, self.inner.store.delete(&key)).await?;

        tracing::debug!(session_id = id.short(), "Session deleted");
        Ok(())
    }

    /// Every decodable session in the store
    ///
    /// Keys are listed once, up front; each record is then fetched and decoded
    /// lazily as the stream is polled. Records deleted or rewritten after the
    /// listing are seen as they are at fetch time (deleted ones are skipped).
    /// Undecodable records are skipped with a warning.
    pub async fn all_sessions(&self) -> Result<BoxStream<'static, Session>> {
        let pattern = format!("{}*", self.inner.key_prefix);
        let keys = self.with_deadline(self.inner.store.keys(&pattern)).await?;
        tracing::debug!(count = keys.len(), "Enumerating sessions");

        let manager = self.clone();
        Ok(stream::iter(keys)
            .filter_map(move |key| {
                let manager = manager.clone();
                async move { manager.load_key(&key).await }
            })
            .boxed())
    }

    async fn load_key(&self, key: &str) -> Option<Session> {
        let Some(id) = key
            .strip_prefix(self.inner.key_prefix.as_str())
            .and_then(SessionId::parse)
        else {
            tracing::warn!(key = %key, "Skipping store key that is not a session identifier");
            return None;
        };

        match self.with_deadline(self.inner.store.get_bytes(key)).await {
            Ok(Some(bytes)) => match SessionRecord::decode(&bytes, &id) {
                Ok(record) => Some(Session::from_record(record, self.clone())),
                Err(e) => {
                    tracing::warn!(session_id = id.short(), error = %e, "Skipping undecodable session");
                    None
                }
            },
            Ok(None) => {
                tracing::debug!(session_id = id.short(), "Session removed during enumeration");
                None
            }
            Err(e) => {
                tracing::warn!(session_id = id.short(), error = %e, "Skipping unreadable session");
                None
            }
        }
    }

    /// Delete every expired record, returning how many were removed
    ///
    /// The deletion hook fires for each one.
    pub async fn purge_expired(&self) -> Result<usize> {
        let now = Utc::now();
        let mut sessions = self.all_sessions().await?;
        let mut removed = 0;

        while let Some(session) = sessions.next().await {
            if session.is_expired_at(now) {
                self.delete_by_id(session.id()).await?;
                removed += 1;
            }
        }

        if removed > 0 {
            tracing::info!(removed, "Purged expired sessions");
        }
        Ok(removed)
    }

    fn store_key(&self, id: &SessionId) -> String {
        format!("{}{}", self.inner.key_prefix, id)
    }

    async fn with_deadline<T, F>(&self, op: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        within(self.inner.operation_timeout, op).await
    }
}

async fn within<T, F>(limit: Option<Duration>, op: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, op)
            .await
            .map_err(|_| SessionError::timeout(limit))?,
        None => op.await,
    }
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("default_expiry", &self.inner.default_expiry)
            .field("key_prefix", &self.inner.key_prefix)
            .field("operation_timeout", &self.inner.operation_timeout)
            .field("on_delete", &self.inner.on_delete.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for SessionManager
#[must_use = "builder does nothing until you call build()"]
pub struct SessionManagerBuilder {
    store: Arc<dyn BackingStore>,
    entropy: Arc<dyn EntropySource>,
    default_expiry: Duration,
    key_prefix: String,
    operation_timeout: Option<Duration>,
    on_delete: Option<DeletionHook>,
}

impl SessionManagerBuilder {
    pub fn new(store: Arc<dyn BackingStore>) -> Self {
        Self {
            store,
            entropy: Arc::new(OsEntropy),
            default_expiry: DEFAULT_EXPIRY,
            key_prefix: String::new(),
            operation_timeout: None,
            on_delete: None,
        }
    }

    /// Apply expiry, key prefix and timeout from `config`
    pub fn config(mut self, config: &SessionConfig) -> Self {
        self.default_expiry = config.default_expiry();
        self.key_prefix = config.store.key_prefix.clone();
        self.operation_timeout = config.operation_timeout();
        self
    }

    pub fn default_expiry(mut self, expiry: Duration) -> Self {
        self.default_expiry = expiry;
        self
    }

    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn operation_timeout(mut self, limit: Duration) -> Self {
        self.operation_timeout = Some(limit);
        self
    }

    pub fn entropy(mut self, entropy: Arc<dyn EntropySource>) -> Self {
        self.entropy = entropy;
        self
    }

    pub fn on_delete<F>(mut self, hook: F) -> Self
    where
        F: Fn(&SessionId) + Send + Sync + 'static,
    {
        self.on_delete = Some(Arc::new(hook));
        self
    }

    /// Build the manager; the default expiry is rounded up to whole milliseconds
    pub fn build(self) -> SessionManager {
        let default_expiry = Duration::from_millis(expiry_millis(self.default_expiry));

        tracing::info!(
            default_expiry_ms = default_expiry.as_millis() as u64,
            key_prefix = %self.key_prefix,
            "Session manager ready"
        );

        SessionManager {
            inner: Arc::new(ManagerInner {
                store: self.store,
                entropy: self.entropy,
                default_expiry,
                key_prefix: self.key_prefix,
                operation_timeout: self.operation_timeout,
                on_delete: self.on_delete,
            }),
        }
    }
}
