use crate::error::{Result, SessionError};
use crate::session::id::SessionId;
use crate::session::manager::SessionManager;
use crate::session::record::{SessionRecord, past_expiry};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// A client's state bag plus its expiry bookkeeping
///
/// This is a working copy of the record held by the store. Every mutation
/// (`set`, `delete`, `renew`) is written through the owning [`SessionManager`]
/// before the call returns; if the write fails the in-process change is
/// reverted and the error returned.
///
/// Two workers mutating the same session race: last writer wins and
/// concurrent `data` changes are not merged. Each session is expected to be
/// driven by one client at a time.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    expires_after: Duration,
    last_renewed_at: DateTime<Utc>,
    data: BTreeMap<String, Value>,
    manager: SessionManager,
}

impl Session {
    /// Fresh session under the manager's policy. Nothing is written until the first save.
    pub(crate) fn create(manager: SessionManager) -> Self {
        Self {
            id: manager.generate_id(),
            expires_after: manager.default_expiry(),
            last_renewed_at: Utc::now(),
            data: BTreeMap::new(),
            manager,
        }
    }

    pub(crate) fn from_record(record: SessionRecord, manager: SessionManager) -> Self {
        Self {
            expires_after: record.expires_after(),
            id: record.id,
            last_renewed_at: record.last_renewed_at,
            data: record.data,
            manager,
        }
    }

    pub(crate) fn to_record(&self) -> SessionRecord {
        SessionRecord::new(
            self.id.clone(),
            self.expires_after,
            self.last_renewed_at,
            self.data.clone(),
        )
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn expires_after(&self) -> Duration {
        self.expires_after
    }

    pub fn last_renewed_at(&self) -> DateTime<Utc> {
        self.last_renewed_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        past_expiry(self.last_renewed_at, self.expires_after, now)
    }

    /// Reset the renewal timestamp to now and persist
    pub async fn renew(&mut self) -> Result<()> {
        let limit = self.manager.operation_timeout();
        self.renew_within(limit).await
    }

    pub(crate) async fn renew_within(&mut self, limit: Option<Duration>) -> Result<()> {
        let previous = std::mem::replace(&mut self.last_renewed_at, Utc::now());

        if let Err(e) = self.manager.save_within(&*self, limit).await {
            self.last_renewed_at = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Persist the whole session through the manager
    pub async fn save(&self) -> Result<()> {
        self.manager.save_session(self).await
    }

    /// Raw JSON value stored under `key`
    pub fn get_value(&self, key: &str) -> Result<&Value> {
        self.data
            .get(key)
            .ok_or_else(|| SessionError::key_not_found(key))
    }

    /// Typed value stored under `key`
    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let value = self.get_value(key)?;
        serde_json::from_value(value.clone())
            .map_err(|e| SessionError::decode(format!("Value under {:?} has unexpected shape: {}", key, e)))
    }

    /// Insert or overwrite `key`, then persist
    pub async fn set<T>(&mut self, key: impl Into<String>, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let key = key.into();
        let value = serde_json::to_value(value)
            .map_err(|e| SessionError::encode(format!("Failed to serialize {:?}: {}", key, e)))?;

        let previous = self.data.insert(key.clone(), value);

        if let Err(e) = self.save().await {
            match previous {
                Some(old) => self.data.insert(key, old),
                None => self.data.remove(&key),
            };
            return Err(e);
        }
        Ok(())
    }

    /// Remove `key`, then persist. Returns the removed value.
    pub async fn delete(&mut self, key: &str) -> Result<Value> {
        let removed = self
            .data
            .remove(key)
            .ok_or_else(|| SessionError::key_not_found(key))?;

        if let Err(e) = self.save().await {
            self.data.insert(key.to_string(), removed);
            return Err(e);
        }
        Ok(removed)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.data.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Diagnostic rendering: `sid: <id>, {"key" = value, ...}` in key order
impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sid: {}, {{", self.id)?;
        for (i, (key, value)) in self.data.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{:?} = {}", key, value)?;
        }
        f.write_str("}")
    }
}
