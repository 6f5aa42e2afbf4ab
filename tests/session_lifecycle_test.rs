use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tidestore::testing::CountingStore;
use tidestore::{
    BackingStore, InMemoryStore, Lookup, SessionConfig, SessionError, SessionId, SessionManager,
    SessionRecord,
};

fn manager_over(store: Arc<InMemoryStore>) -> SessionManager {
    SessionManager::builder(store).build()
}

#[tokio::test]
async fn test_live_session_round_trip() {
    let store = Arc::new(InMemoryStore::new());
    let manager = manager_over(store);

    let mut session = manager.get_session(None).await;
    session.set("user_id", &42).await.unwrap();
    session.set("roles", &vec!["admin", "editor"]).await.unwrap();
    let renewed_before = session.last_renewed_at();

    let loaded = manager.get_session(Some(session.id().as_str())).await;
    assert_eq!(loaded.id(), session.id());
    assert_eq!(loaded.get::<u64>("user_id").unwrap(), 42);
    assert_eq!(loaded.get_value("roles").unwrap(), &json!(["admin", "editor"]));
    assert!(loaded.last_renewed_at() >= renewed_before);
}

#[tokio::test]
async fn test_save_then_get_preserves_data() {
    let store = Arc::new(InMemoryStore::new());
    let manager = manager_over(store);

    let mut session = manager.new_session();
    session.set("cart", &json!({"items": [1, 2, 3], "coupon": null})).await.unwrap();
    manager.save_session(&session).await.unwrap();

    let loaded = manager.get_session(Some(session.id().as_str())).await;
    let original: Vec<_> = session.iter().collect();
    let reloaded: Vec<_> = loaded.iter().collect();
    assert_eq!(original, reloaded);
}

#[tokio::test]
async fn test_value_survives_manager_restart() {
    let store = Arc::new(InMemoryStore::new());

    let id = {
        let first = manager_over(store.clone());
        let mut session = first.get_session(None).await;
        session.set("theme", "dark").await.unwrap();
        session.id().clone()
    };

    // Fresh manager over the same store, as after a process restart
    let second = manager_over(store);
    let session = second.get_session(Some(id.as_str())).await;
    assert_eq!(session.id(), &id);
    assert_eq!(session.get::<String>("theme").unwrap(), "dark");
}

#[tokio::test]
async fn test_unknown_identifier_yields_new_session() {
    let manager = manager_over(Arc::new(InMemoryStore::new()));
    let requested = "0f".repeat(32);

    let session = manager.get_session(Some(&requested)).await;
    assert_ne!(session.id().as_str(), requested);
    assert!(session.is_empty());
}

#[tokio::test]
async fn test_expired_record_deleted_and_replaced() {
    let store = Arc::new(InMemoryStore::new());
    let deletions = Arc::new(AtomicUsize::new(0));
    let counter = deletions.clone();
    let manager = SessionManager::builder(store.clone())
        .on_delete(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .build();

    let stale_id = SessionId::parse(&"3c".repeat(32)).unwrap();
    let mut data = BTreeMap::new();
    data.insert("user_id".to_string(), json!(1));
    let record = SessionRecord::new(
        stale_id.clone(),
        Duration::from_secs(7200),
        chrono::Utc::now() - chrono::TimeDelta::seconds(7201),
        data,
    );
    store
        .set_bytes(stale_id.as_str(), record.encode().unwrap())
        .await
        .unwrap();

    assert!(matches!(manager.lookup(Some(stale_id.as_str())).await, Lookup::Expired(_)));

    let session = manager.get_session(Some(stale_id.as_str())).await;
    assert_ne!(session.id(), &stale_id);
    assert!(!session.contains("user_id"));
    assert_eq!(store.get_bytes(stale_id.as_str()).await.unwrap(), None);
    assert_eq!(deletions.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_delete_key_semantics() {
    let store = Arc::new(InMemoryStore::new());
    let manager = manager_over(store.clone());
    let mut session = manager.get_session(None).await;

    assert!(matches!(session.delete("absent").await, Err(SessionError::KeyNotFound(_))));

    session.set("flash", "welcome back").await.unwrap();
    session.delete("flash").await.unwrap();
    assert!(!session.contains("flash"));

    let raw = store.get_bytes(session.id().as_str()).await.unwrap().unwrap();
    let stored = SessionRecord::decode(&raw, session.id()).unwrap();
    assert!(!stored.data.contains_key("flash"));
}

#[tokio::test]
async fn test_generated_identifiers_are_distinct() {
    let manager = manager_over(Arc::new(InMemoryStore::new()));
    let a = manager.new_session();
    let b = manager.new_session();
    assert_ne!(a.id(), b.id());
}

#[tokio::test]
async fn test_enumeration_skips_undecodable_record() {
    let store = Arc::new(InMemoryStore::new());
    let manager = manager_over(store.clone());

    let mut expected = Vec::new();
    for i in 0..4 {
        let mut session = manager.new_session();
        session.set("index", &i).await.unwrap();
        expected.push(session.id().clone());
    }
    store
        .set_bytes(&"ee".repeat(32), b"\x00\x01 not json".to_vec())
        .await
        .unwrap();

    let mut found: Vec<SessionId> = manager
        .all_sessions()
        .await
        .unwrap()
        .map(|s| s.id().clone())
        .collect()
        .await;
    found.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    expected.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    assert_eq!(found, expected);
}

#[tokio::test]
async fn test_write_count_per_operation() {
    let store = Arc::new(CountingStore::new());
    let manager = SessionManager::builder(store.clone()).build();

    let mut session = manager.get_session(None).await;
    assert_eq!(store.writes(), 0);

    session.set("a", &1).await.unwrap();
    session.set("b", &2).await.unwrap();
    assert_eq!(store.writes(), 2);

    let _reloaded = manager.get_session(Some(session.id().as_str())).await;
    assert_eq!(store.writes(), 3);

    manager.delete_session(&session).await.unwrap();
    assert_eq!(store.deletes(), 1);
}

#[tokio::test]
async fn test_concurrent_lookups_share_one_manager() {
    let store = Arc::new(InMemoryStore::new());
    let manager = manager_over(store);
    let mut session = manager.get_session(None).await;
    session.set("counter", &0).await.unwrap();
    let id = session.id().to_string();

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let manager = manager.clone();
            let id = id.clone();
            tokio::spawn(async move { manager.get_session(Some(&id)).await })
        })
        .collect();

    for handle in handles {
        let session = handle.await.unwrap();
        assert_eq!(session.id().as_str(), id);
        assert_eq!(session.get::<i32>("counter").unwrap(), 0);
    }
}

#[tokio::test]
async fn test_manager_from_config() {
    let config = SessionConfig::builder()
        .default_expiry_seconds(120)
        .operation_timeout_ms(500)
        .build()
        .unwrap();
    let manager = SessionManager::from_config(&config).unwrap();

    let session = manager.get_session(None).await;
    assert_eq!(session.expires_after(), Duration::from_secs(120));
}
