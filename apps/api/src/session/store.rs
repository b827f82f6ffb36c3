//! Session persistence. A session is four string slots behind a
//! `SessionStore`; Redis in production, an in-process map for dev and tests.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::session::models::{RawSlots, Slot, TailorSession};

const REDIS_KEY_PREFIX: &str = "tailor:session";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// All stored slots of a session; empty when the session is unknown.
    async fn load(&self, id: Uuid) -> Result<RawSlots, StoreError>;

    /// Writes the given slots in one step, leaving the others as they are.
    async fn save(&self, id: Uuid, values: &[(Slot, String)]) -> Result<(), StoreError>;
}

/// Writes the named slots of `session` to the store.
pub async fn save_slots(
    store: &dyn SessionStore,
    session: &TailorSession,
    slots: &[Slot],
) -> Result<(), StoreError> {
    let mut values = Vec::with_capacity(slots.len());
    for slot in slots {
        if let Some(value) = session.slot_value(*slot)? {
            values.push((*slot, value));
        }
    }
    if values.is_empty() {
        return Ok(());
    }
    store.save(session.id, &values).await
}

/// One Redis hash per session, refreshed to `ttl` on every write.
pub struct RedisSessionStore {
    client: redis::Client,
    ttl: Duration,
}

impl RedisSessionStore {
    pub fn new(client: redis::Client, ttl: Duration) -> Self {
        Self { client, ttl }
    }

    fn key(id: Uuid) -> String {
        format!("{REDIS_KEY_PREFIX}:{id}")
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn load(&self, id: Uuid) -> Result<RawSlots, StoreError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let values: HashMap<String, String> = conn.hgetall(Self::key(id)).await?;
        Ok(RawSlots::from_keyed(values))
    }

    async fn save(&self, id: Uuid, values: &[(Slot, String)]) -> Result<(), StoreError> {
        let key = Self::key(id);
        let fields: Vec<(&str, &str)> = values
            .iter()
            .map(|(slot, value)| (slot.key(), value.as_str()))
            .collect();

        let mut conn = self.client.get_multiplexed_async_connection().await?;
        redis::pipe()
            .atomic()
            .hset_multiple(&key, &fields)
            .ignore()
            .expire(&key, self.ttl.as_secs() as i64)
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await?;

        debug!(session_id = %id, slots = values.len(), "Session saved to Redis");
        Ok(())
    }
}

/// Process-local store. Sessions live until the process exits.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<Uuid, RawSlots>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: Uuid) -> Result<RawSlots, StoreError> {
        Ok(self
            .sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }

    async fn save(&self, id: Uuid, values: &[(Slot, String)]) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().await;
        let slots = sessions.entry(id).or_default();
        for (slot, value) in values {
            slots.insert(*slot, value.clone());
        }
        Ok(())
    }
}
