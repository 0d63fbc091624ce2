//! Small per-device state for the attendee view: favorites and a guest id.

use std::cell::RefCell;
use std::collections::HashMap;

use thiserror::Error;

use floorplan_shared::{BoothId, EventId};

pub const GUEST_SESSION_KEY: &str = "floorplan.guest_session";

#[derive(Debug, Error)]
pub enum KvError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("could not encode value: {0}")]
    Encode(#[from] serde_json::Error),
}

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), KvError>;
    fn remove(&self, key: &str);
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) {
        (**self).remove(key)
    }
}

#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKvStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.entries.borrow_mut().remove(key);
    }
}

/// Returns this device's guest id, creating and storing one on first use.
pub fn guest_session_id(store: &impl KeyValueStore) -> String {
    if let Some(existing) = store.get(GUEST_SESSION_KEY).filter(|id| !id.is_empty()) {
        return existing;
    }
    let id = uuid::Uuid::new_v4().to_string();
    if let Err(error) = store.set(GUEST_SESSION_KEY, &id) {
        tracing::warn!(%error, "guest id not persisted");
    }
    id
}

/// Booths an attendee starred for one event.
pub struct GuestFavorites<K> {
    store: K,
    key: String,
}

impl<K: KeyValueStore> GuestFavorites<K> {
    pub fn new(store: K, event_id: &EventId) -> Self {
        Self {
            store,
            key: format!("floorplan.favorites.{event_id}"),
        }
    }

    /// Unreadable entries count as no favorites.
    pub fn list(&self) -> Vec<BoothId> {
        self.store
            .get(&self.key)
            .and_then(|raw| serde_json::from_str::<Vec<String>>(&raw).ok())
            .unwrap_or_default()
            .into_iter()
            .map(BoothId::new)
            .collect()
    }

    pub fn is_favorite(&self, booth_id: &BoothId) -> bool {
        self.list().contains(booth_id)
    }

    /// Flips a booth in or out of the list; returns the new state.
    pub fn toggle(&self, booth_id: &BoothId) -> Result<bool, KvError> {
        let mut ids = self.list();
        let now_favorite = match ids.iter().position(|id| id == booth_id) {
            Some(index) => {
                ids.remove(index);
                false
            }
            None => {
                ids.push(booth_id.clone());
                true
            }
        };
        let raw = serde_json::to_string(&ids.iter().map(BoothId::as_str).collect::<Vec<_>>())?;
        self.store.set(&self.key, &raw)?;
        Ok(now_favorite)
    }

    pub fn clear(&self) {
        self.store.remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn favorites_toggle_and_survive_reopening() {
        let store = MemoryKvStore::new();
        let event = EventId::new("expo");
        let favorites = GuestFavorites::new(&store, &event);
        assert!(favorites.toggle(&BoothId::new("a")).unwrap());
        assert!(favorites.toggle(&BoothId::new("b")).unwrap());
        assert!(!favorites.toggle(&BoothId::new("a")).unwrap());

        let reopened = GuestFavorites::new(&store, &event);
        assert_eq!(reopened.list(), vec![BoothId::new("b")]);
        assert!(reopened.is_favorite(&BoothId::new("b")));
        reopened.clear();
        assert!(favorites.list().is_empty());
    }

    #[test]
    fn corrupt_favorites_read_as_empty() {
        let store = MemoryKvStore::new();
        store.set("floorplan.favorites.expo", "not json").unwrap();
        let favorites = GuestFavorites::new(&store, &EventId::new("expo"));
        assert!(favorites.list().is_empty());
    }

    #[test]
    fn guest_id_is_stable_per_device() {
        let store = MemoryKvStore::new();
        let first = guest_session_id(&store);
        assert_eq!(guest_session_id(&store), first);
        assert_eq!(first.len(), 36);
    }
}
