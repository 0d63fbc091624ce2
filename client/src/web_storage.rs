use web_sys::{Storage, Window};

use crate::kv::{KeyValueStore, KvError};

/// Browser `localStorage`, used for guest favorites and the guest id.
pub struct LocalStorage {
    storage: Storage,
}

impl LocalStorage {
    pub fn open(window: &Window) -> Option<Self> {
        let storage = window.local_storage().ok().flatten()?;
        Some(Self { storage })
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
        self.storage
            .set_item(key, value)
            .map_err(|error| KvError::Unavailable(format!("{error:?}")))
    }

    fn remove(&self, key: &str) {
        let _ = self.storage.remove_item(key);
    }
}
