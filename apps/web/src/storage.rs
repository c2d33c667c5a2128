use dmv_notify_core::ports::{Clock, KeyValueStore};
use dmv_notify_core::{AppError, Result};
use web_sys::{Storage, Window};

use crate::js;

/// `localStorage`, or nothing when the browser withholds it (private mode,
/// disabled storage). Reads then miss and writes fail softly.
pub struct LocalStore {
    storage: Option<Storage>,
}

impl LocalStore {
    pub fn new(window: &Window) -> Self {
        let storage = match window.local_storage() {
            Ok(storage) => storage,
            Err(error) => {
                log::warn!("localStorage unavailable: {}", js::describe(&error));
                None
            }
        };
        Self { storage }
    }

    fn storage(&self) -> Result<&Storage> {
        self.storage
            .as_ref()
            .ok_or_else(|| AppError::Unsupported("localStorage unavailable".to_string()))
    }
}

impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.as_ref()?.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.storage()?
            .set_item(key, value)
            .map_err(|error| AppError::Storage(js::describe(&error)))
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.storage()?
            .remove_item(key)
            .map_err(|error| AppError::Storage(js::describe(&error)))
    }
}

pub struct BrowserClock;

impl Clock for BrowserClock {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn now_millis(&self) -> u64 {
        js_sys::Date::now() as u64
    }
}
