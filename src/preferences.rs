//! Persisted user preferences.

use crate::error::ClientResult;
use crate::store::{DARK_MODE_KEY, Storage};
use std::sync::Arc;

#[derive(Clone)]
pub struct Preferences {
    storage: Arc<dyn Storage>,
}

impl Preferences {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Stored as the string `"true"`; anything else reads as light mode.
    pub fn dark_mode(&self) -> bool {
        self.storage.get(DARK_MODE_KEY).as_deref() == Some("true")
    }

    pub fn set_dark_mode(&self, enabled: bool) -> ClientResult<()> {
        self.storage
            .set(DARK_MODE_KEY, if enabled { "true" } else { "false" })
    }

    /// Flip the preference and return the new value.
    pub fn toggle_dark_mode(&self) -> ClientResult<bool> {
        let enabled = !self.dark_mode();
        self.set_dark_mode(enabled)?;
        Ok(enabled)
    }
}
