//! Persisted key/value storage and the credential store built on it.
//!
//! The client keeps three keys, mirroring browser local storage:
//! - `token` - access token
//! - `refreshToken` - refresh token
//! - `darkMode` - stringified boolean preference

mod credentials;
mod file;
mod memory;

pub use credentials::{Credential, CredentialStore, StorageCredentials, TokenClaims, decode_claims};
pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::error::ClientResult;

pub const ACCESS_TOKEN_KEY: &str = "token";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
pub const DARK_MODE_KEY: &str = "darkMode";

/// Synchronous string key/value storage.
///
/// Reads are infallible (a missing or unreadable value is `None`); writes
/// report storage failures. A failed write leaves every key as it was.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> ClientResult<()>;
    fn remove(&self, key: &str) -> ClientResult<()>;

    /// Write several keys as one change. Backends that persist should
    /// override this so either all entries land or none do.
    fn set_many(&self, entries: &[(&str, &str)]) -> ClientResult<()> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Remove several keys as one change.
    fn remove_many(&self, keys: &[&str]) -> ClientResult<()> {
        for key in keys {
            self.remove(key)?;
        }
        Ok(())
    }
}
