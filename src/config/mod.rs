//! Unified configuration system.
//!
//! Consolidates configuration from tiers with field-by-field YAML merging:
//! 1. **Defaults** - built in (the API URL can be baked in with `TODO_API_URL` at build time)
//! 2. **Project** - `$CWD/todo-client/config.yaml`
//! 3. **User** - `~/.todo-client/config.yaml`
//! 4. **Environment** - see below
//!
//! Command-line flags are applied on top by the binary.
//!
//! ## Environment Variables
//! - `TODO_CLIENT_CONFIG_PATH` - Explicit config file (replaces the tier search)
//! - `TODO_CLIENT_API_URL` - API base URL
//! - `TODO_CLIENT_STORAGE_PATH` - Token/preference storage file
//! - `TODO_CLIENT_TIMEOUT_SECS` - Per-request timeout
//! - `TODO_CLIENT_USER_DIR` - User config dir (default: `~/.todo-client`)
//! - `TODO_CLIENT_PROJECT_DIR` - Project config dir (default: `./todo-client`)

mod loader;
mod merge;
mod types;

pub use loader::{ConfigLoader, ConfigPaths, ConfigTier, apply_overrides};
pub use merge::{deep_merge, deep_merge_all};
pub use types::*;
