//! Packager configuration.
//!
//! Settings come from four tiers merged field by field:
//! 1. **Defaults** - every field has a serde default
//! 2. **Project** - `packager.yaml` in the project directory (or `--config`)
//! 3. **Environment** - `CONFIG_PACKAGER_*` variables
//! 4. **Overrides** - command-line flags
//!
//! ## Environment Variables
//! - `CONFIG_PACKAGER_BUILD_DIR` - Build directory
//! - `CONFIG_PACKAGER_LOCAL_REPOSITORY` - Local artifact repository
//! - `CONFIG_PACKAGER_SERVER_ID` - Server to deploy into after compiling
//! - `CONFIG_PACKAGER_SERVERS_DIR` - Directory holding local servers
//! - `CONFIG_PACKAGER_DEBOUNCE_MS` - Watcher quiet period
//! - `CONFIG_PACKAGER_WATCH_COMMAND` - Command the watcher runs

mod loader;
mod merge;
mod types;

pub use loader::{ConfigLoader, ConfigTier, ENV_OVERRIDES, PROJECT_CONFIG_FILE};
pub use merge::{merge_tiers, overlay_in_place};
pub use types::*;
