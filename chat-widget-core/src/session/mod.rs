//! Session-continuity token persistence
//!
//! The answering service hands out an opaque token that ties follow-up
//! questions to earlier ones. The widget keeps exactly one such token and
//! persists it so it survives restarts.

pub mod file;
pub mod store;

pub use file::FileSessionStore;
pub use store::{MemorySessionStore, SessionStore, SessionToken};

use crate::config::SessionConfig;
use crate::utils::expand_tilde;

/// Build the store selected by configuration
pub fn open_store(config: &SessionConfig) -> Box<dyn SessionStore> {
    if config.persist {
        Box::new(FileSessionStore::open(
            expand_tilde(&config.storage_path),
            config.storage_key.clone(),
        ))
    } else {
        Box::new(MemorySessionStore::new())
    }
}
