//! Local image cache and its synchronization with the remote API.
//!
//! - `storage` persists cached items in SQLite, keyed by remote id
//! - `observe` provides the live query plumbing (subscribe / unsubscribe)
//! - `sync` fetches pages from the remote and writes them through the store

mod observe;
mod storage;
mod sync;

pub use observe::{Observer, Subscription};
pub use storage::{ItemStore, SqliteStorage};
pub use sync::{SyncError, Synchronizer, BATCH_SIZE};
