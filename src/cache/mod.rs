//! Local record cache and the two paths that write to it.
//!
//! - `CacheFirstListLoader` serves the cache, or replaces it from the first
//!   remote page on a cold start or forced refresh
//! - `RefreshEngine` appends further pages on top of the cache, tracking its
//!   position with a durable cursor
//!
//! Both share a `WriteGate` so their store mutations never interleave.

mod loader;
mod refresh;
mod storage;
mod traits;

pub use loader::CacheFirstListLoader;
pub use refresh::RefreshEngine;
pub use storage::SqliteStorage;
pub use traits::{fold_name, CacheSource, CursorStore, RecordStore, WriteGate};
