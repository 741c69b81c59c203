//! Tweeter session layer
//!
//! Tracks who is signed in and the display name they post under. The display
//! name survives restarts through a small key-value store.

mod holder;
mod storage;

pub use holder::{SessionHolder, SessionSnapshot, DISPLAY_NAME_KEY};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
