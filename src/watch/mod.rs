// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Compiling the `[watch]` include / exclude glob patterns.
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//! - (Optionally) ignoring saves that leave a file's content unchanged,
//!   via blake3 content hashes.
//!
//! It does **not** know about units or dependencies; it only turns
//! filesystem changes into `SourceChanged` / `SourceRemoved` events.

pub mod event_handler;
pub mod hash;
pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use event_handler::classify_change;
pub use hash::{FileHashStore, HashStore, MemoryHashStore, HASH_FILE_PATH};
pub use patterns::SourceFilter;
pub use watcher::{spawn_watcher, WatchTarget, WatcherHandle};
