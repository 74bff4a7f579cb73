// src/watch/event_handler.rs

//! Turning raw filesystem events into project events.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::ProjectEvent;
use crate::fs::FileSystem;
use crate::watch::hash::{compute_file_hash, record_if_changed, HashStore};
use crate::watch::path_utils::relative_str;
use crate::watch::patterns::SourceFilter;

/// Decide what, if anything, a change at `path` means for the project.
///
/// 1. Paths outside `root` or rejected by the filter are ignored.
/// 2. A path that no longer exists is a removal.
/// 3. With hashing enabled, a file whose content hash is unchanged is
///    ignored.
/// 4. Anything else is a modification.
pub fn classify_change(
    fs: &dyn FileSystem,
    root: &Path,
    path: &Path,
    filter: &SourceFilter,
    hash_store: Option<&mut dyn HashStore>,
) -> Option<ProjectEvent> {
    let Some(rel) = relative_str(root, path) else {
        warn!(?path, ?root, "could not relativize path against watch root");
        return None;
    };
    if !filter.matches(&rel) {
        return None;
    }

    if !fs.exists(path) {
        if let Some(store) = hash_store {
            if let Err(err) = store.forget(&rel) {
                warn!(source = %rel, error = %err, "failed to drop source hash");
            }
        }
        debug!(source = %rel, "watched source removed");
        return Some(ProjectEvent::SourceRemoved {
            path: path.to_path_buf(),
        });
    }
    if !fs.is_file(path) {
        return None;
    }

    if let (true, Some(store)) = (filter.use_hash(), hash_store) {
        match compute_file_hash(fs, path).and_then(|hash| record_if_changed(store, &rel, &hash)) {
            Ok(false) => {
                info!(source = %rel, "hash unchanged; ignoring change event");
                return None;
            }
            Ok(true) => {}
            Err(err) => {
                warn!(source = %rel, error = %err, "failed to hash source; treating as changed");
            }
        }
    }

    debug!(source = %rel, "watched source changed");
    Some(ProjectEvent::SourceChanged {
        path: path.to_path_buf(),
    })
}

/// Classify one event path and forward the result to the runtime.
///
/// Returns `false` once the runtime channel is closed.
pub async fn process_source_event(
    fs: Arc<dyn FileSystem>,
    root: &Path,
    path: PathBuf,
    filter: &Arc<SourceFilter>,
    runtime_tx: &mpsc::Sender<ProjectEvent>,
    hash_store: Arc<Mutex<Box<dyn HashStore>>>,
) -> bool {
    let root = root.to_path_buf();
    let filter = Arc::clone(filter);

    // Hashing reads the whole file; keep it off the async workers.
    let event = tokio::task::spawn_blocking(move || {
        let mut guard = match hash_store.lock() {
            Ok(g) => g,
            Err(_) => {
                warn!("hash store mutex poisoned; hashing disabled for this event");
                return classify_change(fs.as_ref(), &root, &path, &filter, None);
            }
        };
        let store: &mut dyn HashStore = guard.as_mut();
        classify_change(fs.as_ref(), &root, &path, &filter, Some(store))
    })
    .await
    .unwrap_or_else(|err| {
        warn!(error = %err, "change classification panicked");
        None
    });

    let Some(event) = event else {
        return true;
    };
    if let Err(err) = runtime_tx.send(event).await {
        warn!("failed to send source event to runtime: {err}");
        return false;
    }
    true
}
