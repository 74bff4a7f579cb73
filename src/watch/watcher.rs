// src/watch/watcher.rs

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use notify::event::{EventKind, ModifyKind};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::ProjectEvent;
use crate::fs::{FileSystem, RealFileSystem};
use crate::types::HashStorageMode;
use crate::watch::event_handler::process_source_event;
use crate::watch::hash::{compute_file_hash, FileHashStore, HashStore, MemoryHashStore};
use crate::watch::path_utils::relative_str;
use crate::watch::patterns::{collect_matching_files, SourceFilter};

/// Handle for the filesystem watcher.
///
/// Keeps the underlying `RecommendedWatcher` alive. Dropping this handle
/// stops file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Where the watcher looks and where it keeps its hashes.
#[derive(Debug, Clone)]
pub struct WatchTarget {
    /// Directory watched recursively; the filter's patterns are relative to it.
    pub source_root: PathBuf,
    /// Directory holding `.incbuild/hashes` in `File` mode.
    pub project_root: PathBuf,
    pub hash_storage: HashStorageMode,
}

/// Spawn a filesystem watcher that observes the source root recursively and
/// sends `SourceChanged` / `SourceRemoved` events for files the filter
/// accepts.
pub fn spawn_watcher(
    target: WatchTarget,
    filter: SourceFilter,
    runtime_tx: mpsc::Sender<ProjectEvent>,
) -> Result<WatcherHandle> {
    let root = target
        .source_root
        .canonicalize()
        .unwrap_or_else(|_| target.source_root.clone());

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        {
            let event_tx = event_tx.clone();
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if let Err(err) = event_tx.send(event) {
                        eprintln!("incbuild: failed to forward notify event: {err}");
                    }
                }
                Err(err) => {
                    eprintln!("incbuild: file watch error: {err}");
                }
            }
        },
        Config::default(),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;
    info!("file watcher started on {:?}", root);

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let mut hash_store: Box<dyn HashStore> = match target.hash_storage {
        HashStorageMode::File => Box::new(FileHashStore::new(target.project_root, fs.clone())),
        HashStorageMode::Memory => Box::new(MemoryHashStore::new()),
    };
    if filter.use_hash() {
        seed_hashes(fs.as_ref(), &root, &filter, hash_store.as_mut());
    }

    let filter = Arc::new(filter);
    let hash_store = Arc::new(Mutex::new(hash_store));

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            debug!(?event, "received notify event");
            if !is_content_event(&event.kind) {
                continue;
            }
            for path in event.paths {
                let alive = process_source_event(
                    fs.clone(),
                    &root,
                    path,
                    &filter,
                    &runtime_tx,
                    Arc::clone(&hash_store),
                )
                .await;
                if !alive {
                    debug!("runtime gone; watcher loop stopping");
                    return;
                }
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle { _inner: watcher })
}

/// Creation, content changes, renames and removals; not metadata or access.
fn is_content_event(kind: &EventKind) -> bool {
    match kind {
        EventKind::Create(_) | EventKind::Remove(_) => true,
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) => true,
        _ => false,
    }
}

/// Hash every watched file once, so that only real edits count as changes.
fn seed_hashes(fs: &dyn FileSystem, root: &Path, filter: &SourceFilter, store: &mut dyn HashStore) {
    let files = match collect_matching_files(fs, root, filter) {
        Ok(files) => files,
        Err(err) => {
            warn!(error = %err, "failed to list watched sources; hashes not seeded");
            return;
        }
    };
    let mut seeded = 0usize;
    for path in files {
        let Some(rel) = relative_str(root, &path) else {
            continue;
        };
        match compute_file_hash(fs, &path).and_then(|hash| store.save(&rel, &hash)) {
            Ok(()) => seeded += 1,
            Err(err) => warn!(source = %rel, error = %err, "failed to seed source hash"),
        }
    }
    debug!(seeded, "seeded source hashes");
}
