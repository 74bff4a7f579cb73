// src/watch/hash.rs

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::{debug, info};

use crate::fs::FileSystem;

/// Relative path (from the project root) to the hashes file.
pub const HASH_FILE_PATH: &str = ".incbuild/hashes";

fn hash_file_path(root: &Path) -> PathBuf {
    root.join(HASH_FILE_PATH)
}

/// blake3 of a file's contents, as hex.
pub fn compute_file_hash(fs: &dyn FileSystem, path: &Path) -> Result<String> {
    let mut hasher = Hasher::new();
    let mut reader = fs
        .open_read(path)
        .with_context(|| format!("opening file for hashing: {:?}", path))?;
    let mut buf = [0u8; 8192];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Last seen content hash per source file.
///
/// Keys are source paths relative to the watch root, with forward slashes.
pub trait HashStore: Send + Sync {
    fn load(&self, source: &str) -> Result<Option<String>>;
    fn save(&mut self, source: &str, hash: &str) -> Result<()>;
    fn forget(&mut self, source: &str) -> Result<()>;
}

/// Record `hash` for `source` and report whether it differs from the
/// previous one. An unknown source counts as changed.
pub fn record_if_changed(store: &mut dyn HashStore, source: &str, hash: &str) -> Result<bool> {
    if store.load(source)?.as_deref() == Some(hash) {
        return Ok(false);
    }
    store.save(source, hash)?;
    Ok(true)
}

/// Stores hashes in `<root>/.incbuild/hashes`, one `path hash` per line.
pub struct FileHashStore {
    root: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl FileHashStore {
    pub fn new(root: PathBuf, fs: Arc<dyn FileSystem>) -> Self {
        Self { root, fs }
    }

    fn load_all(&self) -> Result<HashMap<String, String>> {
        let path = hash_file_path(&self.root);
        if !self.fs.exists(&path) {
            return Ok(HashMap::new());
        }
        let text = self
            .fs
            .read_to_string(&path)
            .with_context(|| format!("reading hash file at {:?}", path))?;

        let mut map = HashMap::new();
        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            // Paths may contain spaces; the hash never does.
            if let Some((source, hash)) = trimmed.rsplit_once(char::is_whitespace) {
                map.insert(source.trim().to_string(), hash.to_string());
            }
        }
        Ok(map)
    }

    fn save_all(&self, map: &HashMap<String, String>) -> Result<()> {
        let path = hash_file_path(&self.root);
        let mut entries: Vec<_> = map.iter().collect();
        entries.sort();
        let mut out = String::new();
        for (source, hash) in entries {
            out.push_str(source);
            out.push(' ');
            out.push_str(hash);
            out.push('\n');
        }
        self.fs
            .write(&path, out.as_bytes())
            .with_context(|| format!("writing hash file at {:?}", path))
    }
}

impl HashStore for FileHashStore {
    fn load(&self, source: &str) -> Result<Option<String>> {
        Ok(self.load_all()?.get(source).cloned())
    }

    fn save(&mut self, source: &str, hash: &str) -> Result<()> {
        let mut map = self.load_all()?;
        map.insert(source.to_string(), hash.to_string());
        self.save_all(&map)?;
        debug!(source, hash, "stored source hash (file)");
        Ok(())
    }

    fn forget(&mut self, source: &str) -> Result<()> {
        let mut map = self.load_all()?;
        if map.remove(source).is_some() {
            self.save_all(&map)?;
            info!(source, "dropped hash of removed source (file)");
        }
        Ok(())
    }
}

/// Stores hashes in memory only.
#[derive(Debug, Default)]
pub struct MemoryHashStore {
    map: HashMap<String, String>,
}

impl MemoryHashStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HashStore for MemoryHashStore {
    fn load(&self, source: &str) -> Result<Option<String>> {
        Ok(self.map.get(source).cloned())
    }

    fn save(&mut self, source: &str, hash: &str) -> Result<()> {
        self.map.insert(source.to_string(), hash.to_string());
        debug!(source, hash, "stored source hash (memory)");
        Ok(())
    }

    fn forget(&mut self, source: &str) -> Result<()> {
        self.map.remove(source);
        Ok(())
    }
}
