use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use super::loader::{self, LoadError};
use super::model::HealthTable;

// ---------------------------------------------------------------------------
// DatasetCache – one canonical table per session
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct CacheEntry {
    path: PathBuf,
    modified: Option<SystemTime>,
    table: Arc<HealthTable>,
}

/// Holds the canonical table for the current session, keyed by path and
/// modification time.  Owned by the session, never global.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entry: Option<CacheEntry>,
    loads: usize,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached table for `path`, loading it on first use or when
    /// the file changed on disk.
    pub fn get_or_load(&mut self, path: &Path) -> Result<Arc<HealthTable>, LoadError> {
        let modified = modified_time(path)?;
        if let Some(entry) = &self.entry {
            if entry.path == path && entry.modified == modified {
                log::debug!("Cache hit for {}", path.display());
                return Ok(Arc::clone(&entry.table));
            }
        }
        self.load_into(path, modified)
    }

    /// Drop any cached table and read `path` again.
    pub fn reload(&mut self, path: &Path) -> Result<Arc<HealthTable>, LoadError> {
        self.invalidate();
        let modified = modified_time(path)?;
        log::info!("Reloading {}", path.display());
        self.load_into(path, modified)
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    /// Whether `path` is currently cached (regardless of freshness).
    pub fn is_cached(&self, path: &Path) -> bool {
        self.entry.as_ref().is_some_and(|e| e.path == path)
    }

    /// How many times a file was actually read.
    pub fn loads(&self) -> usize {
        self.loads
    }

    fn load_into(
        &mut self,
        path: &Path,
        modified: Option<SystemTime>,
    ) -> Result<Arc<HealthTable>, LoadError> {
        let table = Arc::new(loader::load(path)?);
        self.loads += 1;
        self.entry = Some(CacheEntry {
            path: path.to_path_buf(),
            modified,
            table: Arc::clone(&table),
        });
        Ok(table)
    }
}

/// Modification time of `path`; `None` on platforms without mtime support.
fn modified_time(path: &Path) -> Result<Option<SystemTime>, LoadError> {
    let meta = std::fs::metadata(path).map_err(|e| LoadError::io(path, e))?;
    Ok(meta.modified().ok())
}
