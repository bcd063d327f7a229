//! File-backed state store
//!
//! Layout of the state directory:
//!
//! ```text
//! <state_dir>/
//!   heap_state.json    capacity, blocks, next pid
//!   graph_state.json   relation edges
//!   memsim.lock        advisory lock, held for one command
//! ```
//!
//! Each file is a versioned JSON envelope. Saves go through a temporary sibling that
//! is renamed over the old file, so a crash mid-write never leaves a truncated state.

use super::StateStore;
use crate::config::SimConfig;
use crate::errors::{SimError, SimResult, StorageError};
use crate::memory::{HeapState, RelationGraph};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub const HEAP_FILE: &str = "heap_state.json";
pub const GRAPH_FILE: &str = "graph_state.json";
pub const LOCK_FILE: &str = "memsim.lock";

/// Bumped whenever the persisted layout changes
const FORMAT_VERSION: u32 = 1;

const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    version: u32,
    state: T,
}

/// Exclusive lock on the state directory, released on drop
#[derive(Debug)]
pub struct StateLock {
    file: File,
    path: PathBuf,
}

impl Drop for StateLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!("failed to release {}: {}", self.path.display(), e);
        }
    }
}

/// State store keeping one JSON file per state in a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    lock_timeout: Duration,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>, lock_timeout: Duration) -> Self {
        FileStore {
            dir: dir.into(),
            lock_timeout,
        }
    }

    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(config.state_dir.clone(), config.lock_timeout)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn heap_path(&self) -> PathBuf {
        self.dir.join(HEAP_FILE)
    }

    pub fn graph_path(&self) -> PathBuf {
        self.dir.join(GRAPH_FILE)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.dir.join(LOCK_FILE)
    }

    fn ensure_dir(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).map_err(|e| StorageError::io(&self.dir, e))
    }
}

impl StateStore for FileStore {
    type Lock = StateLock;

    fn lock(&self) -> SimResult<StateLock> {
        self.ensure_dir()?;
        let path = self.lock_path();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| StorageError::io(&path, e))?;

        let started = Instant::now();
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => {
                    debug!("acquired {}", path.display());
                    return Ok(StateLock { file, path });
                }
                Err(e) if is_contended(&e) => {}
                Err(e) => return Err(StorageError::io(&path, e).into()),
            }

            let waited = started.elapsed();
            if waited >= self.lock_timeout {
                return Err(SimError::LockTimeout {
                    path,
                    waited_ms: waited.as_millis() as u64,
                });
            }
            thread::sleep(LOCK_POLL_INTERVAL.min(self.lock_timeout - waited));
        }
    }

    fn load_heap(&self) -> SimResult<Option<HeapState>> {
        let path = self.heap_path();
        let heap: Option<HeapState> = read_state(&path)?;
        if let Some(heap) = &heap {
            heap.validate()
                .map_err(|reason| StorageError::corrupt(&path, reason))?;
        }
        Ok(heap)
    }

    fn load_graph(&self) -> SimResult<Option<RelationGraph>> {
        let path = self.graph_path();
        let graph: Option<RelationGraph> = read_state(&path)?;
        if let Some(graph) = &graph {
            graph
                .validate()
                .map_err(|reason| StorageError::corrupt(&path, reason))?;
        }
        Ok(graph)
    }

    /// Stage both files, then rename heap and graph into place in that order.
    ///
    /// Staged temporaries are removed on every error path. The renames are two
    /// steps: if the graph rename fails after the heap rename succeeded, the new
    /// heap is already persisted beside the previous graph.
    fn save(&mut self, heap: &HeapState, graph: &RelationGraph) -> SimResult<()> {
        self.ensure_dir()?;
        let heap_path = self.heap_path();
        let graph_path = self.graph_path();

        // Both temporaries are complete before either rename
        let heap_tmp = stage(&heap_path, heap)?;
        let graph_tmp = match stage(&graph_path, graph) {
            Ok(tmp) => tmp,
            Err(e) => {
                discard(&[heap_tmp.as_path()]);
                return Err(e.into());
            }
        };
        if let Err(e) = commit(&heap_tmp, &heap_path) {
            discard(&[heap_tmp.as_path(), graph_tmp.as_path()]);
            return Err(e.into());
        }
        if let Err(e) = commit(&graph_tmp, &graph_path) {
            warn!("heap saved but graph was not: {}", graph_path.display());
            discard(&[graph_tmp.as_path()]);
            return Err(e.into());
        }

        debug!(
            blocks = heap.blocks().len(),
            edges = graph.len(),
            "saved state to {}",
            self.dir.display()
        );
        Ok(())
    }
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

fn read_state<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StorageError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StorageError::io(path, e)),
    };

    let envelope: Envelope<T> =
        serde_json::from_str(&text).map_err(|e| StorageError::corrupt(path, e.to_string()))?;

    if envelope.version != FORMAT_VERSION {
        return Err(StorageError::corrupt(
            path,
            format!(
                "unsupported format version {} (expected {})",
                envelope.version, FORMAT_VERSION
            ),
        ));
    }

    Ok(Some(envelope.state))
}

/// Write `state` next to `path` and return the temporary file
fn stage<T: Serialize>(path: &Path, state: &T) -> Result<PathBuf, StorageError> {
    let envelope = Envelope {
        version: FORMAT_VERSION,
        state,
    };
    let json = serde_json::to_string_pretty(&envelope)
        .map_err(|e| StorageError::io(path, io::Error::new(io::ErrorKind::InvalidData, e)))?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(|e| StorageError::io(&tmp, e))?;
    Ok(tmp)
}

fn commit(tmp: &Path, path: &Path) -> Result<(), StorageError> {
    fs::rename(tmp, path).map_err(|e| StorageError::io(path, e))
}

/// Best-effort removal of staged files after a failed save
fn discard(tmps: &[&Path]) {
    for tmp in tmps {
        if let Err(e) = fs::remove_file(tmp) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!("could not remove {}: {}", tmp.display(), e);
            }
        }
    }
}
