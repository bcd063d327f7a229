//! Persistence for the simulator state
//!
//! The dispatcher never touches files directly. It talks to a [`StateStore`], which
//! hands out an exclusive lock and loads/saves the heap and graph as whole records:
//!
//! - [`FileStore`]: two JSON files plus a lock file in a state directory
//! - [`MemoryStore`]: keeps the states in memory, for tests and embedding
//!
//! `load_*` returns `Ok(None)` when nothing has been persisted yet; the caller
//! decides what the initial state looks like.

mod file;

pub use file::{FileStore, StateLock, GRAPH_FILE, HEAP_FILE, LOCK_FILE};

use crate::errors::SimResult;
use crate::memory::{HeapState, RelationGraph};

/// Load/save boundary for the persisted heap and graph
pub trait StateStore {
    /// Guard held for the whole load → mutate → save cycle
    type Lock;

    fn lock(&self) -> SimResult<Self::Lock>;

    fn load_heap(&self) -> SimResult<Option<HeapState>>;

    fn load_graph(&self) -> SimResult<Option<RelationGraph>>;

    /// Persist both states. Both records are fully written before either replaces
    /// its predecessor; replacing them is not a single atomic step.
    fn save(&mut self, heap: &HeapState, graph: &RelationGraph) -> SimResult<()>;
}

/// In-memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    heap: Option<HeapState>,
    graph: Option<RelationGraph>,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an already populated state
    pub fn with_state(heap: HeapState, graph: RelationGraph) -> Self {
        MemoryStore {
            heap: Some(heap),
            graph: Some(graph),
            saves: 0,
        }
    }

    pub fn heap(&self) -> Option<&HeapState> {
        self.heap.as_ref()
    }

    pub fn graph(&self) -> Option<&RelationGraph> {
        self.graph.as_ref()
    }

    /// Number of successful saves so far
    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl StateStore for MemoryStore {
    type Lock = ();

    fn lock(&self) -> SimResult<()> {
        Ok(())
    }

    fn load_heap(&self) -> SimResult<Option<HeapState>> {
        Ok(self.heap.clone())
    }

    fn load_graph(&self) -> SimResult<Option<RelationGraph>> {
        Ok(self.graph.clone())
    }

    fn save(&mut self, heap: &HeapState, graph: &RelationGraph) -> SimResult<()> {
        self.heap = Some(heap.clone());
        self.graph = Some(graph.clone());
        self.saves += 1;
        Ok(())
    }
}
