//! Command execution against a state store

use super::command::Command;
use super::report::Report;
use crate::config::SimConfig;
use crate::errors::SimResult;
use crate::memory::{HeapState, RelationGraph};
use crate::store::StateStore;
use tracing::{debug, info};

/// Runs commands against the persisted heap and graph
pub struct Dispatcher<S: StateStore> {
    store: S,
    config: SimConfig,
}

impl<S: StateStore> Dispatcher<S> {
    pub fn new(store: S, config: SimConfig) -> Self {
        Dispatcher { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Execute one command.
    ///
    /// The store lock is held from load to save. State is only saved when the
    /// command succeeds and mutates, so a failed command leaves the persisted
    /// state exactly as it was.
    pub fn execute(&mut self, command: Command) -> SimResult<Report> {
        let _lock = self.store.lock()?;
        let (mut heap, mut graph) = self.load()?;

        debug!(%command, "executing");
        let report = self.apply(command, &mut heap, &mut graph)?;

        if command.mutates() {
            self.store.save(&heap, &graph)?;
            info!(%command, blocks = heap.blocks().len(), edges = graph.len(), "state saved");
        }

        Ok(report)
    }

    /// Read the current state under the lock, without running a command
    pub fn snapshot(&self) -> SimResult<(HeapState, RelationGraph)> {
        let _lock = self.store.lock()?;
        self.load()
    }

    fn load(&self) -> SimResult<(HeapState, RelationGraph)> {
        let heap = match self.store.load_heap()? {
            Some(heap) => heap,
            None => {
                debug!(capacity = self.config.heap_capacity, "no heap state, starting empty");
                HeapState::new(self.config.heap_capacity)
            }
        };
        let graph = self.store.load_graph()?.unwrap_or_default();
        Ok((heap, graph))
    }

    fn apply(
        &self,
        command: Command,
        heap: &mut HeapState,
        graph: &mut RelationGraph,
    ) -> SimResult<Report> {
        let report = match command {
            Command::Allocate { size } => {
                let block =
                    heap.allocate_with(size, self.config.placement, self.config.pid_policy)?;
                Report::Allocated {
                    block,
                    blocks: heap.blocks_by_pid(),
                }
            }
            Command::Deallocate { pid } => {
                let block = heap.deallocate(pid)?;
                Report::Deallocated {
                    block,
                    blocks: heap.blocks_by_pid(),
                }
            }
            Command::Compact => {
                let moved = heap.compact();
                Report::Compacted {
                    moved,
                    blocks: heap.blocks_by_pid(),
                }
            }
            Command::AddRelation { from, to } => {
                let inserted = graph.add(from, to, self.config.relation_policy, heap)?;
                Report::RelationAdded { from, to, inserted }
            }
            Command::ShowGraph => Report::Graph(graph.edges().copied().collect()),
            Command::Display => Report::Table(heap.blocks_by_pid()),
            Command::Stats => Report::Stats(heap.stats()),
            Command::Logout => {
                *heap = HeapState::new(self.config.heap_capacity);
                *graph = RelationGraph::new();
                Report::LoggedOut
            }
        };

        Ok(report)
    }
}
