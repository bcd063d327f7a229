//! Process relation graph
//!
//! A directed edge `from -> to` records that process `from` depends on process `to`.
//! Edges form a set: adding an edge twice leaves the graph unchanged. The graph is
//! kept apart from the heap and persisted independently; it is only consulted about
//! the heap when [`RelationPolicy::Strict`] checks that both endpoints are allocated.
//!
//! Deallocating a process does not remove its edges.

use super::heap::HeapState;
use super::Pid;
use crate::errors::{SimError, SimResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Directed edge between two processes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Relation {
    pub from: Pid,
    pub to: Pid,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// Whether relation endpoints must be allocated when the edge is added
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelationPolicy {
    #[default]
    Strict,
    Permissive,
}

impl RelationPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationPolicy::Strict => "strict",
            RelationPolicy::Permissive => "permissive",
        }
    }
}

impl FromStr for RelationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(RelationPolicy::Strict),
            "permissive" | "lenient" => Ok(RelationPolicy::Permissive),
            other => Err(format!("unknown relation policy '{}'", other)),
        }
    }
}

/// Edge set over pids, ordered by `(from, to)`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationGraph {
    edges: BTreeSet<Relation>,
}

impl RelationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the edge `from -> to`. Returns `false` if it was already present.
    pub fn add(
        &mut self,
        from: Pid,
        to: Pid,
        policy: RelationPolicy,
        heap: &HeapState,
    ) -> SimResult<bool> {
        if from == 0 || to == 0 {
            return Err(SimError::invalid_relation(
                from,
                to,
                "pids must be positive integers",
            ));
        }
        if from == to {
            return Err(SimError::invalid_relation(
                from,
                to,
                "a process cannot relate to itself",
            ));
        }
        if policy == RelationPolicy::Strict {
            for pid in [from, to] {
                if !heap.contains_pid(pid) {
                    return Err(SimError::invalid_relation(
                        from,
                        to,
                        &format!("pid {} is not allocated", pid),
                    ));
                }
            }
        }

        Ok(self.edges.insert(Relation { from, to }))
    }

    pub fn contains(&self, from: Pid, to: Pid) -> bool {
        self.edges.contains(&Relation { from, to })
    }

    /// All edges sorted by `(from, to)`
    pub fn edges(&self) -> impl Iterator<Item = &Relation> {
        self.edges.iter()
    }

    /// Targets of the edges leaving `from`, ascending
    pub fn successors(&self, from: Pid) -> impl Iterator<Item = Pid> + '_ {
        self.edges
            .range(Relation { from, to: 0 }..=Relation { from, to: Pid::MAX })
            .map(|r| r.to)
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Check that every stored edge could have been created by [`add`](Self::add)
    pub fn validate(&self) -> Result<(), String> {
        for edge in &self.edges {
            if edge.from == 0 || edge.to == 0 {
                return Err(format!("edge {} uses pid 0", edge));
            }
            if edge.from == edge.to {
                return Err(format!("self-relation {}", edge));
            }
        }
        Ok(())
    }
}
