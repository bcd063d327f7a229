//! Memory model for the simulator
//!
//! This module provides the two pieces of simulated state:
//! - [`heap`]: the flat address space, its allocated blocks and the allocator
//!   (first-fit placement, deallocation, compaction)
//! - [`graph`]: the directed relation graph between process ids
//!
//! # Address Space
//!
//! The heap is a range `[0, capacity)` of abstract units. Only allocated blocks are
//! stored; free space is always derived as the gaps between them, so the blocks and
//! the gaps tile the whole address space by construction:
//!
//! ```text
//! |  pid 1  |  free  |    pid 2    |        free         |
//! 0        30       50            80                   100
//! ```
//!
//! Both structures are plain values with no I/O. Loading and saving them is the
//! job of [`crate::store`].

pub mod graph;
pub mod heap;

/// Process identifier (always positive)
pub type Pid = u32;

/// Offset into the simulated address space
pub type Address = u64;

pub use graph::{Relation, RelationGraph, RelationPolicy};
pub use heap::{
    Block, BlockStatus, FreeRange, HeapState, HeapStats, PidPolicy, PlacementPolicy, Segment,
};
