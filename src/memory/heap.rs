//! Heap store and allocator
//!
//! This module provides the simulated heap:
//! - [`HeapState`]: capacity, allocated blocks ordered by start address, pid counter
//! - [`Block`]: one allocated range `[start, end)` owned by a process
//! - [`FreeRange`]: a gap between blocks, always derived, never stored
//!
//! # Allocation Policy
//!
//! [`HeapState::allocate`] is first-fit: free ranges are scanned in ascending address
//! order and the first one large enough is split. [`HeapState::allocate_with`] takes a
//! [`PlacementPolicy`]; [`PlacementPolicy::BestFit`] picks the smallest range that
//! fits instead, preferring the lower address on ties. [`HeapState::compact`] slides every
//! block down to the low end of the address space in address order, leaving a single
//! free range at the top.
//!
//! # Pid Assignment
//!
//! By default a new block gets the smallest positive pid not currently in use, so a
//! pid freed by [`HeapState::deallocate`] is handed out again. [`PidPolicy::Monotonic`]
//! instead draws from the persisted `next_pid` counter and never reuses a pid.

use super::{Address, Pid};
use crate::errors::{SimError, SimResult};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Status of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockStatus {
    Allocated,
    Free, // Only on blocks handed back by deallocate
}

impl BlockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockStatus::Allocated => "ALLOCATED",
            BlockStatus::Free => "FREE",
        }
    }
}

impl fmt::Display for BlockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A block of simulated memory owned by one process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pid: Pid,
    start: Address,
    end: Address,
    size: u64,
    status: BlockStatus,
}

impl Block {
    fn new(pid: Pid, start: Address, size: u64) -> Self {
        Block {
            pid,
            start,
            end: start + size,
            size,
            status: BlockStatus::Allocated,
        }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn start(&self) -> Address {
        self.start
    }

    pub fn end(&self) -> Address {
        self.end
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn status(&self) -> BlockStatus {
        self.status
    }

    /// Check if two blocks share at least one address
    pub fn overlaps(&self, other: &Block) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Move the block so it begins at `start`, keeping its size
    fn relocate(&mut self, start: Address) {
        self.start = start;
        self.end = start + self.size;
    }
}

/// A gap of free space `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeRange {
    pub start: Address,
    pub end: Address,
}

impl FreeRange {
    pub fn size(&self) -> u64 {
        self.end - self.start
    }
}

/// One piece of the address space: either a block or the gap after it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Used(Block),
    Free(FreeRange),
}

impl Segment {
    pub fn start(&self) -> Address {
        match self {
            Segment::Used(block) => block.start,
            Segment::Free(range) => range.start,
        }
    }

    pub fn end(&self) -> Address {
        match self {
            Segment::Used(block) => block.end,
            Segment::Free(range) => range.end,
        }
    }

    pub fn size(&self) -> u64 {
        self.end() - self.start()
    }
}

/// How pids are chosen for new blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PidPolicy {
    /// Smallest positive pid not held by an allocated block
    #[default]
    ReuseLowest,
    /// Next value of the persisted counter; freed pids are never handed out again
    Monotonic,
}

impl PidPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PidPolicy::ReuseLowest => "reuse",
            PidPolicy::Monotonic => "monotonic",
        }
    }
}

impl FromStr for PidPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reuse" | "lowest" | "reuse-lowest" => Ok(PidPolicy::ReuseLowest),
            "monotonic" | "counter" => Ok(PidPolicy::Monotonic),
            other => Err(format!("unknown pid policy '{}'", other)),
        }
    }
}

/// Which free range a new block is carved from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlacementPolicy {
    /// Lowest-addressed range that fits
    #[default]
    FirstFit,
    /// Smallest range that fits; ties go to the lowest address
    BestFit,
}

impl PlacementPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlacementPolicy::FirstFit => "first-fit",
            PlacementPolicy::BestFit => "best-fit",
        }
    }

    /// Pick a range of at least `size` units from `ranges` (ascending by start)
    pub fn choose(&self, ranges: &[FreeRange], size: u64) -> Option<FreeRange> {
        let mut fits = ranges.iter().filter(|r| r.size() >= size);
        match self {
            PlacementPolicy::FirstFit => fits.next().copied(),
            // min_by_key keeps the first minimum, which is the lowest start
            PlacementPolicy::BestFit => fits.min_by_key(|r| r.size()).copied(),
        }
    }
}

impl FromStr for PlacementPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "first-fit" | "first" | "firstfit" => Ok(PlacementPolicy::FirstFit),
            "best-fit" | "best" | "bestfit" => Ok(PlacementPolicy::BestFit),
            other => Err(format!("unknown placement policy '{}'", other)),
        }
    }
}

/// Usage summary of a heap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapStats {
    pub capacity: u64,
    pub used: u64,
    pub free: u64,
    pub allocated_blocks: usize,
    pub free_ranges: usize,
    pub largest_free: u64,
}

impl HeapStats {
    /// Share of the free space lying outside the largest free range, in percent
    pub fn fragmentation(&self) -> f64 {
        if self.free == 0 {
            return 0.0;
        }
        (1.0 - self.largest_free as f64 / self.free as f64) * 100.0
    }
}

/// The simulated heap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeapState {
    capacity: u64,
    blocks: Vec<Block>, // Sorted by start, never overlapping
    next_pid: Pid,
}

impl HeapState {
    /// Create an empty heap spanning `[0, capacity)`
    pub fn new(capacity: u64) -> Self {
        HeapState {
            capacity,
            blocks: Vec::new(),
            next_pid: 1,
        }
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Allocated blocks in address order
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Allocated blocks ordered by pid
    pub fn blocks_by_pid(&self) -> Vec<Block> {
        let mut blocks = self.blocks.clone();
        blocks.sort_by_key(|b| b.pid);
        blocks
    }

    pub fn next_pid(&self) -> Pid {
        self.next_pid
    }

    pub fn get(&self, pid: Pid) -> Option<&Block> {
        self.blocks.iter().find(|b| b.pid == pid)
    }

    pub fn contains_pid(&self, pid: Pid) -> bool {
        self.get(pid).is_some()
    }

    pub fn used(&self) -> u64 {
        self.blocks.iter().map(|b| b.size).sum()
    }

    pub fn free(&self) -> u64 {
        self.capacity - self.used()
    }

    /// Gaps between and around the allocated blocks, ascending by start
    pub fn find_free_ranges(&self) -> Vec<FreeRange> {
        self.segments()
            .into_iter()
            .filter_map(|segment| match segment {
                Segment::Free(range) => Some(range),
                Segment::Used(_) => None,
            })
            .collect()
    }

    /// The whole address space as alternating blocks and gaps
    pub fn segments(&self) -> Vec<Segment> {
        let mut segments = Vec::with_capacity(self.blocks.len() * 2 + 1);
        let mut cursor = 0;

        for block in &self.blocks {
            if block.start > cursor {
                segments.push(Segment::Free(FreeRange {
                    start: cursor,
                    end: block.start,
                }));
            }
            segments.push(Segment::Used(block.clone()));
            cursor = block.end;
        }

        if cursor < self.capacity {
            segments.push(Segment::Free(FreeRange {
                start: cursor,
                end: self.capacity,
            }));
        }

        segments
    }

    pub fn stats(&self) -> HeapStats {
        let ranges = self.find_free_ranges();
        HeapStats {
            capacity: self.capacity,
            used: self.used(),
            free: self.free(),
            allocated_blocks: self.blocks.len(),
            free_ranges: ranges.len(),
            largest_free: ranges.iter().map(FreeRange::size).max().unwrap_or(0),
        }
    }

    /// Allocate `size` units at the first free range large enough (first-fit)
    pub fn allocate(&mut self, size: u64, policy: PidPolicy) -> SimResult<Block> {
        self.allocate_with(size, PlacementPolicy::FirstFit, policy)
    }

    /// Allocate `size` units in the free range chosen by `placement`
    pub fn allocate_with(
        &mut self,
        size: u64,
        placement: PlacementPolicy,
        policy: PidPolicy,
    ) -> SimResult<Block> {
        if size == 0 {
            return Err(SimError::InvalidSize(size.to_string()));
        }

        let ranges = self.find_free_ranges();
        let range = match placement.choose(&ranges, size) {
            Some(range) => range,
            None => {
                return Err(SimError::OutOfMemory {
                    requested: size,
                    largest_free: ranges.iter().map(FreeRange::size).max().unwrap_or(0),
                    free: self.free(),
                });
            }
        };

        let pid = self.assign_pid(policy);
        let block = Block::new(pid, range.start, size);
        debug!(
            pid,
            start = block.start,
            end = block.end,
            hole_start = range.start,
            hole_end = range.end,
            placement = placement.as_str(),
            "placed block"
        );

        let index = self.blocks.partition_point(|b| b.start < block.start);
        self.blocks.insert(index, block.clone());
        self.next_pid = self.next_pid.max(pid.saturating_add(1));

        Ok(block)
    }

    fn assign_pid(&self, policy: PidPolicy) -> Pid {
        match policy {
            PidPolicy::Monotonic => self.next_pid,
            PidPolicy::ReuseLowest => {
                let used: FxHashSet<Pid> = self.blocks.iter().map(|b| b.pid).collect();
                // At most blocks.len() pids are taken, so a gap exists within len + 1
                (1..=used.len() as Pid + 1)
                    .find(|pid| !used.contains(pid))
                    .unwrap_or(self.next_pid)
            }
        }
    }

    /// Free the block owned by `pid`; its range rejoins the neighbouring free space
    pub fn deallocate(&mut self, pid: Pid) -> SimResult<Block> {
        let index = self
            .blocks
            .iter()
            .position(|b| b.pid == pid)
            .ok_or(SimError::NotFound(pid))?;

        let mut block = self.blocks.remove(index);
        block.status = BlockStatus::Free;
        debug!(pid, start = block.start, end = block.end, "block released");
        Ok(block)
    }

    /// Slide all blocks to the low end, keeping their order. Returns how many moved.
    pub fn compact(&mut self) -> usize {
        let mut cursor = 0;
        let mut moved = 0;

        for block in &mut self.blocks {
            if block.start != cursor {
                debug!(pid = block.pid, from = block.start, to = cursor, "relocating block");
                block.relocate(cursor);
                moved += 1;
            }
            cursor = block.end;
        }

        moved
    }

    /// Check the structural invariants of a heap read back from storage
    pub fn validate(&self) -> Result<(), String> {
        if self.capacity == 0 {
            return Err("capacity must be positive".to_string());
        }

        let mut seen = FxHashSet::default();
        let mut prev: Option<&Block> = None;
        for block in &self.blocks {
            if block.pid == 0 {
                return Err("block with pid 0".to_string());
            }
            if block.start >= block.end {
                return Err(format!(
                    "pid {} has an empty or inverted range [{}, {})",
                    block.pid, block.start, block.end
                ));
            }
            if block.end > self.capacity {
                return Err(format!(
                    "pid {} ends at {}, past capacity {}",
                    block.pid, block.end, self.capacity
                ));
            }
            if block.size != block.end - block.start {
                return Err(format!(
                    "pid {} has size {} but spans {} units",
                    block.pid,
                    block.size,
                    block.end - block.start
                ));
            }
            if block.status != BlockStatus::Allocated {
                return Err(format!("pid {} is stored with status {}", block.pid, block.status));
            }
            if !seen.insert(block.pid) {
                return Err(format!("pid {} appears more than once", block.pid));
            }
            if let Some(prev) = prev {
                if prev.end > block.start {
                    return Err(format!(
                        "pids {} and {} overlap or are out of address order",
                        prev.pid, block.pid
                    ));
                }
            }
            prev = Some(block);
        }

        let highest = self.blocks.iter().map(|b| b.pid).max().unwrap_or(0);
        if self.next_pid <= highest {
            return Err(format!(
                "next pid {} is not above the highest pid {}",
                self.next_pid, highest
            ));
        }

        Ok(())
    }
}
