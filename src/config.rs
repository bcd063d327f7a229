//! Simulator configuration
//!
//! Configuration can be set programmatically or loaded from environment variables.
//! Command-line flags in the binary override both.
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `MEMSIM_STATE_DIR` | Directory holding the state files and the lock file | `.memsim` |
//! | `MEMSIM_HEAP_CAPACITY` | Capacity of a newly created heap | 1024 |
//! | `MEMSIM_RELATION_POLICY` | `strict` or `permissive` | strict |
//! | `MEMSIM_PID_POLICY` | `reuse` or `monotonic` | reuse |
//! | `MEMSIM_PLACEMENT` | `first-fit` or `best-fit` | first-fit |
//! | `MEMSIM_LOCK_TIMEOUT_MS` | How long to wait for the state lock | 2000 |
//!
//! A heap that already exists on disk keeps its own capacity; the configured
//! capacity is only used when a heap is created or reset by `logout`.

use crate::memory::{PidPolicy, PlacementPolicy, RelationPolicy};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Capacity of a fresh heap, in abstract units
pub const DEFAULT_HEAP_CAPACITY: u64 = 1024;

pub const DEFAULT_STATE_DIR: &str = ".memsim";

pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(2000);

/// Settings shared by the dispatcher and the stores
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    pub state_dir: PathBuf,
    pub heap_capacity: u64,
    pub relation_policy: RelationPolicy,
    pub pid_policy: PidPolicy,
    pub placement: PlacementPolicy,
    pub lock_timeout: Duration,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            heap_capacity: DEFAULT_HEAP_CAPACITY,
            relation_policy: RelationPolicy::default(),
            pid_policy: PidPolicy::default(),
            placement: PlacementPolicy::default(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }
}

impl SimConfig {
    /// Defaults overridden by `MEMSIM_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable name.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = SimConfig::default();

        if let Some(dir) = lookup("MEMSIM_STATE_DIR").filter(|s| !s.trim().is_empty()) {
            config.state_dir = PathBuf::from(dir);
        }
        if let Some(capacity) = parse_var::<u64, _>(&lookup, "MEMSIM_HEAP_CAPACITY") {
            if capacity > 0 {
                config.heap_capacity = capacity;
            } else {
                warn!("ignoring MEMSIM_HEAP_CAPACITY=0");
            }
        }
        if let Some(policy) = parse_var(&lookup, "MEMSIM_RELATION_POLICY") {
            config.relation_policy = policy;
        }
        if let Some(policy) = parse_var(&lookup, "MEMSIM_PID_POLICY") {
            config.pid_policy = policy;
        }
        if let Some(placement) = parse_var(&lookup, "MEMSIM_PLACEMENT") {
            config.placement = placement;
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "MEMSIM_LOCK_TIMEOUT_MS") {
            config.lock_timeout = Duration::from_millis(ms);
        }

        config
    }

    pub fn with_state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.state_dir = dir.into();
        self
    }

    pub fn with_heap_capacity(mut self, capacity: u64) -> Self {
        self.heap_capacity = capacity;
        self
    }

    pub fn with_relation_policy(mut self, policy: RelationPolicy) -> Self {
        self.relation_policy = policy;
        self
    }

    pub fn with_pid_policy(mut self, policy: PidPolicy) -> Self {
        self.pid_policy = policy;
        self
    }

    pub fn with_placement(mut self, placement: PlacementPolicy) -> Self {
        self.placement = placement;
        self
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("ignoring {}={:?}: {}", name, raw, e);
            None
        }
    }
}
