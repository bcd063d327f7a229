//! # Introduction
//!
//! memsim simulates a contiguous heap shared by numbered processes, together with
//! a directed graph of relations between those processes. Every invocation runs a
//! single command against state persisted on disk, so a sequence of separate
//! invocations behaves like one session.
//!
//! ## Command pipeline
//!
//! ```text
//! argv → Command → Dispatcher (lock → load → apply → save) → Report → stdout
//! ```
//!
//! 1. [`dispatch`]: parses and validates a command, runs it, and renders the
//!    resulting [`dispatch::Report`].
//! 2. [`memory`]: the domain model: [`memory::HeapState`] with first-fit
//!    allocation and compaction, and the [`memory::RelationGraph`].
//! 3. [`store`]: the [`store::StateStore`] seam, with a JSON [`store::FileStore`]
//!    guarded by an exclusive lock file and an in-memory store for tests.
//! 4. [`config`]: environment and builder configuration.
//! 5. [`ui`]: ratatui-based read-only viewer; not part of the stable library API.
//!
//! ## Example
//!
//! ```
//! use memsim::config::SimConfig;
//! use memsim::dispatch::{Command, Dispatcher};
//! use memsim::store::MemoryStore;
//!
//! let mut dispatcher = Dispatcher::new(MemoryStore::new(), SimConfig::default());
//! let report = dispatcher.execute(Command::Allocate { size: 100 }).unwrap();
//! assert!(report.to_string().starts_with("pid=1 start=0 end=100\n"));
//! ```

pub mod config;
pub mod dispatch;
pub mod errors;
pub mod memory;
pub mod store;
pub mod ui;
