//! Command dispatch
//!
//! This module turns one textual command into operations on the heap and the
//! relation graph:
//! - [`command`]: the command surface and argument validation
//! - [`engine`]: the [`Dispatcher`], which runs one command as a locked
//!   load → mutate → save cycle
//! - [`report`]: the structured result of a command and its text rendering
//!
//! # Command Surface
//!
//! | Command | Args | Persists |
//! |---------|------|----------|
//! | `allocate` | `size` | yes |
//! | `deallocate` | `pid` | yes |
//! | `compact` | | yes |
//! | `add_relation` | `from to` | yes |
//! | `show_graph` | | no |
//! | `display` | | no |
//! | `stats` | | no |
//! | `logout` | | yes (resets) |

pub mod command;
pub mod engine;
pub mod report;

pub use command::Command;
pub use engine::Dispatcher;
pub use report::Report;
