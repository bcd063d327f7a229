//! Terminal heap viewer built on [ratatui](https://github.com/ratatui-org/ratatui).
//!
//! The UI is organized into three layers:
//!
//! - **[`app`]**: application state, keyboard event loop, pane focus, reloading
//! - **[`panes`]**: stateless render functions for each visible pane (heap map,
//!   blocks, relations, status bar)
//! - **[`theme`]**: centralized color palette used by all panes
//!
//! The entry point for consumers is [`App`]: construct it with a [`Dispatcher`] and
//! call [`App::run`] to start the event loop. The viewer never mutates state; it
//! only takes locked snapshots.
//!
//! [`Dispatcher`]: crate::dispatch::Dispatcher
//! [`App::run`]: app::App::run

pub mod app;
pub mod panes;
pub mod theme;

pub use app::App;
