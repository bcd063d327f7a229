//! TUI pane rendering modules
//!
//! # Pane Modules
//!
//! - [`heap`]: heap map, the address space drawn as a colored grid
//! - [`blocks`]: ordered list of blocks and free gaps
//! - [`graph`]: relation edges grouped by source process
//! - [`status`]: status bar with heap summary and keybindings
//! - `utils`: border styling and scroll clamping shared by the list panes
//!
//! Each pane module exports a stateless `render_*` function; scroll offsets live in
//! [`App`](crate::ui::App).

mod utils;

pub mod blocks;
pub mod graph;
pub mod heap;
pub mod status;

pub use blocks::render_blocks_pane;
pub use graph::render_graph_pane;
pub use heap::render_heap_map;
pub use status::render_status_bar;
