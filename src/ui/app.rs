//! Main TUI application state and logic

use crate::dispatch::Dispatcher;
use crate::errors::SimResult;
use crate::memory::{HeapState, RelationGraph};
use crate::store::StateStore;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use std::io;
use std::time::{Duration, Instant};
use tracing::debug;

const AUTO_RELOAD_INTERVAL: Duration = Duration::from_secs(1);

/// Which pane is currently focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Blocks,
    Graph,
}

impl FocusedPane {
    pub fn next(self) -> Self {
        match self {
            FocusedPane::Blocks => FocusedPane::Graph,
            FocusedPane::Graph => FocusedPane::Blocks,
        }
    }
}

/// The main application state
pub struct App<S: StateStore> {
    /// Source of the state being viewed
    pub dispatcher: Dispatcher<S>,

    /// Last loaded heap
    pub heap: HeapState,

    /// Last loaded relation graph
    pub graph: RelationGraph,

    /// Currently focused pane
    pub focused_pane: FocusedPane,

    /// Per-pane scroll offsets
    pub blocks_scroll: usize,
    pub graph_scroll: usize,

    /// Whether the app should quit
    pub should_quit: bool,

    /// Status message to display
    pub status_message: String,

    /// Whether the last reload failed
    pub is_error: bool,

    /// Whether the state is reloaded periodically
    pub auto_reload: bool,

    /// Last time the state was loaded
    pub last_reload: Instant,
}

impl<S: StateStore> App<S> {
    /// Create a new app and load the current state
    pub fn new(dispatcher: Dispatcher<S>) -> SimResult<Self> {
        let (heap, graph) = dispatcher.snapshot()?;
        Ok(App {
            dispatcher,
            heap,
            graph,
            focused_pane: FocusedPane::Blocks,
            blocks_scroll: 0,
            graph_scroll: 0,
            should_quit: false,
            status_message: String::from("Loaded"),
            is_error: false,
            auto_reload: false,
            last_reload: Instant::now(),
        })
    }

    /// Run the TUI application
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            if self.auto_reload && self.last_reload.elapsed() >= AUTO_RELOAD_INTERVAL {
                self.reload();
            }

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }
        }

        Ok(())
    }

    /// Render the UI
    fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();

        // Heap map on top, lists below, status bar at the bottom
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage(35),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(size);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(main_chunks[1]);

        super::panes::render_heap_map(frame, main_chunks[0], &self.heap);

        super::panes::render_blocks_pane(
            frame,
            columns[0],
            &self.heap,
            self.focused_pane == FocusedPane::Blocks,
            &mut self.blocks_scroll,
        );

        super::panes::render_graph_pane(
            frame,
            columns[1],
            &self.graph,
            &self.heap,
            self.focused_pane == FocusedPane::Graph,
            &mut self.graph_scroll,
        );

        super::panes::render_status_bar(
            frame,
            main_chunks[2],
            &self.status_message,
            &self.heap.stats(),
            self.is_error,
            self.auto_reload,
        );
    }

    /// Handle keyboard events
    fn handle_key_event(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char('r') => self.reload(),
            KeyCode::Char('a') => {
                self.auto_reload = !self.auto_reload;
                self.status_message = if self.auto_reload {
                    "Auto reload on".to_string()
                } else {
                    "Auto reload off".to_string()
                };
            }
            KeyCode::Tab => {
                self.focused_pane = self.focused_pane.next();
            }
            KeyCode::Up => match self.focused_pane {
                FocusedPane::Blocks => self.blocks_scroll = self.blocks_scroll.saturating_sub(1),
                FocusedPane::Graph => self.graph_scroll = self.graph_scroll.saturating_sub(1),
            },
            KeyCode::Down => match self.focused_pane {
                FocusedPane::Blocks => self.blocks_scroll = self.blocks_scroll.saturating_add(1),
                FocusedPane::Graph => self.graph_scroll = self.graph_scroll.saturating_add(1),
            },
            _ => {}
        }
    }

    /// Reload the state; on failure keep showing the previous one
    pub fn reload(&mut self) {
        self.last_reload = Instant::now();
        match self.dispatcher.snapshot() {
            Ok((heap, graph)) => {
                debug!(blocks = heap.blocks().len(), "reloaded state");
                self.heap = heap;
                self.graph = graph;
                self.is_error = false;
                if !self.auto_reload {
                    self.status_message = "Reloaded".to_string();
                }
            }
            Err(e) => {
                self.is_error = true;
                self.status_message = format!("Reload failed: {}", e);
            }
        }
    }
}
