//! Heap map rendering
//!
//! The whole address space is drawn as a grid of cells, one row after another.
//! Each cell covers `capacity / cells` units and is painted with the color of the
//! process owning its first address, or as free space.

use crate::memory::{HeapState, Pid, Segment};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

const USED_CELL: &str = "█";
const FREE_CELL: &str = "·";

/// Owner of the first address of each of `cells` equal slices of the heap
pub(crate) fn cell_owners(heap: &HeapState, cells: usize) -> Vec<Option<Pid>> {
    let capacity = heap.capacity();
    if cells == 0 || capacity == 0 {
        return Vec::new();
    }

    let segments = heap.segments();
    let mut owners = Vec::with_capacity(cells);
    let mut index = 0;

    for cell in 0..cells as u64 {
        // Widened so large capacities cannot overflow the product
        let addr = (cell as u128 * capacity as u128 / cells as u128) as u64;
        // Addresses only grow, so the segment cursor never moves back
        while index + 1 < segments.len() && segments[index].end() <= addr {
            index += 1;
        }
        owners.push(match segments.get(index) {
            Some(Segment::Used(block)) => Some(block.pid()),
            _ => None,
        });
    }

    owners
}

/// Render the heap map pane
pub fn render_heap_map(frame: &mut Frame, area: Rect, heap: &HeapState) {
    let title = format!(
        " Heap Map  {}/{} used ",
        heap.used(),
        heap.capacity()
    );
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(DEFAULT_THEME.border_normal));

    let inner = block.inner(area);
    let width = inner.width as usize;
    let owners = cell_owners(heap, width * inner.height as usize);

    let lines: Vec<Line> = owners
        .chunks(width.max(1))
        .map(|row| {
            // Merge runs of the same owner into one span
            let mut spans = Vec::new();
            let mut run_start = 0;
            for i in 1..=row.len() {
                if i == row.len() || row[i] != row[run_start] {
                    let text = match row[run_start] {
                        Some(_) => USED_CELL.repeat(i - run_start),
                        None => FREE_CELL.repeat(i - run_start),
                    };
                    let style = match row[run_start] {
                        Some(pid) => Style::default().fg(DEFAULT_THEME.block_color(pid)),
                        None => Style::default()
                            .fg(DEFAULT_THEME.comment)
                            .add_modifier(Modifier::DIM),
                    };
                    spans.push(Span::styled(text, style));
                    run_start = i;
                }
            }
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
