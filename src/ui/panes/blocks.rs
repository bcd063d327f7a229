//! Block list rendering
//!
//! Lists every segment of the address space in order, allocated blocks and free
//! gaps alike, so the fragmentation the heap map shows can be read off exactly.

use super::utils::{border_style, clamp_scroll};
use crate::memory::{HeapState, Segment};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

/// Render the block list pane
pub fn render_blocks_pane(
    frame: &mut Frame,
    area: Rect,
    heap: &HeapState,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let block = Block::default()
        .title(" Blocks ")
        .borders(Borders::ALL)
        .border_style(border_style(is_focused));

    // Width of the widest address, so ranges line up
    let addr_width = heap.capacity().to_string().len();

    let all_items: Vec<ListItem> = heap
        .segments()
        .iter()
        .map(|segment| {
            let range = format!(
                "[{:>w$}, {:>w$})",
                segment.start(),
                segment.end(),
                w = addr_width
            );
            let line = match segment {
                Segment::Used(b) => Line::from(vec![
                    Span::styled(range, Style::default().fg(DEFAULT_THEME.comment)),
                    Span::raw("  "),
                    Span::styled(
                        format!("pid {:<4}", b.pid()),
                        Style::default()
                            .fg(DEFAULT_THEME.block_color(b.pid()))
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!("{:>w$} units", b.size(), w = addr_width),
                        Style::default().fg(DEFAULT_THEME.number),
                    ),
                ]),
                Segment::Free(r) => Line::from(vec![
                    Span::styled(range, Style::default().fg(DEFAULT_THEME.comment)),
                    Span::raw("  "),
                    Span::styled("free    ", Style::default().fg(DEFAULT_THEME.comment)),
                    Span::styled(
                        format!("{:>w$} units", r.size(), w = addr_width),
                        Style::default()
                            .fg(DEFAULT_THEME.comment)
                            .add_modifier(Modifier::DIM),
                    ),
                ]),
            };
            ListItem::new(line)
        })
        .collect();

    let visible_height = clamp_scroll(area, all_items.len(), scroll_offset);

    let visible_items: Vec<ListItem> = all_items
        .into_iter()
        .skip(*scroll_offset)
        .take(visible_height)
        .collect();

    frame.render_widget(List::new(visible_items).block(block), area);
}
