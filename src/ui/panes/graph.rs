//! Relation graph rendering
//!
//! One line per source process: `1 -> 2, 4`. Endpoints that are no longer allocated
//! (left behind by a deallocation, or added in permissive mode) are shown in the
//! error color.

use super::utils::{border_style, clamp_scroll};
use crate::memory::{HeapState, Pid, RelationGraph};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

fn pid_style(pid: Pid, heap: &HeapState) -> Style {
    if heap.contains_pid(pid) {
        Style::default().fg(DEFAULT_THEME.block_color(pid))
    } else {
        Style::default()
            .fg(DEFAULT_THEME.error)
            .add_modifier(Modifier::CROSSED_OUT)
    }
}

/// Render the relation graph pane
pub fn render_graph_pane(
    frame: &mut Frame,
    area: Rect,
    graph: &RelationGraph,
    heap: &HeapState,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let block = Block::default()
        .title(format!(" Relations ({}) ", graph.len()))
        .borders(Borders::ALL)
        .border_style(border_style(is_focused));

    if graph.is_empty() {
        let paragraph = Paragraph::new("(no relations)")
            .block(block)
            .style(Style::default().fg(DEFAULT_THEME.comment));
        frame.render_widget(paragraph, area);
        return;
    }

    let mut sources: Vec<Pid> = graph.edges().map(|e| e.from).collect();
    sources.dedup(); // Edges are sorted by source

    let all_items: Vec<ListItem> = sources
        .into_iter()
        .map(|from| {
            let mut spans = vec![
                Span::styled(format!("{:>4}", from), pid_style(from, heap)),
                Span::styled(" -> ", Style::default().fg(DEFAULT_THEME.comment)),
            ];
            for (i, to) in graph.successors(from).enumerate() {
                if i > 0 {
                    spans.push(Span::styled(", ", Style::default().fg(DEFAULT_THEME.comment)));
                }
                spans.push(Span::styled(to.to_string(), pid_style(to, heap)));
            }
            ListItem::new(Line::from(spans))
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
