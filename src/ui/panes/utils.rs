use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
};

pub(crate) fn border_style(is_focused: bool) -> Style {
    if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    }
}

/// Clamp `scroll_offset` so the last page stays full, and return the visible row count
pub(crate) fn clamp_scroll(area: Rect, total_items: usize, scroll_offset: &mut usize) -> usize {
    let visible_height = area.height.saturating_sub(2).max(1) as usize; // borders

    if total_items > visible_height {
        *scroll_offset = (*scroll_offset).min(total_items - visible_height);
    } else {
        *scroll_offset = 0;
    }

    visible_height
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_scroll() {
        let area = Rect::new(0, 0, 20, 7); // 5 visible rows
        let mut offset = 100;
        assert_eq!(clamp_scroll(area, 12, &mut offset), 5);
        assert_eq!(offset, 7);

        let mut offset = 3;
        clamp_scroll(area, 4, &mut offset);
        assert_eq!(offset, 0);
    }
}
