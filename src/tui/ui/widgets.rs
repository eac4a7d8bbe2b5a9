//! Reusable UI widgets and helper functions
//!
//! This module contains shared rendering utilities used by both panes and the overlays.

use ratatui::prelude::*;
use ratatui::widgets::{Cell, Row};

use crate::formatting::usage_bar;
use crate::tui::theme::Theme;

/// Create a styled table header row from column names
pub fn create_table_header<'a>(columns: impl IntoIterator<Item = &'a str>, theme: &Theme) -> Row<'a> {
    let header_cells = columns
        .into_iter()
        .map(|h| Cell::from(h).style(Style::default().fg(theme.header_fg).bold()));
    Row::new(header_cells)
        .style(Style::default().bg(theme.header_bg))
        .height(1)
}

/// First row to draw so the selection stays visible.
///
/// Starts from the offset the list state tracked and only moves when the
/// selection would fall outside the window.
pub fn window_offset(selected: Option<usize>, offset: usize, height: usize, total: usize) -> usize {
    if height == 0 || total == 0 {
        return 0;
    }

    let max_offset = total.saturating_sub(height);
    let offset = offset.min(max_offset);
    match selected {
        Some(sel) if sel < offset => sel,
        Some(sel) if sel >= offset + height => sel + 1 - height,
        _ => offset,
    }
}

/// Create a centered rectangle
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .split(area);

    Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .split(popup_layout[1])[1]
}

/// Usage bar such as `[#####.....]`: the filled part coloured by usage,
/// the rest in the track colour.
pub fn create_progress_bar(percent: f64, width: usize, theme: &Theme) -> Vec<Span<'static>> {
    let text = usage_bar(percent, width);
    let filled = text.matches('#').count() + 1;
    let (used, rest) = text.split_at(filled);
    vec![
        Span::styled(used.to_string(), Style::default().fg(theme.usage_color(percent))),
        Span::styled(rest.to_string(), Style::default().fg(theme.usage_track)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_offset_follows_selection() {
        assert_eq!(window_offset(Some(0), 0, 10, 100), 0);
        assert_eq!(window_offset(Some(12), 0, 10, 100), 3);
        assert_eq!(window_offset(Some(4), 8, 10, 100), 4);
        // Keeps the tracked offset while the selection is inside the window
        assert_eq!(window_offset(Some(9), 5, 10, 100), 5);
    }

    #[test]
    fn test_window_offset_bounds() {
        assert_eq!(window_offset(None, 7, 10, 0), 0);
        assert_eq!(window_offset(None, 50, 10, 12), 2);
        assert_eq!(window_offset(Some(3), 0, 0, 12), 0);
    }

    #[test]
    fn test_progress_bar_splits_filled_and_track() {
        let theme = Theme::dark();
        let spans = create_progress_bar(50.0, 4, &theme);
        assert_eq!(spans[0].content, "[##");
        assert_eq!(spans[1].content, "..]");
        assert_eq!(spans[1].style.fg, Some(theme.usage_track));
    }

    #[test]
    fn test_centered_rect_inside_area() {
        let area = Rect::new(0, 0, 100, 50);
        let popup = centered_rect(60, 40, area);
        assert_eq!(popup.width, 60);
        assert!(popup.x >= 19 && popup.x <= 21);
    }
}
