//! Nodes pane rendering

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};

use crate::formatting::{format_gib, truncate_string};
use crate::models::NodeRecord;
use crate::tui::app::{App, PaneFocus};
use crate::tui::theme::Theme;

use super::widgets::{create_table_header, window_offset};

const NODE_HEADERS: [&str; 5] = ["Node", "State", "CPU", "Mem", "GPU"];

pub fn render_nodes_pane(app: &App, frame: &mut Frame, area: Rect, theme: &Theme) {
    let focused = app.focus == PaneFocus::Nodes;
    let nodes = &app.snapshot.nodes;

    let mut title = format!(" Nodes ({}) ", nodes.len());
    // Offline reason of the selected node, where there is one
    if focused
        && let Some(node) = app.selected_node()
        && node.is_offline()
        && !node.reason.is_empty()
    {
        title = format!(" {}: {} ", node.name, truncate_string(&node.reason, 30));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if focused {
            theme.border_focused
        } else {
            theme.border
        }))
        .title(title);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if nodes.is_empty() {
        let msg = if app.snapshot.is_loading() {
            "Loading nodes..."
        } else {
            "No nodes found"
        };
        let para = Paragraph::new(msg)
            .style(Style::default().fg(theme.dim))
            .alignment(Alignment::Center);
        frame.render_widget(para, inner);
        return;
    }

    let header = create_table_header(NODE_HEADERS, theme);

    let available_height = inner.height.saturating_sub(1) as usize; // -1 for header
    let selected = app.nodes_list.selected;
    let scroll_offset = window_offset(
        selected,
        app.nodes_list.scroll_offset,
        available_height,
        nodes.len(),
    );

    let rows: Vec<Row> = nodes
        .iter()
        .enumerate()
        .skip(scroll_offset)
        .take(available_height)
        .map(|(i, node)| {
            let is_selected = focused && selected == Some(i);
            node_to_row(node, is_selected, theme)
        })
        .collect();

    let widths = [
        Constraint::Min(8),     // Node
        Constraint::Length(6),  // State
        Constraint::Length(9),  // CPU
        Constraint::Length(11), // Mem
        Constraint::Length(5),  // GPU
    ];

    let table = Table::new(rows, widths).header(header);
    frame.render_widget(table, inner);
}

fn node_to_row<'a>(node: &'a NodeRecord, is_selected: bool, theme: &Theme) -> Row<'a> {
    let state_style = Style::default().fg(theme.node_state_color(node.state));
    let cpu_style = Style::default().fg(theme.usage_color(node.cpu_percent()));
    let mem_style = Style::default().fg(theme.usage_color(node.mem_percent()));

    let gpu = match (node.gpu_allocated, node.gpu_total) {
        (Some(used), Some(total)) if total > 0 => format!("{used}/{total}"),
        _ => "-".to_string(),
    };

    let cells = vec![
        Cell::from(node.name.as_str()),
        Cell::from(abbreviate_state(node)).style(state_style),
        Cell::from(format!("{}/{}", node.cpu_allocated, node.cpu_total)).style(cpu_style),
        Cell::from(format!(
            "{}/{}",
            format_gib(node.mem_allocated).trim_end_matches('G'),
            format_gib(node.mem_total)
        ))
        .style(mem_style),
        Cell::from(gpu),
    ];

    let row = Row::new(cells);
    if is_selected {
        row.style(Style::default().bg(theme.selected_bg).fg(theme.selected_fg))
    } else {
        row
    }
}

/// Short state label that fits the narrow nodes pane.
fn abbreviate_state(node: &NodeRecord) -> &'static str {
    use crate::models::NodeState;
    match node.state {
        NodeState::Idle => "idle",
        NodeState::Allocated => "alloc",
        NodeState::Mixed => "mix",
        NodeState::Down => "down",
        NodeState::Drain => "drain",
        NodeState::Unknown => "?",
    }
}
