//! Jobs pane rendering
//!
//! The jobs table shows the filtered view of the snapshot with either the full
//! or the compact column set, scrolled horizontally by `column_offset`.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};

use crate::formatting::truncate_string;
use crate::models::JobRecord;
use crate::tui::app::{App, JobColumn, PaneFocus, job_columns};
use crate::tui::theme::Theme;

use super::widgets::{create_table_header, window_offset};

pub fn render_jobs_pane(app: &App, frame: &mut Frame, area: Rect, theme: &Theme) {
    let focused = app.focus == PaneFocus::Jobs;
    let columns = visible_columns(app);

    let mut title = if app.filter.is_active() {
        format!(" Jobs ({}/{}) ", app.visible.visible(), app.visible.total)
    } else {
        format!(" Jobs ({}) ", app.visible.total)
    };
    if app.compact {
        title.push_str("[compact] ");
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

    if app.visible.is_empty() {
        let msg = if app.snapshot.is_loading() {
            "Loading jobs..."
        } else if app.filter.is_active() {
            "No jobs match the filter (z to clear)"
        } else {
            "No jobs found"
        };
        let para = Paragraph::new(msg)
            .style(Style::default().fg(theme.dim))
            .alignment(Alignment::Center);
        frame.render_widget(para, inner);
        return;
    }

    let header = create_table_header(columns.iter().map(|c| c.header()), theme);

    let available_height = inner.height.saturating_sub(1) as usize; // -1 for header
    let selected = app.jobs_list.selected;
    let scroll_offset = window_offset(
        selected,
        app.jobs_list.scroll_offset,
        available_height,
        app.visible.visible(),
    );

    let rows: Vec<Row> = app
        .visible_jobs()
        .enumerate()
        .skip(scroll_offset)
        .take(available_height)
        .map(|(i, job)| {
            let is_selected = focused && selected == Some(i);
            job_to_row(app, job, columns, is_selected, theme)
        })
        .collect();

    let widths: Vec<Constraint> = columns
        .iter()
        .map(|c| match c {
            JobColumn::Name | JobColumn::WhereOrWhy => Constraint::Min(c.width()),
            _ => Constraint::Length(c.width()),
        })
        .collect();

    let table = Table::new(rows, widths).header(header);
    frame.render_widget(table, inner);
}

/// Columns after horizontal scrolling.
fn visible_columns(app: &App) -> &'static [JobColumn] {
    let all = job_columns(app.compact);
    &all[app.column_offset.min(all.len().saturating_sub(1))..]
}

fn job_to_row<'a>(
    app: &App,
    job: &JobRecord,
    columns: &[JobColumn],
    is_selected: bool,
    theme: &Theme,
) -> Row<'a> {
    let killing = app.kill_in_flight(&job.job_id);

    let cells: Vec<Cell> = columns
        .iter()
        .map(|column| {
            let text = truncate_string(&column.cell(job), usize::from(column.width()));
            let style = match column {
                JobColumn::State if killing => Style::default().fg(theme.failed).italic(),
                JobColumn::State => Style::default().fg(theme.job_state_color(job.state)),
                JobColumn::User if job.user == app.username => {
                    Style::default().fg(theme.own_job)
                }
                _ => Style::default(),
            };
            let text = if killing && *column == JobColumn::State {
                "KILLING".to_string()
            } else {
                text
            };
            Cell::from(text).style(style)
        })
        .collect();

    let row = Row::new(cells);
    if is_selected {
        row.style(Style::default().bg(theme.selected_bg).fg(theme.selected_fg))
    } else {
        row
    }
}
