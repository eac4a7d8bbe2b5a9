//! UI rendering for the TUI
//!
//! This module handles all rendering using ratatui. The rendering is event-driven -
//! we only render when an event triggers a state change or the clock ticks, not at
//! a fixed frame rate. A render pass reads one snapshot from `App` throughout.

mod jobs;
mod nodes;
mod overlays;
mod widgets;

use chrono::Local;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::formatting::{format_bytes, format_duration_human, percent};
use crate::models::{Capacity, JobState};
use crate::tui::app::{App, InputMode, ModalState, PaneLayout};
use crate::tui::theme::Theme;

use jobs::render_jobs_pane;
use nodes::render_nodes_pane;
use overlays::{
    render_filter_dialog, render_help_overlay, render_job_detail_popup, render_kill_confirm,
    render_notice_toast,
};
use widgets::create_progress_bar;

/// Width of the usage bars in the totals block
const TOTALS_BAR_WIDTH: usize = 30;

/// Render the entire TUI
pub fn render(app: &App, frame: &mut Frame) {
    // Use theme from configuration
    let theme = Theme::from_name(&app.config.display.theme);
    let area = frame.area();

    // Main layout: header, totals, panes, footer
    let layout = Layout::vertical([
        Constraint::Length(1), // Header
        Constraint::Length(3), // Totals bars
        Constraint::Min(0),    // Panes
        Constraint::Length(1), // Status line
        Constraint::Length(1), // Key hints
    ])
    .split(area);

    render_header(app, frame, layout[0], &theme);
    render_totals(app, frame, layout[1], &theme);
    render_panes(app, frame, layout[2], &theme);
    render_status_line(app, frame, layout[3], &theme);
    render_key_hints(app, frame, layout[4], &theme);

    // Overlays (render in order of z-index)
    match &app.modal {
        ModalState::Help => render_help_overlay(frame, area, &theme),
        ModalState::FilterDialog(draft) => render_filter_dialog(draft, frame, area, &theme),
        ModalState::JobDetail { .. } => render_job_detail_popup(app, frame, area, &theme),
        ModalState::KillConfirm { .. } => render_kill_confirm(app, frame, area, &theme),
        ModalState::None => {}
    }

    // Notice toast (always on top)
    if let Some(notice) = app.feedback.current_notice() {
        render_notice_toast(notice, frame, area, &theme);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect, theme: &Theme) {
    let (pill_bg, pill_label) = match app.mode {
        InputMode::Normal => (theme.normal_mode, InputMode::Normal.label()),
        InputMode::Edit => (theme.edit_mode, InputMode::Edit.label()),
    };

    let clock = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let left = vec![
        Span::styled(
            format!(" {pill_label} "),
            Style::default().bg(pill_bg).fg(theme.header_fg).bold(),
        ),
        Span::raw(" "),
        Span::styled(app.config.display.title.clone(), Style::default().bold()),
        Span::styled(" @ ", Style::default().fg(theme.dim)),
        Span::styled(
            app.cluster_name.clone(),
            Style::default().fg(theme.border_focused).bold(),
        ),
    ];

    let chunks = Layout::horizontal([Constraint::Min(0), Constraint::Length(20)]).split(area);
    frame.render_widget(Paragraph::new(Line::from(left)), chunks[0]);
    frame.render_widget(
        Paragraph::new(clock)
            .style(Style::default().fg(theme.dim))
            .alignment(Alignment::Right),
        chunks[1],
    );
}

fn render_totals(app: &App, frame: &mut Frame, area: Rect, theme: &Theme) {
    let totals = app.snapshot.totals();
    let offline = totals.offline_nodes();

    let rows = Layout::vertical([Constraint::Length(1); 3]).split(area);
    let lines = [
        totals_line(
            "CPU",
            &totals.available,
            |c| (c.cpu_allocated, c.cpu_total),
            |n| n.to_string(),
            totals.theoretical.cpu_total,
            theme,
        ),
        totals_line(
            "Mem",
            &totals.available,
            |c| (c.mem_allocated, c.mem_total),
            format_bytes,
            totals.theoretical.mem_total,
            theme,
        ),
        totals_line(
            "GPU",
            &totals.available,
            |c| (c.gpu_allocated, c.gpu_total),
            |n| n.to_string(),
            totals.theoretical.gpu_total,
            theme,
        ),
    ];

    for (i, mut line) in lines.into_iter().enumerate() {
        // Node counts after the CPU bar
        if i == 0 {
            line.spans.push(Span::styled(
                format!(
                    "  nodes {}/{}",
                    totals.available.nodes, totals.theoretical.nodes
                ),
                Style::default().fg(theme.dim),
            ));
            if offline > 0 {
                line.spans.push(Span::styled(
                    format!(" ({offline} offline)"),
                    Style::default().fg(theme.failed),
                ));
            }
        }
        frame.render_widget(Paragraph::new(line), rows[i]);
    }
}

/// One totals bar: usage of the available capacity, with the theoretical
/// total alongside when nodes are offline.
fn totals_line(
    label: &str,
    available: &Capacity,
    pick: impl Fn(&Capacity) -> (u64, u64),
    fmt: fn(u64) -> String,
    theoretical_total: u64,
    theme: &Theme,
) -> Line<'static> {
    let (used, total) = pick(available);
    let pct = percent(used, total);
    let mut spans = vec![Span::styled(format!(" {label:<4}"), Style::default().bold())];
    spans.extend(create_progress_bar(pct, TOTALS_BAR_WIDTH, theme));
    spans.push(Span::raw(format!(" {pct:>5.1}% ")));
    spans.push(Span::raw(format!("{}/{}", fmt(used), fmt(total))));
    if theoretical_total != total {
        spans.push(Span::styled(
            format!(" of {}", fmt(theoretical_total)),
            Style::default().fg(theme.dim),
        ));
    }
    Line::from(spans)
}

fn render_panes(app: &App, frame: &mut Frame, area: Rect, theme: &Theme) {
    match app.panes.layout {
        PaneLayout::NodesOnly => render_nodes_pane(app, frame, area, theme),
        PaneLayout::JobsOnly => render_jobs_pane(app, frame, area, theme),
        PaneLayout::Split => {
            let chunks = Layout::horizontal([
                Constraint::Length(app.panes.width()),
                Constraint::Min(0),
            ])
            .split(area);
            render_nodes_pane(app, frame, chunks[0], theme);
            render_jobs_pane(app, frame, chunks[1], theme);
        }
    }
}

fn render_status_line(app: &App, frame: &mut Frame, area: Rect, theme: &Theme) {
    let snapshot = &app.snapshot;
    let mut status_parts = Vec::new();

    // Jobs summary
    let running = snapshot
        .jobs
        .iter()
        .filter(|j| j.state == JobState::Running)
        .count();
    let pending = snapshot
        .jobs
        .iter()
        .filter(|j| j.state == JobState::Pending)
        .count();
    status_parts.push(Span::styled(" Jobs: ", Style::default().fg(theme.dim)));
    status_parts.push(Span::styled(
        format!("{running} running"),
        Style::default().fg(theme.running),
    ));
    status_parts.push(Span::raw(", "));
    status_parts.push(Span::styled(
        format!("{pending} pending"),
        Style::default().fg(theme.pending),
    ));

    if let Some(summary) = app.filter.summary() {
        status_parts.push(Span::raw(" | "));
        status_parts.push(Span::styled(
            format!("Filter: {summary} ({}/{})", app.visible.visible(), app.visible.total),
            Style::default().fg(theme.border_focused),
        ));
    }

    // Last update time
    status_parts.push(Span::raw(" | "));
    match snapshot.fetched_at {
        Some(fetched) => {
            let age = (Local::now() - fetched).num_seconds().max(0).unsigned_abs();
            let age_str = format_duration_human(age);
            if snapshot.stale {
                status_parts.push(Span::styled(
                    format!("Updated: {age_str} ago (*STALE*)"),
                    Style::default().fg(theme.stale_indicator).bold(),
                ));
            } else {
                status_parts.push(Span::styled(
                    format!("Updated: {age_str} ago"),
                    Style::default().fg(theme.dim),
                ));
            }
        }
        None if snapshot.last_error.is_some() => {
            status_parts.push(Span::styled(
                "No data yet (*STALE*)",
                Style::default().fg(theme.stale_indicator).bold(),
            ));
        }
        None => {
            status_parts.push(Span::styled("Loading...", Style::default().fg(theme.pending)));
        }
    }

    if let Some(error) = &snapshot.last_error {
        status_parts.push(Span::styled(
            format!(" {error}"),
            Style::default().fg(theme.stale_indicator),
        ));
    }

    if snapshot.skipped_rows > 0 {
        status_parts.push(Span::styled(
            format!(" | {} rows skipped", snapshot.skipped_rows),
            Style::default().fg(theme.warning),
        ));
    }

    // Config warnings display (persistent until fixed)
    if let Some(first) = app.feedback.config_warnings.first() {
        let more = app.feedback.config_warnings.len() - 1;
        let warning_text = if more == 0 {
            format!(" | WARN: {first}")
        } else {
            format!(" | WARN: {first} (+{more} more)")
        };
        status_parts.push(Span::styled(
            warning_text,
            Style::default().fg(theme.warning),
        ));
    }

    // Error display (temporary, auto-dismisses)
    if let Some(error) = app.current_error() {
        status_parts.push(Span::styled(
            format!(" | ERROR: {error} "),
            Style::default().fg(theme.failed),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(status_parts)), area);
}

fn render_key_hints(app: &App, frame: &mut Frame, area: Rect, theme: &Theme) {
    let keybinds = match (&app.modal, app.mode) {
        (ModalState::FilterDialog(_), _) => {
            " Tab:field  Ctrl+U:clear field  Ctrl+R:reset  Enter:apply  Esc:cancel "
        }
        (ModalState::KillConfirm { .. }, _) => " y/Enter:kill  any other key:cancel ",
        (ModalState::JobDetail { .. }, _) => " Esc/Enter:close  x:kill  y:yank  r:refresh  q:quit ",
        (ModalState::Help, _) => " ?/Esc:close help ",
        (ModalState::None, InputMode::Normal) => {
            " j/k:move  H/L:focus  Enter:detail  x:kill  y:yank  c:compact  /:filter  z:clear  m:edit  ?:help  q:quit "
        }
        (ModalState::None, InputMode::Edit) => {
            " h/l:resize  n:nodes-only  j:jobs-only  v:reset  H/L:focus  m/Esc:normal  ?:help  q:quit "
        }
    };
    let keybinds_para = Paragraph::new(keybinds).style(Style::default().fg(theme.dim));
    frame.render_widget(keybinds_para, area);
}
