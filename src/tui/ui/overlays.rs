//! Overlay and popup rendering
//!
//! Handles rendering of help, filter dialog, job detail, kill confirmation and toast notices.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::formatting::{format_bytes, format_duration_hms, truncate_string};
use crate::models::{JobDetail, JobState};
use crate::tui::app::{App, FilterDraft, FilterField, ModalState, Notice};
use crate::tui::theme::Theme;

use super::widgets::centered_rect;

/// Width of the key column in the help tables
const HELP_KEY_WIDTH: usize = 24;

const HELP_SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "Modes",
        &[
            ("Normal mode", "Default mode for navigation and actions"),
            ("Edit mode", "Layout control (resize/toggle panes)"),
            ("m", "Toggle Normal/Edit mode"),
        ],
    ),
    (
        "Normal Mode",
        &[
            ("j / k", "Move down/up in the focused table"),
            ("g / G", "Jump to top/bottom"),
            ("h / l", "Scroll jobs columns left/right"),
            ("Shift+Left / H", "Focus Nodes pane"),
            ("Shift+Right / L", "Focus Jobs pane"),
            ("c", "Toggle compact jobs view"),
            ("x / Delete", "Kill selected job"),
            ("y", "Copy selected job ID"),
            ("Enter", "Open selected job details"),
            ("r", "Refresh now"),
            ("? / F1", "Open/close this manual"),
            ("q", "Quit smon"),
        ],
    ),
    (
        "Edit Mode",
        &[
            ("h / Left", "Narrow nodes pane"),
            ("l / Right", "Widen nodes pane"),
            ("n", "Toggle nodes-only view"),
            ("j", "Toggle jobs-only view"),
            ("v", "Reset split view and default width"),
            ("m / Esc", "Return to normal mode"),
        ],
    ),
    (
        "Filters",
        &[
            ("/", "Open filter dialog (user, name prefix)"),
            ("Tab / Up / Down", "Switch field"),
            ("Ctrl+U", "Clear the current field"),
            ("Ctrl+R", "Reset both fields and apply"),
            ("Enter / Esc", "Apply / cancel"),
            ("z", "Clear the active filter"),
        ],
    ),
];

fn section_header(title: &str, theme: &Theme) -> Line<'static> {
    Line::from(Span::styled(
        title.to_string(),
        Style::default().fg(theme.border_focused).bold(),
    ))
}

fn detail_row(label: &str, value: String, theme: &Theme) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {label:<13}"), Style::default().fg(theme.dim).bold()),
        Span::raw(value),
    ])
}

pub fn render_help_overlay(frame: &mut Frame, area: Rect, theme: &Theme) {
    let popup_area = centered_rect(70, 85, area);

    // Clear the area first
    frame.render_widget(Clear, popup_area);

    let mut help_text = vec![
        Line::from(Span::styled(
            "smon - Keyboard Shortcuts",
            Style::default().bold(),
        )),
        Line::from(""),
    ];

    for (title, rows) in HELP_SECTIONS {
        help_text.push(section_header(title, theme));
        for (key, action) in *rows {
            help_text.push(Line::from(vec![
                Span::styled(
                    format!("  {key:<HELP_KEY_WIDTH$}"),
                    Style::default().fg(theme.fg).bold(),
                ),
                Span::raw(*action),
            ]));
        }
        help_text.push(Line::from(""));
    }

    help_text.push(Line::from(Span::styled(
        "Press ? or Esc to close this help",
        Style::default().fg(theme.dim),
    )));

    let help_para = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border_focused))
                .title(" Help "),
        )
        .style(Style::default().fg(theme.fg));

    frame.render_widget(help_para, popup_area);
}

pub fn render_filter_dialog(draft: &FilterDraft, frame: &mut Frame, area: Rect, theme: &Theme) {
    let popup_area = Rect {
        x: area.x + area.width.saturating_sub(50) / 2,
        y: area.y + area.height.saturating_sub(6) / 2,
        width: area.width.min(50),
        height: 6.min(area.height),
    };

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border_focused))
        .title(" Filter Jobs ");

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let field_line = |label: &str, value: &str, field: FilterField| {
        let active = draft.field == field;
        let label_style = if active {
            Style::default().fg(theme.border_focused).bold()
        } else {
            Style::default().fg(theme.dim)
        };
        Line::from(vec![
            Span::styled(format!(" {label:<12}"), label_style),
            Span::raw(value.to_string()),
        ])
    };

    let lines = vec![
        field_line("User:", &draft.user, FilterField::User),
        field_line("Name prefix:", &draft.prefix, FilterField::Prefix),
        Line::from(""),
        Line::from(Span::styled(
            " [Enter apply \u{2022} Esc cancel \u{2022} Ctrl+R reset]",
            Style::default().fg(theme.dim),
        )),
    ];

    let para = Paragraph::new(lines).style(Style::default().fg(theme.fg));
    frame.render_widget(para, inner);

    // Cursor at the end of the active field
    let (row, len) = match draft.field {
        FilterField::User => (0, draft.user.chars().count()),
        FilterField::Prefix => (1, draft.prefix.chars().count()),
    };
    let x = inner
        .x
        .saturating_add(13)
        .saturating_add(u16::try_from(len).unwrap_or(u16::MAX));
    if x < inner.x + inner.width {
        frame.set_cursor_position((x, inner.y + row));
    }
}

/// Render the job detail popup
pub fn render_job_detail_popup(app: &App, frame: &mut Frame, area: Rect, theme: &Theme) {
    let ModalState::JobDetail {
        job_id,
        detail,
        error,
    } = &app.modal
    else {
        return;
    };

    let popup_area = centered_rect(75, 80, area);
    frame.render_widget(Clear, popup_area);

    // Row from the table as a fallback until the detail arrives
    let job = app.snapshot.job(job_id);
    let state = job.map_or(JobState::Unknown, |j| j.state);

    let title = match job {
        Some(j) => format!(" Job {} - {} [{}] ", job_id, truncate_string(&j.name, 30), state),
        None => format!(" Job {job_id} "),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.job_state_color(state)))
        .title(title);

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let mut lines = Vec::new();

    if let Some(message) = error {
        lines.push(Line::from(Span::styled(
            format!("  Refresh failed: {message}"),
            Style::default().fg(theme.failed),
        )));
        lines.push(Line::from(""));
    }

    match detail {
        Some(detail) => push_detail_lines(&mut lines, detail, theme),
        None if error.is_none() => lines.push(Line::from(Span::styled(
            "  Loading job details...",
            Style::default().fg(theme.dim),
        ))),
        None => {}
    }

    // FOOTER with keybindings
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("  [Esc/Enter]", Style::default().fg(theme.dim).bold()),
        Span::styled(" Close   ", Style::default().fg(theme.dim)),
        Span::styled("[x]", Style::default().fg(theme.dim).bold()),
        Span::styled(" Kill Job   ", Style::default().fg(theme.dim)),
        Span::styled("[y]", Style::default().fg(theme.dim).bold()),
        Span::styled(" Copy ID", Style::default().fg(theme.dim)),
    ]));

    let para = Paragraph::new(lines)
        .style(Style::default().fg(theme.fg))
        .wrap(Wrap { trim: false });
    frame.render_widget(para, inner);
}

fn push_detail_lines(lines: &mut Vec<Line<'static>>, detail: &JobDetail, theme: &Theme) {
    lines.push(section_header("Job", theme));
    for (key, value) in detail.fields.interesting() {
        lines.push(detail_row(key, truncate_string(value, 80), theme));
    }

    if let Some(live) = &detail.live {
        lines.push(Line::from(""));
        lines.push(section_header("Live Usage", theme));
        let cpu = live
            .cpu_percent()
            .map_or_else(|| "-".to_string(), |p| format!("{p:.0}%"));
        lines.push(detail_row("CPU", cpu, theme));
        lines.push(detail_row(
            "CPU time",
            format_duration_hms(live.ave_cpu_secs),
            theme,
        ));
        lines.push(detail_row(
            "RSS",
            format!("{} avg / {} max", format_bytes(live.ave_rss), format_bytes(live.max_rss)),
            theme,
        ));
        lines.push(detail_row(
            "Disk",
            format!(
                "{} read / {} written",
                format_bytes(live.max_disk_read),
                format_bytes(live.max_disk_write)
            ),
            theme,
        ));
    } else if detail.fields.is_running() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "  Live usage unavailable",
            Style::default().fg(theme.dim),
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("  Updated {}", detail.fetched_at.format("%H:%M:%S")),
        Style::default().fg(theme.dim),
    )));
}

/// Render the kill confirmation dialog
pub fn render_kill_confirm(app: &App, frame: &mut Frame, area: Rect, theme: &Theme) {
    let ModalState::KillConfirm { job_id, user, name } = &app.modal else {
        return;
    };

    let popup_area = centered_rect(50, 30, area);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.warning))
        .title(" Kill Job ");

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let mut lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::raw("  Kill job "),
            Span::styled(job_id.clone(), Style::default().bold()),
            Span::raw(format!(" ({})?", truncate_string(name, 30))),
        ]),
        Line::from(format!("  Owner: {}", if user.is_empty() { "?" } else { user })),
    ];

    if app.kill_targets_other_user() {
        lines.push(Line::from(Span::styled(
            format!("  Warning: this job belongs to {user}, not {}", app.username),
            Style::default().fg(theme.failed).bold(),
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::raw("  Press "),
        Span::styled("[y/Enter]", Style::default().fg(theme.warning).bold()),
        Span::raw(" to confirm, "),
        Span::styled("any other key", Style::default().fg(theme.dim).bold()),
        Span::raw(" to cancel"),
    ]));

    let para = Paragraph::new(lines)
        .style(Style::default().fg(theme.fg))
        .alignment(Alignment::Left);
    frame.render_widget(para, inner);
}

/// Render a transient notice toast
pub fn render_notice_toast(notice: &Notice, frame: &mut Frame, area: Rect, theme: &Theme) {
    // Position toast at bottom-right, above the status lines
    let toast_width = u16::try_from(notice.message.chars().count() + 4)
        .unwrap_or(u16::MAX)
        .min(50)
        .min(area.width);
    let toast_area = Rect {
        x: area.x + area.width.saturating_sub(toast_width + 2),
        y: area.y + area.height.saturating_sub(5),
        width: toast_width,
        height: 3.min(area.height),
    };

    frame.render_widget(Clear, toast_area);

    let border_color = if notice.success {
        theme.running
    } else {
        theme.failed
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    let para = Paragraph::new(format!(" {} ", notice.message))
        .block(block)
        .style(Style::default().fg(theme.fg))
        .alignment(Alignment::Center);

    frame.render_widget(para, toast_area);
}
