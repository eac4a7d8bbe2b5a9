//! Application state and core logic for the TUI
//!
//! This module contains the main App struct: the dashboard state machine.
//! The architecture follows a TEA-inspired pattern with mutable state and
//! method-based updates. Every event call is total: when it makes no sense in
//! the current state it is a no-op.

// Submodules
mod state;
mod types;

// Re-export public types
pub use state::{
    FeedbackState, FilterDraft, FilterField, InputMode, ListState, ModalState, Notice, PaneFocus,
    PaneLayout, PaneState,
};
pub use types::{COMPACT_COLUMNS, FULL_COLUMNS, JobColumn, job_columns};

use std::collections::HashSet;
use std::sync::Arc;

use crossterm::event::MouseEventKind;

use crate::error::KillFailed;
use crate::filter::{FilterCriteria, FilteredJobs, apply_filter};
use crate::models::{JobRecord, NodeRecord, SmonConfig, Snapshot};
use crate::scheduler::SchedulerHandle;
use crate::tui::clipboard::Clipboard;
use crate::tui::event::{DataEvent, EventResult, InputEvent, KeyAction, KeyContext};

/// Rows not available to table bodies: header, three totals bars, pane
/// borders, table header, status line and key hints.
const CHROME_ROWS: u16 = 9;

/// Main application state
///
/// Fields are grouped:
/// - `mode`, `panes`, `focus`, `modal`: interaction state
/// - `snapshot`, `filter`, `visible`: what the tables show
/// - `feedback`: errors, config warnings and transient notices
pub struct App {
    // Lifecycle
    pub running: bool,

    // Interaction state
    pub mode: InputMode,
    pub panes: PaneState,
    pub focus: PaneFocus,
    pub modal: ModalState,

    // Data
    pub snapshot: Arc<Snapshot>,
    pub filter: FilterCriteria,
    pub visible: FilteredJobs,

    // Per-table navigation
    pub jobs_list: ListState,
    pub nodes_list: ListState,
    pub compact: bool,
    pub column_offset: usize,

    kills_in_flight: HashSet<String>,

    pub feedback: FeedbackState,

    // User context
    pub username: String,
    pub cluster_name: String,
    pub config: SmonConfig,

    // Collaborators
    scheduler: SchedulerHandle,
    clipboard: Box<dyn Clipboard>,
}

impl App {
    /// Create the dashboard state for `config`.
    ///
    /// Commands go to the scheduler behind `scheduler`; yanked job ids go to
    /// `clipboard`.
    pub fn new(
        config: SmonConfig,
        config_warnings: Vec<String>,
        scheduler: SchedulerHandle,
        clipboard: Box<dyn Clipboard>,
    ) -> Self {
        Self {
            running: true,
            mode: InputMode::Normal,
            panes: PaneState::new(config.display.node_pane_width),
            focus: PaneFocus::Jobs,
            modal: ModalState::None,
            snapshot: Arc::new(Snapshot::default()),
            filter: FilterCriteria::default(),
            visible: FilteredJobs::default(),
            jobs_list: ListState::default(),
            nodes_list: ListState::default(),
            compact: config.display.compact_jobs,
            column_offset: 0,
            kills_in_flight: HashSet::new(),
            feedback: FeedbackState::new(config_warnings),
            username: crate::slurm::current_user(),
            cluster_name: config.cluster_name(),
            config,
            scheduler,
            clipboard,
        }
    }

    /// Override the user kill confirmations compare against.
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    // ========================================================================
    // Event dispatch
    // ========================================================================

    fn key_context(&self) -> KeyContext {
        match (&self.modal, self.mode) {
            (ModalState::KillConfirm { .. }, _) => KeyContext::Confirm,
            (ModalState::FilterDialog(_), _) => KeyContext::TextEntry,
            (_, InputMode::Edit) => KeyContext::Edit,
            (_, InputMode::Normal) => KeyContext::Normal,
        }
    }

    /// Handle an input event
    pub fn handle_input(&mut self, event: InputEvent) -> EventResult {
        match event {
            InputEvent::Key(key_event) => {
                let action = KeyAction::from_key_event(key_event, self.key_context());
                self.handle_action(action)
            }
            InputEvent::Resize(width, height) => {
                self.handle_resize(width, height);
                EventResult::Continue
            }
            InputEvent::Mouse(mouse_event) => {
                if self.modal.is_confirming_kill()
                    && !matches!(
                        mouse_event.kind,
                        MouseEventKind::Moved | MouseEventKind::Drag(_) | MouseEventKind::Up(_)
                    )
                {
                    self.cancel_kill();
                    return EventResult::Continue;
                }
                if self.modal.is_active() {
                    return EventResult::Unchanged;
                }
                let action = KeyAction::from_mouse_event(mouse_event);
                self.handle_action(action)
            }
        }
    }

    /// Handle a key action
    fn handle_action(&mut self, action: KeyAction) -> EventResult {
        // Help overlay takes priority
        if matches!(self.modal, ModalState::Help) {
            return match action {
                KeyAction::Escape | KeyAction::ShowHelp | KeyAction::Quit => {
                    self.close_modal();
                    EventResult::Continue
                }
                _ => EventResult::Unchanged,
            };
        }

        // Modal modes take priority over normal navigation
        match &self.modal {
            ModalState::FilterDialog(_) => return self.handle_filter_action(action),
            ModalState::KillConfirm { .. } => return self.handle_confirm_action(action),
            ModalState::JobDetail { .. } => return self.handle_detail_action(action),
            _ => {}
        }

        if let Some(result) = self.handle_navigation(&action) {
            return result;
        }

        if let Some(result) = self.handle_layout(&action) {
            return result;
        }

        match action {
            KeyAction::Quit => {
                self.running = false;
                EventResult::Quit
            }
            KeyAction::Select => {
                self.open_detail();
                EventResult::Continue
            }
            KeyAction::Kill => {
                self.request_kill();
                EventResult::Continue
            }
            KeyAction::YankJobId => {
                self.yank_selected_job_id();
                EventResult::Continue
            }
            KeyAction::ToggleCompact => {
                self.toggle_compact();
                EventResult::Continue
            }
            KeyAction::OpenFilter => {
                self.open_filter_dialog();
                EventResult::Continue
            }
            KeyAction::ClearFilter => {
                self.clear_filter();
                EventResult::Continue
            }
            KeyAction::Refresh => {
                self.scheduler.request_refresh();
                EventResult::Unchanged
            }
            KeyAction::ShowHelp => {
                self.open_help();
                EventResult::Continue
            }
            KeyAction::Escape if self.mode == InputMode::Edit => {
                self.toggle_mode();
                EventResult::Continue
            }
            _ => EventResult::Unchanged,
        }
    }

    /// Handle navigation actions (returns Some if action was handled)
    fn handle_navigation(&mut self, action: &KeyAction) -> Option<EventResult> {
        match action {
            KeyAction::MoveUp => self.select_prev(),
            KeyAction::MoveDown => self.select_next(),
            KeyAction::MoveToTop => self.with_current_list(ListState::move_to_top),
            KeyAction::MoveToBottom => self.with_current_list(ListState::move_to_bottom),
            KeyAction::PageUp => self.with_current_list(ListState::page_up),
            KeyAction::PageDown => self.with_current_list(ListState::page_down),
            KeyAction::ScrollLeft => self.scroll_jobs_left(),
            KeyAction::ScrollRight => self.scroll_jobs_right(),
            KeyAction::FocusNodes => self.focus_pane(PaneFocus::Nodes),
            KeyAction::FocusJobs => self.focus_pane(PaneFocus::Jobs),
            _ => return None,
        }
        Some(EventResult::Continue)
    }

    /// Handle mode and layout actions (returns Some if action was handled)
    fn handle_layout(&mut self, action: &KeyAction) -> Option<EventResult> {
        match action {
            KeyAction::ToggleMode => self.toggle_mode(),
            KeyAction::NarrowPane => self.narrow_nodes_pane(),
            KeyAction::WidenPane => self.widen_nodes_pane(),
            KeyAction::ToggleNodesOnly => self.toggle_nodes_only(),
            KeyAction::ToggleJobsOnly => self.toggle_jobs_only(),
            KeyAction::ResetPanes => self.reset_panes(),
            _ => return None,
        }
        Some(EventResult::Continue)
    }

    /// Handle actions in the kill confirmation
    fn handle_confirm_action(&mut self, action: KeyAction) -> EventResult {
        match action {
            KeyAction::Confirm => self.confirm_kill(),
            _ => self.cancel_kill(),
        }
        EventResult::Continue
    }

    /// Handle actions in the detail view
    fn handle_detail_action(&mut self, action: KeyAction) -> EventResult {
        match action {
            KeyAction::Escape | KeyAction::Select => {
                self.close_modal();
                EventResult::Continue
            }
            KeyAction::Quit => {
                self.running = false;
                EventResult::Quit
            }
            KeyAction::Kill => {
                if let Some(job_id) = self.modal.detail_job_id().map(str::to_string) {
                    self.close_modal();
                    self.begin_kill(&job_id);
                }
                EventResult::Continue
            }
            KeyAction::YankJobId => {
                self.yank_selected_job_id();
                EventResult::Continue
            }
            KeyAction::Refresh => {
                self.scheduler.request_refresh();
                EventResult::Unchanged
            }
            _ => EventResult::Unchanged,
        }
    }

    fn handle_filter_action(&mut self, action: KeyAction) -> EventResult {
        match action {
            KeyAction::Escape => {
                // Discard the draft, keep the applied filter
                self.close_modal();
            }
            KeyAction::Select => {
                if let ModalState::FilterDialog(draft) = std::mem::take(&mut self.modal) {
                    self.apply_filter(draft.criteria());
                }
            }
            KeyAction::FilterReset => {
                self.close_modal();
                self.clear_filter();
            }
            KeyAction::Quit => {
                self.running = false;
                return EventResult::Quit;
            }
            other => {
                let Some(draft) = self.modal.filter_draft_mut() else {
                    return EventResult::Unchanged;
                };
                match other {
                    KeyAction::TextChar(c) => draft.push(c),
                    KeyAction::TextBackspace => draft.backspace(),
                    KeyAction::TextClear => draft.clear_field(),
                    KeyAction::NextField | KeyAction::PrevField => draft.field = draft.field.other(),
                    _ => return EventResult::Unchanged,
                }
            }
        }
        EventResult::Continue
    }

    /// Handle a data event from the scheduler
    pub fn handle_data(&mut self, event: DataEvent) -> EventResult {
        match event {
            DataEvent::DetailUpdated(detail) => {
                self.on_detail(Ok(detail));
            }
            DataEvent::DetailFailed { job_id, error } => {
                self.on_detail(Err((job_id, error.to_string())));
            }
            DataEvent::KillFinished { job_id, result } => {
                self.on_kill_result(&job_id, result);
            }
        }
        EventResult::Continue
    }

    pub fn handle_resize(&mut self, width: u16, height: u16) {
        self.panes.set_term_width(width);
        let rows = usize::from(height.saturating_sub(CHROME_ROWS));
        self.jobs_list.visible_count = rows;
        self.nodes_list.visible_count = rows;
        self.jobs_list.clamp(self.visible.visible());
        self.nodes_list.clamp(self.snapshot.nodes.len());
    }

    // ========================================================================
    // Data updates
    // ========================================================================

    /// Install a new snapshot: recompute the filtered view and clamp selections.
    pub fn on_snapshot(&mut self, snapshot: Arc<Snapshot>) {
        self.snapshot = snapshot;
        self.refilter();
        self.nodes_list.clamp(self.snapshot.nodes.len());
    }

    /// Detail result for the open detail modal; results for other jobs are ignored.
    pub fn on_detail(&mut self, result: Result<crate::models::JobDetail, (String, String)>) {
        let ModalState::JobDetail { job_id, detail, error } = &mut self.modal else {
            return;
        };
        match result {
            Ok(fresh) if fresh.job_id == *job_id => {
                *detail = Some(fresh);
                *error = None;
            }
            Err((failed_id, message)) if failed_id == *job_id => {
                *error = Some(message);
            }
            _ => {}
        }
    }

    /// Outcome of a confirmed kill, reported exactly once.
    pub fn on_kill_result(&mut self, job_id: &str, result: Result<(), KillFailed>) {
        self.kills_in_flight.remove(job_id);
        match result {
            Ok(()) => {
                self.feedback
                    .set_notice(Notice::success(format!("Killed job {job_id}")));
            }
            Err(e) => {
                self.feedback.clear_notice();
                self.feedback.set_error(e.to_string());
            }
        }
    }

    fn refilter(&mut self) {
        self.visible = apply_filter(&self.snapshot.jobs, &self.filter);
        self.jobs_list.clamp(self.visible.visible());
        let max_offset = job_columns(self.compact).len().saturating_sub(1);
        self.column_offset = self.column_offset.min(max_offset);
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Helper to apply a navigation operation to the focused list.
    /// The closure receives the focused ListState and the list length.
    fn with_current_list<F>(&mut self, f: F)
    where
        F: FnOnce(&mut ListState, usize),
    {
        match self.focus {
            PaneFocus::Jobs => f(&mut self.jobs_list, self.visible.visible()),
            PaneFocus::Nodes => f(&mut self.nodes_list, self.snapshot.nodes.len()),
        }
    }

    pub fn select_next(&mut self) {
        self.with_current_list(ListState::move_down);
    }

    pub fn select_prev(&mut self) {
        self.with_current_list(ListState::move_up);
    }

    /// Focus a pane, leaving the opposite *-only layout if needed.
    pub fn focus_pane(&mut self, focus: PaneFocus) {
        let hidden = match focus {
            PaneFocus::Nodes => !self.panes.shows_nodes(),
            PaneFocus::Jobs => !self.panes.shows_jobs(),
        };
        if hidden {
            self.panes.layout = PaneLayout::Split;
        }
        self.focus = focus;
    }

    pub fn scroll_jobs_left(&mut self) {
        if self.focus == PaneFocus::Jobs {
            self.column_offset = self.column_offset.saturating_sub(1);
        }
    }

    pub fn scroll_jobs_right(&mut self) {
        if self.focus == PaneFocus::Jobs {
            let max_offset = job_columns(self.compact).len().saturating_sub(1);
            self.column_offset = (self.column_offset + 1).min(max_offset);
        }
    }

    // ========================================================================
    // Mode and layout
    // ========================================================================

    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            InputMode::Normal => InputMode::Edit,
            InputMode::Edit => InputMode::Normal,
        };
    }

    pub fn narrow_nodes_pane(&mut self) {
        self.panes.narrow();
    }

    pub fn widen_nodes_pane(&mut self) {
        self.panes.widen();
    }

    pub fn toggle_nodes_only(&mut self) {
        self.panes.toggle(PaneLayout::NodesOnly);
        if self.panes.layout == PaneLayout::NodesOnly {
            self.focus = PaneFocus::Nodes;
        }
    }

    pub fn toggle_jobs_only(&mut self) {
        self.panes.toggle(PaneLayout::JobsOnly);
        if self.panes.layout == PaneLayout::JobsOnly {
            self.focus = PaneFocus::Jobs;
        }
    }

    pub fn reset_panes(&mut self) {
        self.panes.reset();
    }

    pub fn toggle_compact(&mut self) {
        self.compact = !self.compact;
        self.column_offset = 0;
    }

    // ========================================================================
    // Filter
    // ========================================================================

    /// Replace the filter criteria. Only the job selection is touched (clamped).
    pub fn apply_filter(&mut self, criteria: FilterCriteria) {
        tracing::debug!(?criteria, "applying job filter");
        self.filter = criteria;
        self.refilter();
    }

    pub fn clear_filter(&mut self) {
        self.apply_filter(FilterCriteria::default());
    }

    // ========================================================================
    // Modals
    // ========================================================================

    pub fn open_help(&mut self) {
        self.close_modal();
        self.modal = ModalState::Help;
    }

    pub fn open_filter_dialog(&mut self) {
        self.close_modal();
        self.modal = ModalState::FilterDialog(FilterDraft::from_criteria(&self.filter));
    }

    /// Open the detail modal for the selected job and start its refresh cadence.
    pub fn open_detail(&mut self) {
        if self.mode != InputMode::Normal || self.focus != PaneFocus::Jobs {
            return;
        }
        let Some(job_id) = self.selected_job_id() else {
            return;
        };
        self.close_modal();
        self.scheduler.fetch_detail(&job_id);
        self.modal = ModalState::JobDetail {
            job_id,
            detail: None,
            error: None,
        };
    }

    /// Close whatever modal is open; closing the detail modal stops its cadence.
    pub fn close_modal(&mut self) {
        if matches!(self.modal, ModalState::JobDetail { .. }) {
            self.scheduler.stop_detail();
        }
        self.modal = ModalState::None;
    }

    // ========================================================================
    // Kill
    // ========================================================================

    /// Ask for confirmation before killing the selected job.
    pub fn request_kill(&mut self) {
        if self.mode != InputMode::Normal {
            return;
        }
        if self.focus != PaneFocus::Jobs {
            self.feedback
                .set_notice(Notice::failure("Select the Jobs table first!".to_string()));
            return;
        }
        match self.selected_job_id() {
            Some(job_id) => self.begin_kill(&job_id),
            None => self
                .feedback
                .set_notice(Notice::failure("No job selected.".to_string())),
        }
    }

    fn begin_kill(&mut self, job_id: &str) {
        if self.kills_in_flight.contains(job_id) {
            self.feedback
                .set_notice(Notice::failure(format!("Kill of job {job_id} already in progress")));
            return;
        }
        let (user, name) = self
            .snapshot
            .job(job_id)
            .map(|j| (j.user.clone(), j.name.clone()))
            .unwrap_or_default();
        self.modal = ModalState::KillConfirm {
            job_id: job_id.to_string(),
            user,
            name,
        };
    }

    /// Send the single kill attempt for the confirmed job.
    pub fn confirm_kill(&mut self) {
        let ModalState::KillConfirm { job_id, .. } = std::mem::take(&mut self.modal) else {
            return;
        };
        if !self.kills_in_flight.insert(job_id.clone()) {
            return;
        }
        tracing::info!(job_id = %job_id, "kill confirmed");
        self.scheduler.kill_job(&job_id);
        self.feedback
            .set_notice(Notice::success(format!("Killing job {job_id}...")));
    }

    pub fn cancel_kill(&mut self) {
        if self.modal.is_confirming_kill() {
            self.modal = ModalState::None;
        }
    }

    #[must_use]
    pub fn kill_in_flight(&self, job_id: &str) -> bool {
        self.kills_in_flight.contains(job_id)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// The selected job among the visible ones.
    #[must_use]
    pub fn selected_job(&self) -> Option<&JobRecord> {
        self.jobs_list
            .selected
            .and_then(|n| self.visible.get(&self.snapshot.jobs, n))
    }

    /// Id of the selected job; the clipboard source.
    #[must_use]
    pub fn selected_job_id(&self) -> Option<String> {
        self.selected_job().map(|j| j.job_id.clone())
    }

    #[must_use]
    pub fn selected_node(&self) -> Option<&NodeRecord> {
        self.nodes_list
            .selected
            .and_then(|n| self.snapshot.nodes.get(n))
    }

    /// Visible jobs in display order.
    pub fn visible_jobs(&self) -> impl Iterator<Item = &JobRecord> {
        self.visible.iter(&self.snapshot.jobs)
    }

    /// Whether the kill confirmation targets someone else's job.
    #[must_use]
    pub fn kill_targets_other_user(&self) -> bool {
        match &self.modal {
            ModalState::KillConfirm { user, .. } => !user.is_empty() && *user != self.username,
            _ => false,
        }
    }

    /// Get the current error message if it should be shown
    #[must_use]
    pub fn current_error(&self) -> Option<&str> {
        self.feedback.current_error()
    }

    /// Copy the selected job id to the clipboard.
    fn yank_selected_job_id(&mut self) {
        let job_id = match &self.modal {
            ModalState::JobDetail { job_id, .. } => Some(job_id.clone()),
            _ if self.focus == PaneFocus::Jobs => self.selected_job_id(),
            _ => None,
        };
        let Some(job_id) = job_id else {
            return;
        };

        if !self.config.behavior.copy_to_clipboard {
            self.feedback
                .set_notice(Notice::failure("Clipboard disabled in config".to_string()));
            return;
        }

        let notice = match self.clipboard.set(&job_id) {
            Ok(_) => Notice::success(format!("Copied: {job_id}")),
            Err(e) => {
                tracing::warn!(error = %e, "clipboard copy failed");
                Notice::failure(format!("Clipboard Error: {e}"))
            }
        };
        self.feedback.set_notice(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendError;
    use crate::models::{JobDetail, JobState};
    use crate::scheduler::SchedulerCommand;
    use crate::tui::clipboard::{ClipboardError, CopyReport};
    use chrono::Local;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent};
    use proptest::prelude::*;
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    #[derive(Clone, Default)]
    struct RecordingClipboard(Arc<Mutex<Vec<String>>>);

    impl Clipboard for RecordingClipboard {
        fn set(&mut self, contents: &str) -> Result<CopyReport, ClipboardError> {
            self.0.lock().unwrap().push(contents.to_string());
            Ok(CopyReport {
                osc52: true,
                local: false,
            })
        }
    }

    fn job(id: &str, user: &str, name: &str) -> JobRecord {
        JobRecord {
            job_id: id.into(),
            user: user.into(),
            name: name.into(),
            state: JobState::Running,
            ..Default::default()
        }
    }

    fn node(name: &str) -> NodeRecord {
        NodeRecord {
            name: name.into(),
            ..Default::default()
        }
    }

    fn snapshot(previous: &Snapshot, jobs: Vec<JobRecord>) -> Arc<Snapshot> {
        Arc::new(Snapshot::fresh(
            previous,
            vec![node("n1"), node("n2")],
            jobs,
            0,
            Local::now(),
        ))
    }

    fn default_jobs() -> Vec<JobRecord> {
        vec![
            job("100", "alice", "train-1"),
            job("101", "alice", "eval-2"),
            job("102", "bob", "train-3"),
        ]
    }

    struct Harness {
        app: App,
        commands: mpsc::Receiver<SchedulerCommand>,
        copied: Arc<Mutex<Vec<String>>>,
    }

    impl Harness {
        fn new() -> Self {
            let (handle, commands) = SchedulerHandle::channel();
            let clipboard = RecordingClipboard::default();
            let copied = Arc::clone(&clipboard.0);
            let mut config = SmonConfig::default();
            config.system.fake_data = true;
            let mut app = App::new(config, Vec::new(), handle, Box::new(clipboard))
                .with_username("alice");
            app.handle_resize(160, 40);
            let snap = snapshot(&app.snapshot, default_jobs());
            app.on_snapshot(snap);
            Self {
                app,
                commands,
                copied,
            }
        }

        fn key(&mut self, code: KeyCode) -> EventResult {
            self.app
                .handle_input(InputEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)))
        }

        fn chars(&mut self, text: &str) {
            for c in text.chars() {
                self.key(KeyCode::Char(c));
            }
        }

        fn drain(&mut self) -> Vec<SchedulerCommand> {
            let mut out = Vec::new();
            while let Ok(cmd) = self.commands.try_recv() {
                out.push(cmd);
            }
            out
        }
    }

    #[test]
    fn test_initial_state() {
        let h = Harness::new();
        assert_eq!(h.app.mode, InputMode::Normal);
        assert_eq!(h.app.focus, PaneFocus::Jobs);
        assert_eq!(h.app.jobs_list.selected, Some(0));
        assert_eq!(h.app.cluster_name, "DEMO-CLUSTER");
        assert_eq!(h.app.selected_job_id().as_deref(), Some("100"));
    }

    #[test]
    fn test_empty_snapshot_has_no_selection() {
        let (handle, _rx) = SchedulerHandle::channel();
        let mut app = App::new(
            SmonConfig::default(),
            Vec::new(),
            handle,
            Box::new(RecordingClipboard::default()),
        );
        let snap = snapshot(&app.snapshot, Vec::new());
        app.on_snapshot(snap);
        assert_eq!(app.jobs_list.selected, None);
        app.select_next();
        assert_eq!(app.jobs_list.selected, None);
        app.request_kill();
        assert!(!app.modal.is_active());
    }

    #[test]
    fn test_selection_clamped_on_snapshot() {
        let mut h = Harness::new();
        h.key(KeyCode::Char('G'));
        assert_eq!(h.app.jobs_list.selected, Some(2));

        let snap = snapshot(&h.app.snapshot, vec![job("100", "alice", "train-1")]);
        h.app.on_snapshot(snap);
        assert_eq!(h.app.jobs_list.selected, Some(0));
    }

    #[test]
    fn test_filter_dialog_applies_and_clamps() {
        let mut h = Harness::new();
        h.key(KeyCode::Char('G'));
        h.key(KeyCode::Char('/'));
        assert!(h.app.modal.is_editing_filter());

        h.chars("Alice");
        h.key(KeyCode::Tab);
        h.chars("train");
        h.key(KeyCode::Enter);

        assert!(!h.app.modal.is_active());
        assert_eq!(h.app.filter, FilterCriteria::new(Some("Alice"), Some("train")));
        let visible: Vec<_> = h.app.visible_jobs().map(|j| j.job_id.as_str()).collect();
        assert_eq!(visible, vec!["100"]);
        assert_eq!((h.app.visible.visible(), h.app.visible.total), (1, 3));
        assert_eq!(h.app.jobs_list.selected, Some(0));
        // Nothing else changed
        assert_eq!(h.app.mode, InputMode::Normal);
        assert_eq!(h.app.focus, PaneFocus::Jobs);
    }

    #[test]
    fn test_filter_dialog_escape_keeps_applied_filter() {
        let mut h = Harness::new();
        h.app.apply_filter(FilterCriteria::new(Some("bob"), None));
        h.key(KeyCode::Char('/'));
        h.chars("xyz");
        h.key(KeyCode::Esc);
        assert_eq!(h.app.filter, FilterCriteria::new(Some("bob"), None));
    }

    #[test]
    fn test_filter_dialog_reset_and_clear_key() {
        let mut h = Harness::new();
        h.app.apply_filter(FilterCriteria::new(Some("bob"), None));
        h.key(KeyCode::Char('/'));
        h.app.handle_input(InputEvent::Key(KeyEvent::new(
            KeyCode::Char('r'),
            KeyModifiers::CONTROL,
        )));
        assert!(!h.app.filter.is_active());
        assert!(!h.app.modal.is_active());

        h.app.apply_filter(FilterCriteria::new(Some("bob"), None));
        h.key(KeyCode::Char('z'));
        assert!(!h.app.filter.is_active());
        assert_eq!(h.app.visible.visible(), 3);
    }

    #[test]
    fn test_kill_confirm_yes_sends_single_kill() {
        let mut h = Harness::new();
        h.key(KeyCode::Down);
        h.key(KeyCode::Char('x'));
        assert!(h.app.modal.is_confirming_kill());
        assert!(!h.app.kill_targets_other_user());

        h.key(KeyCode::Char('y'));
        assert!(!h.app.modal.is_active());
        assert!(h.app.kill_in_flight("101"));
        assert_eq!(h.drain(), vec![SchedulerCommand::Kill("101".into())]);

        // Second request while in flight is refused
        h.key(KeyCode::Char('x'));
        assert!(!h.app.modal.is_active());
        assert!(h.drain().is_empty());
    }

    #[test]
    fn test_kill_confirm_any_other_key_cancels() {
        for code in [KeyCode::Char('n'), KeyCode::Esc, KeyCode::Char('q'), KeyCode::Down] {
            let mut h = Harness::new();
            h.key(KeyCode::Delete);
            assert!(h.app.modal.is_confirming_kill());
            assert_eq!(h.key(code), EventResult::Continue);
            assert!(!h.app.modal.is_active());
            assert!(h.app.running);
            assert!(h.drain().is_empty());
        }
    }

    #[test]
    fn test_kill_confirm_wheel_or_click_cancels() {
        for kind in [
            MouseEventKind::ScrollDown,
            MouseEventKind::Down(MouseButton::Left),
        ] {
            let mut h = Harness::new();
            h.key(KeyCode::Delete);
            assert!(h.app.modal.is_confirming_kill());

            let mouse = |kind| {
                InputEvent::Mouse(MouseEvent {
                    kind,
                    column: 0,
                    row: 0,
                    modifiers: KeyModifiers::NONE,
                })
            };
            assert_eq!(h.app.handle_input(mouse(MouseEventKind::Moved)), EventResult::Unchanged);
            assert!(h.app.modal.is_confirming_kill());

            assert_eq!(h.app.handle_input(mouse(kind)), EventResult::Continue);
            assert!(!h.app.modal.is_active());

            h.key(KeyCode::Char('y'));
            assert!(h.drain().is_empty());
        }
    }

    #[test]
    fn test_kill_warns_for_other_users_job() {
        let mut h = Harness::new();
        h.key(KeyCode::Char('G'));
        h.key(KeyCode::Char('x'));
        match &h.app.modal {
            ModalState::KillConfirm { job_id, user, name } => {
                assert_eq!((job_id.as_str(), user.as_str(), name.as_str()), ("102", "bob", "train-3"));
            }
            other => panic!("unexpected modal {other:?}"),
        }
        assert!(h.app.kill_targets_other_user());
    }

    #[test]
    fn test_kill_requires_jobs_focus() {
        let mut h = Harness::new();
        h.key(KeyCode::Char('H'));
        h.key(KeyCode::Char('x'));
        assert!(!h.app.modal.is_active());
        let notice = h.app.feedback.current_notice().unwrap();
        assert_eq!(notice.message, "Select the Jobs table first!");
        assert!(!notice.success);
    }

    #[test]
    fn test_failed_kill_reported_once() {
        let mut h = Harness::new();
        h.key(KeyCode::Char('x'));
        h.key(KeyCode::Enter);
        let failure = KillFailed {
            job_id: "100".into(),
            source: BackendError::CommandFailed {
                program: "scancel".into(),
                exit_code: Some(1),
                stderr: "Invalid job id specified".into(),
            },
        };
        h.app.handle_data(DataEvent::KillFinished {
            job_id: "100".into(),
            result: Err(failure),
        });
        assert!(h.app.current_error().unwrap().contains("100"));
        assert!(h.app.feedback.current_notice().is_none());
        assert!(!h.app.kill_in_flight("100"));
        // Job stays in the table; no retry was sent
        assert_eq!(h.drain(), vec![SchedulerCommand::Kill("100".into())]);
        assert!(h.app.snapshot.job("100").is_some());
    }

    #[test]
    fn test_detail_lifecycle() {
        let mut h = Harness::new();
        h.key(KeyCode::Enter);
        assert_eq!(h.app.modal.detail_job_id(), Some("100"));
        assert_eq!(h.drain(), vec![SchedulerCommand::WatchDetail("100".into())]);

        // Results for another job are ignored
        h.app.handle_data(DataEvent::DetailUpdated(JobDetail {
            job_id: "999".into(),
            fields: Default::default(),
            live: None,
            fetched_at: Local::now(),
        }));
        assert!(matches!(h.app.modal, ModalState::JobDetail { detail: None, .. }));

        h.app.handle_data(DataEvent::DetailUpdated(JobDetail {
            job_id: "100".into(),
            fields: Default::default(),
            live: None,
            fetched_at: Local::now(),
        }));
        assert!(matches!(h.app.modal, ModalState::JobDetail { detail: Some(_), .. }));

        h.app.handle_data(DataEvent::DetailFailed {
            job_id: "100".into(),
            error: BackendError::CommandTimeout {
                program: "scontrol".into(),
                timeout: std::time::Duration::from_secs(5),
            },
        });
        assert!(matches!(
            h.app.modal,
            ModalState::JobDetail { detail: Some(_), error: Some(_), .. }
        ));

        h.key(KeyCode::Esc);
        assert!(!h.app.modal.is_active());
        assert_eq!(h.drain(), vec![SchedulerCommand::StopDetail]);
    }

    #[test]
    fn test_edit_mode_layout_keys() {
        let mut h = Harness::new();
        h.key(KeyCode::Char('m'));
        assert_eq!(h.app.mode, InputMode::Edit);

        h.key(KeyCode::Char('l'));
        assert_eq!(h.app.panes.width(), PaneState::DEFAULT_WIDTH + PaneState::STEP);
        h.key(KeyCode::Char('h'));
        h.key(KeyCode::Char('h'));
        assert_eq!(h.app.panes.width(), PaneState::DEFAULT_WIDTH - PaneState::STEP);

        h.key(KeyCode::Char('n'));
        assert_eq!(h.app.panes.layout, PaneLayout::NodesOnly);
        assert_eq!(h.app.focus, PaneFocus::Nodes);
        h.key(KeyCode::Char('j'));
        assert_eq!(h.app.panes.layout, PaneLayout::JobsOnly);
        assert_eq!(h.app.focus, PaneFocus::Jobs);
        h.key(KeyCode::Char('j'));
        assert_eq!(h.app.panes.layout, PaneLayout::Split);
        assert_eq!(h.app.panes.width(), PaneState::DEFAULT_WIDTH - PaneState::STEP);

        // Kill and detail are not available in edit mode
        h.key(KeyCode::Char('x'));
        h.key(KeyCode::Enter);
        assert!(!h.app.modal.is_active());

        h.key(KeyCode::Char('v'));
        assert_eq!(h.app.panes.width(), PaneState::DEFAULT_WIDTH);
        h.key(KeyCode::Esc);
        assert_eq!(h.app.mode, InputMode::Normal);
    }

    #[test]
    fn test_focus_leaves_opposite_only_layout() {
        let mut h = Harness::new();
        h.app.toggle_jobs_only();
        h.key(KeyCode::Char('H'));
        assert_eq!(h.app.panes.layout, PaneLayout::Split);
        assert_eq!(h.app.focus, PaneFocus::Nodes);

        h.app.toggle_nodes_only();
        h.key(KeyCode::Char('H'));
        assert_eq!(h.app.panes.layout, PaneLayout::NodesOnly);
    }

    #[test]
    fn test_nodes_navigation_is_independent() {
        let mut h = Harness::new();
        h.key(KeyCode::Char('H'));
        h.key(KeyCode::Char('j'));
        assert_eq!(h.app.nodes_list.selected, Some(1));
        assert_eq!(h.app.jobs_list.selected, Some(0));
        assert_eq!(h.app.selected_node().map(|n| n.name.as_str()), Some("n2"));
    }

    #[test]
    fn test_yank_copies_selected_job_id() {
        let mut h = Harness::new();
        h.key(KeyCode::Char('j'));
        h.key(KeyCode::Char('y'));
        assert_eq!(*h.copied.lock().unwrap(), vec!["101".to_string()]);
        assert_eq!(h.app.feedback.current_notice().unwrap().message, "Copied: 101");
    }

    #[test]
    fn test_compact_toggle_and_column_scroll() {
        let mut h = Harness::new();
        for _ in 0..30 {
            h.key(KeyCode::Char('l'));
        }
        assert_eq!(h.app.column_offset, FULL_COLUMNS.len() - 1);
        h.key(KeyCode::Char('c'));
        assert!(h.app.compact);
        assert_eq!(h.app.column_offset, 0);
        h.key(KeyCode::Char('h'));
        assert_eq!(h.app.column_offset, 0);
    }

    #[test]
    fn test_help_and_quit() {
        let mut h = Harness::new();
        h.key(KeyCode::Char('?'));
        assert!(matches!(h.app.modal, ModalState::Help));
        // q closes help instead of quitting
        assert_eq!(h.key(KeyCode::Char('q')), EventResult::Continue);
        assert!(h.app.running);
        assert_eq!(h.key(KeyCode::Char('q')), EventResult::Quit);
        assert!(!h.app.running);
    }

    #[test]
    fn test_refresh_key_requests_sample() {
        let mut h = Harness::new();
        h.key(KeyCode::Char('r'));
        assert_eq!(h.drain(), vec![SchedulerCommand::RefreshNow]);
    }

    fn arb_key() -> impl Strategy<Value = KeyCode> {
        prop_oneof![
            Just(KeyCode::Up),
            Just(KeyCode::Down),
            Just(KeyCode::Left),
            Just(KeyCode::Right),
            Just(KeyCode::Enter),
            Just(KeyCode::Esc),
            Just(KeyCode::Tab),
            Just(KeyCode::Delete),
            Just(KeyCode::Backspace),
            Just(KeyCode::PageDown),
            Just(KeyCode::End),
            "[a-zA-Z/?]".prop_map(|s| KeyCode::Char(s.chars().next().unwrap_or('a'))),
        ]
    }

    #[derive(Debug, Clone)]
    enum Step {
        Key(KeyCode),
        Snapshot(usize),
    }

    fn arb_step() -> impl Strategy<Value = Step> {
        prop_oneof![
            4 => arb_key().prop_map(Step::Key),
            1 => (0usize..6).prop_map(Step::Snapshot),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(128))]

        #[test]
        fn prop_selection_always_within_visible(steps in proptest::collection::vec(arb_step(), 0..60)) {
            let mut h = Harness::new();
            for step in steps {
                match step {
                    Step::Key(code) => {
                        if code == KeyCode::Char('q') {
                            continue;
                        }
                        h.key(code);
                    }
                    Step::Snapshot(n) => {
                        let jobs = (0..n)
                            .map(|i| job(&format!("{}", 200 + i), if i % 2 == 0 { "alice" } else { "bob" }, "train"))
                            .collect();
                        let snap = snapshot(&h.app.snapshot, jobs);
                        h.app.on_snapshot(snap);
                    }
                }

                let visible = h.app.visible.visible();
                match h.app.jobs_list.selected {
                    None => prop_assert_eq!(visible, 0),
                    Some(i) => prop_assert!(i < visible),
                }
                prop_assert!(h.app.visible.visible() <= h.app.visible.total);
                prop_assert!(h.app.panes.width() >= PaneState::MIN_WIDTH);
                prop_assert!(h.app.panes.width() <= h.app.panes.max_width());
                if h.app.mode == InputMode::Edit {
                    prop_assert!(!h.app.modal.is_confirming_kill());
                }
            }
        }
    }
}
