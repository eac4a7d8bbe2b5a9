//! Application state types for the TUI
//!
//! This module contains the state management types:
//! - Input mode, pane layout and focus (InputMode, PaneState, PaneFocus)
//! - Modal states (Help, JobDetail, KillConfirm, FilterDialog)
//! - Selection and navigation state (ListState)
//! - Feedback state for errors and notices

use std::time::{Duration, Instant};

use crate::filter::FilterCriteria;
use crate::models::JobDetail;

// ============================================================================
// Input Mode and Layout
// ============================================================================

/// Which key table is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    /// Layout-only operations; refresh keeps running
    Edit,
}

impl InputMode {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            InputMode::Normal => "NORMAL",
            InputMode::Edit => "EDIT",
        }
    }
}

/// Which table receives navigation keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaneFocus {
    Nodes,
    #[default]
    Jobs,
}

/// Which panes are shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaneLayout {
    #[default]
    Split,
    NodesOnly,
    JobsOnly,
}

/// Pane layout plus the remembered split width of the nodes pane.
#[derive(Debug, Clone)]
pub struct PaneState {
    pub layout: PaneLayout,
    width: u16,
    default_width: u16,
    term_width: u16,
}

impl PaneState {
    pub const DEFAULT_WIDTH: u16 = 42;
    pub const MIN_WIDTH: u16 = 24;
    pub const STEP: u16 = 4;
    /// Columns always left to the jobs pane when computing the maximum width.
    pub const JOBS_RESERVE: u16 = 40;

    pub fn new(default_width: u16) -> Self {
        let default_width = default_width.max(Self::MIN_WIDTH);
        Self {
            layout: PaneLayout::Split,
            width: default_width,
            default_width,
            term_width: 0,
        }
    }

    /// Widest the nodes pane may get for the current terminal.
    #[must_use]
    pub fn max_width(&self) -> u16 {
        Self::MIN_WIDTH.max(self.term_width.saturating_sub(Self::JOBS_RESERVE))
    }

    /// Split width as rendered; never wider than the terminal allows.
    #[must_use]
    pub fn width(&self) -> u16 {
        if self.term_width == 0 {
            self.width
        } else {
            self.width.clamp(Self::MIN_WIDTH, self.max_width())
        }
    }

    pub fn set_term_width(&mut self, term_width: u16) {
        self.term_width = term_width;
        self.width = self.width();
    }

    pub fn narrow(&mut self) {
        if self.layout == PaneLayout::Split {
            self.width = self.width().saturating_sub(Self::STEP).max(Self::MIN_WIDTH);
        }
    }

    pub fn widen(&mut self) {
        if self.layout == PaneLayout::Split {
            let widened = self.width().saturating_add(Self::STEP);
            self.width = if self.term_width == 0 {
                widened
            } else {
                widened.min(self.max_width())
            };
        }
    }

    /// Enter `layout`, or go back to split if it is already active.
    pub fn toggle(&mut self, layout: PaneLayout) {
        self.layout = if self.layout == layout {
            PaneLayout::Split
        } else {
            layout
        };
    }

    pub fn reset(&mut self) {
        self.layout = PaneLayout::Split;
        self.width = self.default_width;
        self.width = self.width();
    }

    #[must_use]
    pub fn shows_nodes(&self) -> bool {
        self.layout != PaneLayout::JobsOnly
    }

    #[must_use]
    pub fn shows_jobs(&self) -> bool {
        self.layout != PaneLayout::NodesOnly
    }
}

impl Default for PaneState {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WIDTH)
    }
}

// ============================================================================
// Notices
// ============================================================================

/// Transient status-line message (clipboard, kill outcome, warnings)
#[derive(Debug, Clone)]
pub struct Notice {
    pub message: String,
    pub success: bool,
    pub timestamp: Instant,
}

impl Notice {
    pub fn success(message: String) -> Self {
        Self {
            message,
            success: true,
            timestamp: Instant::now(),
        }
    }

    pub fn failure(message: String) -> Self {
        Self {
            message,
            success: false,
            timestamp: Instant::now(),
        }
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.timestamp.elapsed() < Duration::from_secs(3)
    }
}

// ============================================================================
// List Navigation State
// ============================================================================

/// List state with selection and scroll tracking
///
/// `selected` is `None` exactly when the list is empty (after a `clamp`).
#[derive(Debug, Clone, Default)]
pub struct ListState {
    pub selected: Option<usize>,
    pub scroll_offset: usize,
    pub visible_count: usize,
}

impl ListState {
    pub fn clamp(&mut self, list_len: usize) {
        if list_len == 0 {
            self.selected = None;
            self.scroll_offset = 0;
            return;
        }

        let selected = self.selected.unwrap_or(0).min(list_len - 1);
        self.selected = Some(selected);
        if selected < self.scroll_offset {
            self.scroll_offset = selected;
        } else if self.visible_count > 0 && selected >= self.scroll_offset + self.visible_count {
            self.scroll_offset = selected.saturating_sub(self.visible_count - 1);
        }
        self.scroll_offset = self.scroll_offset.min(list_len - 1);
    }

    pub fn move_up(&mut self, list_len: usize) {
        self.selected = self.selected.map(|s| s.saturating_sub(1));
        self.clamp(list_len);
    }

    pub fn move_down(&mut self, list_len: usize) {
        self.selected = Some(self.selected.map_or(0, |s| s.saturating_add(1)));
        self.clamp(list_len);
    }

    pub fn move_to_top(&mut self, list_len: usize) {
        self.selected = Some(0);
        self.scroll_offset = 0;
        self.clamp(list_len);
    }

    pub fn move_to_bottom(&mut self, list_len: usize) {
        if list_len > 0 {
            self.selected = Some(list_len - 1);
            if self.visible_count > 0 {
                self.scroll_offset = list_len.saturating_sub(self.visible_count);
            }
        }
        self.clamp(list_len);
    }

    pub fn page_up(&mut self, list_len: usize) {
        let jump = self.visible_count.max(2) / 2;
        self.selected = self.selected.map(|s| s.saturating_sub(jump));
        self.clamp(list_len);
    }

    pub fn page_down(&mut self, list_len: usize) {
        let jump = self.visible_count.max(2) / 2;
        self.selected = Some(self.selected.map_or(0, |s| s.saturating_add(jump)));
        self.clamp(list_len);
    }
}

// ============================================================================
// Modal State
// ============================================================================

/// Field of the filter dialog that receives typed text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterField {
    #[default]
    User,
    Prefix,
}

impl FilterField {
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            FilterField::User => FilterField::Prefix,
            FilterField::Prefix => FilterField::User,
        }
    }
}

/// Draft of the filter dialog. Applied only on Enter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterDraft {
    pub user: String,
    pub prefix: String,
    pub field: FilterField,
}

impl FilterDraft {
    /// Start editing from the currently applied criteria.
    pub fn from_criteria(criteria: &FilterCriteria) -> Self {
        Self {
            user: criteria.user.clone().unwrap_or_default(),
            prefix: criteria.prefix.clone().unwrap_or_default(),
            field: FilterField::User,
        }
    }

    fn active_mut(&mut self) -> &mut String {
        match self.field {
            FilterField::User => &mut self.user,
            FilterField::Prefix => &mut self.prefix,
        }
    }

    pub fn push(&mut self, c: char) {
        self.active_mut().push(c);
    }

    pub fn backspace(&mut self) {
        self.active_mut().pop();
    }

    pub fn clear_field(&mut self) {
        self.active_mut().clear();
    }

    #[must_use]
    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria::new(Some(&self.user), Some(&self.prefix))
    }
}

/// Modal overlay state - only one modal can be active at a time.
///
/// NOTE: the filter draft is EPHEMERAL. The applied criteria live on `App`.
#[derive(Debug, Default)]
pub enum ModalState {
    #[default]
    None,
    Help,
    /// Detail of one job; `detail` stays `None` until the first fetch lands
    JobDetail {
        job_id: String,
        detail: Option<JobDetail>,
        error: Option<String>,
    },
    /// Waiting for `y`/Enter before killing `job_id`
    KillConfirm {
        job_id: String,
        user: String,
        name: String,
    },
    FilterDialog(FilterDraft),
}

impl ModalState {
    /// Check if any modal is currently active
    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self, ModalState::None)
    }

    #[must_use]
    pub fn is_editing_filter(&self) -> bool {
        matches!(self, ModalState::FilterDialog(_))
    }

    #[must_use]
    pub fn is_confirming_kill(&self) -> bool {
        matches!(self, ModalState::KillConfirm { .. })
    }

    /// Job id of the open detail modal
    #[must_use]
    pub fn detail_job_id(&self) -> Option<&str> {
        match self {
            ModalState::JobDetail { job_id, .. } => Some(job_id),
            _ => None,
        }
    }

    #[must_use]
    pub fn filter_draft_mut(&mut self) -> Option<&mut FilterDraft> {
        match self {
            ModalState::FilterDialog(draft) => Some(draft),
            _ => None,
        }
    }
}

// ============================================================================
// Feedback State
// ============================================================================

/// Unified feedback state for errors, warnings, and transient notices
#[derive(Debug)]
pub struct FeedbackState {
    last_error: Option<(String, Instant)>,
    error_display_duration: Duration,
    pub config_warnings: Vec<String>,
    notice: Option<Notice>,
}

impl FeedbackState {
    /// Create a new FeedbackState with config warnings
    pub fn new(config_warnings: Vec<String>) -> Self {
        Self {
            last_error: None,
            error_display_duration: Duration::from_secs(5),
            config_warnings,
            notice: None,
        }
    }

    /// Set an error message to display
    pub fn set_error(&mut self, msg: String) {
        self.last_error = Some((msg, Instant::now()));
    }

    #[must_use]
    pub fn should_show_error(&self) -> bool {
        self.last_error
            .as_ref()
            .is_some_and(|(_, t)| t.elapsed() < self.error_display_duration)
    }

    /// Get the current error message if it should be shown
    #[must_use]
    pub fn current_error(&self) -> Option<&str> {
        if self.should_show_error() {
            self.last_error.as_ref().map(|(msg, _)| msg.as_str())
        } else {
            None
        }
    }

    pub fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    /// Get the current notice if still visible
    #[must_use]
    pub fn current_notice(&self) -> Option<&Notice> {
        self.notice.as_ref().filter(|n| n.is_visible())
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }
}
