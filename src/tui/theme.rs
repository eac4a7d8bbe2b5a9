//! Dashboard palettes
//!
//! Two palettes, `dark` (default) and `light`, picked with `display.theme` or
//! `SMON_THEME`. Healthy and unhealthy states never differ by hue alone: failed
//! jobs and down nodes are also brighter, and draining nodes are purple.

use ratatui::style::Color;

use crate::formatting::thresholds::{UTILIZATION_CRITICAL, UTILIZATION_HIGH};
use crate::models::{JobState, NodeState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeName {
    #[default]
    Dark,
    Light,
}

impl ThemeName {
    /// Anything other than `light` (any case) is the dark palette.
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("light") {
            ThemeName::Light
        } else {
            ThemeName::Dark
        }
    }
}

/// Colours used by every dashboard widget.
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: ThemeName,

    // Text and chrome
    pub fg: Color,
    pub dim: Color,
    pub border: Color,
    pub border_focused: Color,
    pub selected_bg: Color,
    pub selected_fg: Color,
    pub header_bg: Color,
    pub header_fg: Color,
    pub normal_mode: Color,
    pub edit_mode: Color,

    // Jobs
    pub running: Color,
    pub pending: Color,
    pub completing: Color,
    pub failed: Color,
    pub cancelled: Color,
    pub own_job: Color,

    // Nodes
    pub idle: Color,
    pub mixed: Color,
    pub allocated: Color,
    pub draining: Color,
    pub down: Color,

    // Usage bars
    pub usage_ok: Color,
    pub usage_warn: Color,
    pub usage_crit: Color,
    pub usage_track: Color,

    // Staleness, skipped rows, config warnings
    pub stale_indicator: Color,
    pub warning: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    pub fn dark() -> Self {
        let amber = Color::Rgb(255, 180, 0);
        let blue = Color::Rgb(80, 160, 255);
        let red = Color::Rgb(255, 80, 80);
        let green = Color::Rgb(0, 200, 0);
        let navy = Color::Rgb(40, 80, 120);
        Self {
            name: ThemeName::Dark,

            fg: Color::White,
            dim: Color::DarkGray,
            border: Color::DarkGray,
            border_focused: Color::Cyan,
            selected_bg: Color::Rgb(60, 60, 80),
            selected_fg: Color::White,
            header_bg: navy,
            header_fg: Color::White,
            normal_mode: navy,
            edit_mode: amber,

            running: green,
            pending: amber,
            completing: blue,
            failed: red,
            cancelled: Color::DarkGray,
            own_job: Color::Cyan,

            idle: Color::Rgb(100, 180, 100),
            mixed: Color::Rgb(255, 200, 100),
            allocated: blue,
            draining: Color::Rgb(180, 100, 180),
            down: red,

            usage_ok: green,
            usage_warn: amber,
            usage_crit: red,
            usage_track: Color::DarkGray,

            stale_indicator: Color::Rgb(255, 100, 100),
            warning: amber,
        }
    }

    /// Darker, more saturated colours that stay readable on a white background.
    pub fn light() -> Self {
        let amber = Color::Rgb(200, 120, 0);
        let blue = Color::Rgb(0, 80, 180);
        let red = Color::Rgb(200, 0, 0);
        let green = Color::Rgb(0, 140, 0);
        let grey = Color::Rgb(120, 120, 120);
        let pale_blue = Color::Rgb(180, 200, 230);
        Self {
            name: ThemeName::Light,

            fg: Color::Black,
            dim: grey,
            border: grey,
            border_focused: Color::Rgb(0, 100, 180),
            selected_bg: Color::Rgb(200, 220, 255),
            selected_fg: Color::Black,
            header_bg: pale_blue,
            header_fg: Color::Black,
            normal_mode: pale_blue,
            edit_mode: amber,

            running: green,
            pending: amber,
            completing: blue,
            failed: red,
            cancelled: Color::Rgb(100, 100, 100),
            own_job: Color::Rgb(0, 100, 180),

            idle: Color::Rgb(60, 120, 60),
            mixed: Color::Rgb(180, 140, 60),
            allocated: blue,
            draining: Color::Rgb(140, 60, 140),
            down: red,

            usage_ok: green,
            usage_warn: amber,
            usage_crit: red,
            usage_track: Color::Rgb(180, 180, 180),

            stale_indicator: red,
            warning: amber,
        }
    }

    pub fn from_name(name: &str) -> Self {
        match ThemeName::parse(name) {
            ThemeName::Dark => Self::dark(),
            ThemeName::Light => Self::light(),
        }
    }

    pub fn job_state_color(&self, state: JobState) -> Color {
        match state {
            JobState::Running => self.running,
            JobState::Pending => self.pending,
            JobState::Completing => self.completing,
            JobState::Failed => self.failed,
            JobState::Cancelled => self.cancelled,
            JobState::Unknown => self.fg,
        }
    }

    pub fn node_state_color(&self, state: NodeState) -> Color {
        match state {
            NodeState::Idle => self.idle,
            NodeState::Mixed => self.mixed,
            NodeState::Allocated => self.allocated,
            NodeState::Down => self.down,
            NodeState::Drain => self.draining,
            NodeState::Unknown => self.fg,
        }
    }

    /// Colour of a usage figure: warn from the high-utilization threshold,
    /// critical when nearly full.
    pub fn usage_color(&self, percent: f64) -> Color {
        if percent >= UTILIZATION_CRITICAL {
            self.usage_crit
        } else if percent >= UTILIZATION_HIGH {
            self.usage_warn
        } else {
            self.usage_ok
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_name_parse() {
        assert_eq!(ThemeName::parse("dark"), ThemeName::Dark);
        assert_eq!(ThemeName::parse(" LIGHT "), ThemeName::Light);
        assert_eq!(ThemeName::parse("solarized"), ThemeName::Dark);
        assert_eq!(Theme::from_name("light").name, ThemeName::Light);
    }

    #[test]
    fn test_node_and_job_state_colors() {
        let theme = Theme::dark();
        assert_eq!(theme.job_state_color(JobState::Running), theme.running);
        assert_eq!(theme.job_state_color(JobState::Unknown), theme.fg);
        assert_eq!(theme.node_state_color(NodeState::Down), theme.down);
        assert_eq!(theme.node_state_color(NodeState::Drain), theme.draining);
    }

    #[test]
    fn test_usage_color_thresholds() {
        let theme = Theme::light();
        assert_eq!(theme.usage_color(0.0), theme.usage_ok);
        assert_eq!(theme.usage_color(UTILIZATION_HIGH), theme.usage_warn);
        assert_eq!(theme.usage_color(99.9), theme.usage_crit);
    }
}
