//! The interactive dashboard
//!
//! Nodes and jobs sit side by side; Edit mode resizes or hides the panes.
//! Snapshots come from the refresh scheduler through the store, and a failed
//! refresh leaves the previous data on screen marked stale.

pub mod app;
pub mod clipboard;
pub mod event;
pub mod runtime;
pub mod theme;
pub mod ui;

use std::io::{self, IsTerminal, stdout};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;

use crate::models::SmonConfig;
use crate::scheduler::{RefreshScheduler, RefreshTimings};
use crate::slurm::SlurmBackend;
use crate::store::SnapshotStore;
use crate::tui::app::App;
use crate::tui::clipboard::{Clipboard, DisabledClipboard, TerminalClipboard};
use crate::tui::runtime::{TuiRuntime, create_channels, run_event_loop, spawn_input_task};

/// Whether stdout can host a full-screen dashboard.
#[derive(Debug)]
pub struct TerminalCapabilities {
    pub is_tty: bool,
    pub term_type: String,
    pub supports_alternate_screen: bool,
}

impl TerminalCapabilities {
    pub fn detect() -> Self {
        Self::from_parts(stdout().is_terminal(), std::env::var("TERM").unwrap_or_default())
    }

    fn from_parts(is_tty: bool, term_type: String) -> Self {
        let supports_alternate_screen = !matches!(term_type.as_str(), "dumb" | "" | "unknown");
        Self {
            is_tty,
            term_type,
            supports_alternate_screen,
        }
    }

    pub fn is_suitable(&self) -> bool {
        self.is_tty && self.supports_alternate_screen
    }

    /// Explanation shown when [`Self::is_suitable`] is false.
    pub fn error_message(&self) -> String {
        if !self.is_tty {
            "The dashboard requires an interactive terminal (stdout is not a TTY).\n\
             Hint: Use one-shot commands like 'smon jobs' or 'smon nodes' instead."
                .to_string()
        } else if !self.supports_alternate_screen {
            format!(
                "Terminal type '{}' may not support the dashboard.\n\
                 Hint: Set TERM to a supported value (e.g., xterm-256color) or use one-shot commands.",
                if self.term_type.is_empty() {
                    "(unset)"
                } else {
                    &self.term_type
                }
            )
        } else {
            "Unknown terminal capability issue.".to_string()
        }
    }
}

/// Run the dashboard against `backend` until the user quits.
pub async fn run_tui<B: SlurmBackend>(
    backend: Arc<B>,
    config: SmonConfig,
    config_warnings: Vec<String>,
) -> Result<()> {
    let capabilities = TerminalCapabilities::detect();
    if !capabilities.is_suitable() {
        bail!("{}", capabilities.error_message());
    }

    let store = SnapshotStore::new();
    let (input_tx, input_rx, data_tx, data_rx) = create_channels();
    let mut runtime = TuiRuntime::new();

    runtime.track(spawn_input_task(input_tx, runtime.cancel_token()));
    let timings = RefreshTimings {
        interval: config.refresh.interval(),
        detail_interval: config.refresh.detail_interval(),
    };
    let (scheduler, scheduler_task) =
        RefreshScheduler::new(backend, store.clone(), timings, data_tx).spawn(runtime.cancel_token());
    runtime.track(scheduler_task);

    let clipboard: Box<dyn Clipboard> = if config.behavior.copy_to_clipboard {
        Box::new(TerminalClipboard::new())
    } else {
        Box::new(DisabledClipboard)
    };
    let mut app = App::new(config, config_warnings, scheduler, clipboard);

    let mut terminal = setup_terminal()?;
    match terminal.size() {
        Ok(size) => app.handle_resize(size.width, size.height),
        Err(e) => {
            runtime.shutdown().await;
            restore_terminal(&mut terminal)?;
            return Err(e).context("failed to read terminal size");
        }
    }

    let result = run_event_loop(app, input_rx, data_rx, store.subscribe(), |app| {
        terminal.draw(|frame| ui::render(app, frame))?;
        Ok(())
    })
    .await;

    runtime.shutdown().await;

    // Restore even when the loop failed, then report its error
    restore_terminal(&mut terminal)?;

    result
}

/// Raw mode, alternate screen, mouse capture.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_capabilities() {
        assert!(TerminalCapabilities::from_parts(true, "xterm-256color".into()).is_suitable());
        assert!(!TerminalCapabilities::from_parts(false, "xterm".into()).is_suitable());

        let dumb = TerminalCapabilities::from_parts(true, "dumb".into());
        assert!(!dumb.is_suitable());
        assert!(dumb.error_message().contains("'dumb'"));
        assert!(
            TerminalCapabilities::from_parts(true, String::new())
                .error_message()
                .contains("(unset)")
        );
    }
}
