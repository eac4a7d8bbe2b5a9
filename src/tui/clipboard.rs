//! Clipboard support for yanking job ids
//!
//! Two routes are tried on every copy: an OSC 52 escape written to the
//! terminal (works over SSH, wrapped for tmux/screen passthrough) and the
//! local system clipboard through `arboard`. A copy succeeds when either
//! route does.

use std::io::Write;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

/// Errors raised while copying.
#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("terminal write failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("clipboard error: {0}")]
    Local(#[from] arboard::Error),
    #[error("no clipboard available")]
    Unavailable,
}

/// Which routes accepted the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CopyReport {
    pub osc52: bool,
    pub local: bool,
}

/// Clipboard abstraction for yank support.
pub trait Clipboard: Send {
    fn set(&mut self, contents: &str) -> Result<CopyReport, ClipboardError>;
}

/// Whether the terminal sits inside tmux or screen, which swallow bare OSC 52.
#[must_use]
pub fn in_multiplexer(term: Option<&str>, tmux: Option<&str>) -> bool {
    tmux.is_some_and(|t| !t.is_empty())
        || term.is_some_and(|t| t.contains("screen") || t.contains("tmux"))
}

/// OSC 52 "set clipboard" sequence for `text`, wrapped in a DCS passthrough
/// when `multiplexer` is set.
#[must_use]
pub fn osc52_sequence(text: &str, multiplexer: bool) -> String {
    let osc = format!("\x1b]52;c;{}\x07", STANDARD.encode(text));
    if multiplexer {
        format!("\x1bPtmux;\x1b{osc}\x1b\\")
    } else {
        osc
    }
}

/// OSC 52 on stdout plus the local system clipboard.
///
/// The `arboard` handle is kept alive after the first copy: on X11 the
/// selection is lost when its owner goes away.
#[derive(Default)]
pub struct TerminalClipboard {
    local: Option<arboard::Clipboard>,
    multiplexer: bool,
}

impl TerminalClipboard {
    pub fn new() -> Self {
        let term = std::env::var("TERM").ok();
        let tmux = std::env::var("TMUX").ok();
        Self {
            local: None,
            multiplexer: in_multiplexer(term.as_deref(), tmux.as_deref()),
        }
    }

    fn write_osc52(&self, contents: &str) -> Result<(), ClipboardError> {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(osc52_sequence(contents, self.multiplexer).as_bytes())?;
        stdout.flush()?;
        Ok(())
    }

    fn set_local(&mut self, contents: &str) -> Result<(), ClipboardError> {
        if self.local.is_none() {
            self.local = Some(arboard::Clipboard::new()?);
        }
        let Some(clipboard) = self.local.as_mut() else {
            return Err(ClipboardError::Unavailable);
        };
        clipboard.set_text(contents.to_string())?;
        Ok(())
    }
}

impl Clipboard for TerminalClipboard {
    fn set(&mut self, contents: &str) -> Result<CopyReport, ClipboardError> {
        let osc52 = self
            .write_osc52(contents)
            .inspect_err(|e| tracing::debug!(error = %e, "OSC 52 copy failed"))
            .is_ok();
        let local = self
            .set_local(contents)
            .inspect_err(|e| tracing::debug!(error = %e, "local clipboard copy failed"))
            .is_ok();

        if osc52 || local {
            Ok(CopyReport { osc52, local })
        } else {
            Err(ClipboardError::Unavailable)
        }
    }
}

/// Clipboard used when copying is switched off in the config.
#[derive(Debug, Default)]
pub struct DisabledClipboard;

impl Clipboard for DisabledClipboard {
    fn set(&mut self, _contents: &str) -> Result<CopyReport, ClipboardError> {
        Err(ClipboardError::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_osc52_plain() {
        assert_eq!(osc52_sequence("451950", false), "\x1b]52;c;NDUxOTUw\x07");
    }

    #[test]
    fn test_osc52_tmux_passthrough() {
        let seq = osc52_sequence("451950", true);
        assert!(seq.starts_with("\x1bPtmux;\x1b\x1b]52;c;"));
        assert!(seq.ends_with("\x07\x1b\\"));
    }

    #[test]
    fn test_multiplexer_detection() {
        assert!(in_multiplexer(Some("screen-256color"), None));
        assert!(in_multiplexer(Some("xterm"), Some("/tmp/tmux-1000/default,1,0")));
        assert!(!in_multiplexer(Some("xterm-256color"), None));
        assert!(!in_multiplexer(None, Some("")));
    }

    #[test]
    fn test_disabled_clipboard_fails() {
        assert!(matches!(
            DisabledClipboard.set("1"),
            Err(ClipboardError::Unavailable)
        ));
    }
}
