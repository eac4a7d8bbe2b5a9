//! Event types for the TUI
//!
//! This module implements a dual-channel event architecture:
//! - InputEvent: Priority channel for user input (never dropped)
//! - DataEvent: Data channel for scheduler results (detail, kill outcomes)
//!
//! Snapshot installs do not travel over either channel; the event loop watches
//! the snapshot store directly.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent};

pub use crate::scheduler::DataEvent;

/// Input events from the terminal (priority channel - never dropped)
#[derive(Debug, Clone)]
pub enum InputEvent {
    /// Keyboard input
    Key(KeyEvent),
    /// Mouse input (wheel scrolls the focused table)
    Mouse(MouseEvent),
    /// Terminal resize
    Resize(u16, u16),
}

/// Result of processing an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    /// Continue running, UI needs redraw
    Continue,
    /// Continue running, no UI change needed
    Unchanged,
    /// Quit the application
    Quit,
}

/// Which key table applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyContext {
    /// Navigation and actions
    Normal,
    /// Layout editing
    Edit,
    /// Typing into the filter dialog
    TextEntry,
    /// Kill confirmation: `y`/`Y`/Enter confirm, everything else cancels
    Confirm,
}

/// Key action mappings for the TUI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    // Navigation
    MoveUp,
    MoveDown,
    MoveToTop,
    MoveToBottom,
    PageUp,
    PageDown,
    ScrollLeft,
    ScrollRight,
    FocusNodes,
    FocusJobs,

    // Layout (edit mode)
    ToggleMode,
    NarrowPane,
    WidenPane,
    ToggleNodesOnly,
    ToggleJobsOnly,
    ResetPanes,

    // Actions
    Select,
    Kill,
    Confirm,
    YankJobId,
    ToggleCompact,
    OpenFilter,
    ClearFilter,
    Refresh,

    // UI
    ShowHelp,
    Escape,
    Quit,

    // Filter dialog specific
    TextChar(char),
    TextBackspace,
    TextClear,
    NextField,
    PrevField,
    FilterReset,

    // Unknown/unhandled
    Unknown,
}

impl KeyAction {
    /// Map a mouse event to an action
    pub fn from_mouse_event(event: MouseEvent) -> Self {
        use crossterm::event::MouseEventKind;

        match event.kind {
            MouseEventKind::ScrollUp => KeyAction::MoveUp,
            MouseEventKind::ScrollDown => KeyAction::MoveDown,
            _ => KeyAction::Unknown,
        }
    }

    /// Map a key event to an action based on the active key table
    pub fn from_key_event(event: KeyEvent, context: KeyContext) -> Self {
        let KeyEvent {
            code, modifiers, ..
        } = event;
        let ctrl = modifiers.contains(KeyModifiers::CONTROL);
        let shift = modifiers.contains(KeyModifiers::SHIFT);

        match context {
            KeyContext::Confirm => match code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => KeyAction::Confirm,
                _ => KeyAction::Escape,
            },
            KeyContext::TextEntry => match code {
                KeyCode::Esc => KeyAction::Escape,
                KeyCode::Enter => KeyAction::Select,
                KeyCode::Tab | KeyCode::Down => KeyAction::NextField,
                KeyCode::BackTab | KeyCode::Up => KeyAction::PrevField,
                KeyCode::Backspace => KeyAction::TextBackspace,
                KeyCode::Char('u') if ctrl => KeyAction::TextClear,
                KeyCode::Char('r') if ctrl => KeyAction::FilterReset,
                KeyCode::Char('c') if ctrl => KeyAction::Quit,
                KeyCode::Char(c) if !ctrl => KeyAction::TextChar(c),
                _ => KeyAction::Unknown,
            },
            KeyContext::Normal | KeyContext::Edit => {
                // Bindings shared by both modes; Ctrl+ combinations first
                match code {
                    KeyCode::Char('c') if ctrl => return KeyAction::Quit,
                    KeyCode::Char('q') => return KeyAction::Quit,
                    KeyCode::Char('?') | KeyCode::F(1) => return KeyAction::ShowHelp,
                    KeyCode::Char('m') => return KeyAction::ToggleMode,
                    KeyCode::Char('/') => return KeyAction::OpenFilter,
                    KeyCode::Char('z') => return KeyAction::ClearFilter,
                    KeyCode::Char('r') => return KeyAction::Refresh,
                    KeyCode::Char('H') => return KeyAction::FocusNodes,
                    KeyCode::Char('L') => return KeyAction::FocusJobs,
                    KeyCode::Left if shift => return KeyAction::FocusNodes,
                    KeyCode::Right if shift => return KeyAction::FocusJobs,
                    KeyCode::Esc => return KeyAction::Escape,
                    _ => {}
                }

                if context == KeyContext::Edit {
                    return match code {
                        KeyCode::Char('h') | KeyCode::Left => KeyAction::NarrowPane,
                        KeyCode::Char('l') | KeyCode::Right => KeyAction::WidenPane,
                        KeyCode::Char('n') => KeyAction::ToggleNodesOnly,
                        KeyCode::Char('j') => KeyAction::ToggleJobsOnly,
                        KeyCode::Char('v') => KeyAction::ResetPanes,
                        _ => KeyAction::Unknown,
                    };
                }

                match code {
                    // Navigation
                    KeyCode::Char('j') | KeyCode::Down => KeyAction::MoveDown,
                    KeyCode::Char('k') | KeyCode::Up => KeyAction::MoveUp,
                    KeyCode::Char('g') | KeyCode::Home => KeyAction::MoveToTop,
                    KeyCode::Char('G') | KeyCode::End => KeyAction::MoveToBottom,
                    KeyCode::PageDown => KeyAction::PageDown,
                    KeyCode::PageUp => KeyAction::PageUp,
                    KeyCode::Char('h') | KeyCode::Left => KeyAction::ScrollLeft,
                    KeyCode::Char('l') | KeyCode::Right => KeyAction::ScrollRight,

                    // Actions
                    KeyCode::Enter => KeyAction::Select,
                    KeyCode::Char('x') | KeyCode::Delete => KeyAction::Kill,
                    KeyCode::Char('y') => KeyAction::YankJobId,
                    KeyCode::Char('c') => KeyAction::ToggleCompact,

                    _ => KeyAction::Unknown,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_key_action_quit() {
        assert_eq!(
            KeyAction::from_key_event(key(KeyCode::Char('q')), KeyContext::Normal),
            KeyAction::Quit
        );
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(KeyAction::from_key_event(ctrl_c, KeyContext::Edit), KeyAction::Quit);
        assert_eq!(KeyAction::from_key_event(ctrl_c, KeyContext::TextEntry), KeyAction::Quit);
    }

    #[test]
    fn test_key_action_navigation() {
        let event = key(KeyCode::Char('j'));
        assert_eq!(KeyAction::from_key_event(event, KeyContext::Normal), KeyAction::MoveDown);

        let event = key(KeyCode::Char('k'));
        assert_eq!(KeyAction::from_key_event(event, KeyContext::Normal), KeyAction::MoveUp);
    }

    #[test]
    fn test_edit_mode_remaps_layout_keys() {
        let cases = [
            (KeyCode::Char('j'), KeyAction::ToggleJobsOnly),
            (KeyCode::Char('n'), KeyAction::ToggleNodesOnly),
            (KeyCode::Char('h'), KeyAction::NarrowPane),
            (KeyCode::Right, KeyAction::WidenPane),
            (KeyCode::Char('v'), KeyAction::ResetPanes),
            (KeyCode::Char('x'), KeyAction::Unknown),
        ];
        for (code, expected) in cases {
            assert_eq!(KeyAction::from_key_event(key(code), KeyContext::Edit), expected);
        }
    }

    #[test]
    fn test_shift_arrows_switch_focus() {
        let event = KeyEvent::new(KeyCode::Left, KeyModifiers::SHIFT);
        assert_eq!(KeyAction::from_key_event(event, KeyContext::Normal), KeyAction::FocusNodes);
        let event = KeyEvent::new(KeyCode::Right, KeyModifiers::SHIFT);
        assert_eq!(KeyAction::from_key_event(event, KeyContext::Edit), KeyAction::FocusJobs);
        assert_eq!(
            KeyAction::from_key_event(key(KeyCode::Left), KeyContext::Normal),
            KeyAction::ScrollLeft
        );
    }

    #[test]
    fn test_confirm_only_accepts_yes_or_enter() {
        for code in [KeyCode::Char('y'), KeyCode::Char('Y'), KeyCode::Enter] {
            assert_eq!(KeyAction::from_key_event(key(code), KeyContext::Confirm), KeyAction::Confirm);
        }
        for code in [KeyCode::Char('n'), KeyCode::Char('x'), KeyCode::Esc, KeyCode::Tab] {
            assert_eq!(KeyAction::from_key_event(key(code), KeyContext::Confirm), KeyAction::Escape);
        }
    }

    #[test]
    fn test_text_entry_ctrl_keys() {
        let event = KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL);
        assert_eq!(KeyAction::from_key_event(event, KeyContext::TextEntry), KeyAction::TextClear);

        let event = KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL);
        assert_eq!(KeyAction::from_key_event(event, KeyContext::TextEntry), KeyAction::FilterReset);

        // Plain letters are text, even the ones bound in normal mode
        assert_eq!(
            KeyAction::from_key_event(key(KeyCode::Char('q')), KeyContext::TextEntry),
            KeyAction::TextChar('q')
        );
    }
}
