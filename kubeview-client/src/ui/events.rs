//! Key handling shared by panes and prompts.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Types that scroll line by line or by page.
pub trait Scrollable {
    fn scroll_down(&mut self);
    fn scroll_up(&mut self);
    fn scroll_page_down(&mut self);
    fn scroll_page_up(&mut self);
    fn scroll_top(&mut self);
    fn scroll_bottom(&mut self);
}

/// Handles scroll navigation keys for any Scrollable type.
///
/// Returns `true` if the key was handled, `false` otherwise.
pub fn handle_scroll_key<S: Scrollable>(state: &mut S, key: KeyCode) -> bool {
    match key {
        KeyCode::Down | KeyCode::Char('j') => state.scroll_down(),
        KeyCode::Up | KeyCode::Char('k') => state.scroll_up(),
        KeyCode::PageDown => state.scroll_page_down(),
        KeyCode::PageUp => state.scroll_page_up(),
        KeyCode::Char('g') | KeyCode::Home => state.scroll_top(),
        KeyCode::Char('G') | KeyCode::End => state.scroll_bottom(),
        _ => return false,
    }
    true
}

pub fn is_ctrl_c(key: &KeyEvent) -> bool {
    key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
}

/// Outcome of feeding a key to a [`PromptInput`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptEdit {
    /// Buffer changed; the new text.
    Changed(String),
    Submit(String),
    Cancel,
    Ignored,
}

/// Single-line text input of the filter and command prompts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptInput {
    buffer: String,
}

impl PromptInput {
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            buffer: text.into(),
        }
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn apply(&mut self, key: &KeyEvent) -> PromptEdit {
        match key.code {
            KeyCode::Enter => PromptEdit::Submit(self.buffer.clone()),
            KeyCode::Esc => PromptEdit::Cancel,
            KeyCode::Backspace => {
                if self.buffer.pop().is_some() {
                    PromptEdit::Changed(self.buffer.clone())
                } else {
                    PromptEdit::Ignored
                }
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.buffer.clear();
                PromptEdit::Changed(String::new())
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.buffer.push(c);
                PromptEdit::Changed(self.buffer.clone())
            }
            _ => PromptEdit::Ignored,
        }
    }
}
