//! Table-mode key bindings.
//!
//! Built once at startup and never mutated; prompts and panes read raw keys.

use std::collections::HashMap;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::sort::SortCommand;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    Filter,
    Prompt,
    ToggleAllNamespaces,
    Sort(SortCommand),
    Logs { previous: bool },
    Describe,
    Refresh,
    Up,
    Down,
    PageUp,
    PageDown,
    Top,
    Bottom,
}

#[derive(Debug, Clone, Copy)]
struct Binding {
    command: Command,
    label: &'static str,
    /// `None` keeps the binding out of the help bar.
    hint: Option<&'static str>,
}

#[derive(Debug, Clone)]
pub struct KeyMap {
    bindings: HashMap<(KeyCode, KeyModifiers), Binding>,
}

impl KeyMap {
    pub fn default_bindings() -> Self {
        use Command::*;
        use KeyCode::Char;

        let none = KeyModifiers::NONE;
        let table: &[(KeyCode, KeyModifiers, Command, &str, Option<&str>)] = &[
            (Char('q'), none, Quit, "q", Some("quit")),
            (Char('c'), KeyModifiers::CONTROL, Quit, "ctrl-c", None),
            (Char('/'), none, Filter, "/", Some("filter")),
            (Char(':'), none, Prompt, ":", Some("command")),
            (Char('a'), none, ToggleAllNamespaces, "a", Some("all ns")),
            (Char('N'), none, Sort(SortCommand::Name), "N", Some("sort name")),
            (Char('A'), none, Sort(SortCommand::Age), "A", Some("sort age")),
            (Char('S'), none, Sort(SortCommand::First), "S", Some("sort first")),
            (Char('I'), none, Sort(SortCommand::Invert), "I", Some("invert")),
            (Char('<'), none, Sort(SortCommand::Left), "<", Some("sort left")),
            (Char('>'), none, Sort(SortCommand::Right), ">", Some("sort right")),
            (Char('l'), none, Logs { previous: false }, "l", Some("logs")),
            (Char('p'), none, Logs { previous: true }, "p", Some("previous logs")),
            (Char('y'), none, Describe, "y", Some("yaml")),
            (Char('r'), KeyModifiers::CONTROL, Refresh, "ctrl-r", Some("refresh")),
            (Char('j'), none, Down, "j", None),
            (KeyCode::Down, none, Down, "down", None),
            (Char('k'), none, Up, "k", None),
            (KeyCode::Up, none, Up, "up", None),
            (KeyCode::PageDown, none, PageDown, "pgdn", None),
            (KeyCode::PageUp, none, PageUp, "pgup", None),
            (Char('g'), none, Top, "g", None),
            (Char('G'), none, Bottom, "G", None),
        ];

        let bindings = table
            .iter()
            .map(|&(code, mods, command, label, hint)| {
                ((code, mods), Binding { command, label, hint })
            })
            .collect();
        Self { bindings }
    }

    pub fn lookup(&self, key: &KeyEvent) -> Option<Command> {
        self.bindings.get(&normalize(key)).map(|b| b.command)
    }

    /// `(key, description)` pairs for the help bar, sorted by key label.
    pub fn hints(&self) -> Vec<(&'static str, &'static str)> {
        let mut hints: Vec<_> = self
            .bindings
            .values()
            .filter_map(|b| b.hint.map(|h| (b.label, h)))
            .collect();
        hints.sort_unstable();
        hints
    }
}

/// Terminals disagree on whether `N` carries SHIFT; characters ignore it.
fn normalize(key: &KeyEvent) -> (KeyCode, KeyModifiers) {
    match key.code {
        KeyCode::Char(_) => (key.code, key.modifiers.difference(KeyModifiers::SHIFT)),
        _ => (key.code, key.modifiers),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, mods: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, mods)
    }

    #[test]
    fn test_lookup_ignores_shift_on_chars() {
        let map = KeyMap::default_bindings();
        assert_eq!(
            map.lookup(&key(KeyCode::Char('N'), KeyModifiers::SHIFT)),
            Some(Command::Sort(SortCommand::Name))
        );
        assert_eq!(
            map.lookup(&key(KeyCode::Char('N'), KeyModifiers::NONE)),
            Some(Command::Sort(SortCommand::Name))
        );
        assert_eq!(map.lookup(&key(KeyCode::Char('z'), KeyModifiers::NONE)), None);
    }

    #[test]
    fn test_ctrl_bindings() {
        let map = KeyMap::default_bindings();
        assert_eq!(
            map.lookup(&key(KeyCode::Char('r'), KeyModifiers::CONTROL)),
            Some(Command::Refresh)
        );
        assert_eq!(map.lookup(&key(KeyCode::Char('r'), KeyModifiers::NONE)), None);
    }

    #[test]
    fn test_hints_sorted_and_visible_only() {
        let hints = KeyMap::default_bindings().hints();
        let labels: Vec<&str> = hints.iter().map(|(k, _)| *k).collect();
        let mut sorted = labels.clone();
        sorted.sort_unstable();
        assert_eq!(labels, sorted);
        assert!(labels.contains(&"ctrl-r"));
        assert!(!labels.contains(&"j"));
    }
}
