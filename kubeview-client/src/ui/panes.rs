//! Full-screen log and describe panes plus the container picker popup.

use std::collections::VecDeque;

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};

use super::colors;
use super::events::Scrollable;
use super::layout::centered;
use crate::structs::Fqn;

pub const NO_LOGS: &str = "No logs are available at this time…";

const PAGE: usize = 20;

/// Bounded scrollback of one log session. Sticks to the tail until scrolled up.
#[derive(Debug)]
pub struct LogPane {
    title: String,
    lines: VecDeque<String>,
    capacity: usize,
    /// Lines scrolled up from the tail.
    offset: usize,
}

impl LogPane {
    pub fn new(capacity: usize) -> Self {
        Self {
            title: String::new(),
            lines: VecDeque::new(),
            capacity: capacity.max(1),
            offset: 0,
        }
    }

    pub fn reset(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.lines.clear();
        self.offset = 0;
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn is_following(&self) -> bool {
        self.offset == 0
    }

    /// Appends a flushed batch, dropping the oldest lines past capacity.
    pub fn push_lines(&mut self, batch: Vec<String>) {
        let added = batch.len();
        self.lines.extend(batch);
        let excess = self.lines.len().saturating_sub(self.capacity);
        self.lines.drain(..excess);
        if self.offset > 0 {
            self.offset = (self.offset + added).min(self.max_offset());
        }
    }

    pub fn push_fallback(&mut self) {
        self.push_lines(vec![NO_LOGS.to_string()]);
    }

    fn max_offset(&self) -> usize {
        self.lines.len().saturating_sub(1)
    }

    pub fn draw(&self, f: &mut Frame, area: Rect) {
        let follow = if self.is_following() { " [follow]" } else { "" };
        let block = Block::new()
            .title(format!(" Logs {}{follow} ", self.title))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(colors::HEADER));
        let visible = block.inner(area).height as usize;

        let end = self.lines.len().saturating_sub(self.offset);
        let start = end.saturating_sub(visible);
        let text: Vec<Line> = self
            .lines
            .range(start..end)
            .map(|l| Line::raw(l.as_str()))
            .collect();
        f.render_widget(Paragraph::new(text).block(block), area);
    }
}

impl Scrollable for LogPane {
    fn scroll_down(&mut self) {
        self.offset = self.offset.saturating_sub(1);
    }
    fn scroll_up(&mut self) {
        self.offset = (self.offset + 1).min(self.max_offset());
    }
    fn scroll_page_down(&mut self) {
        self.offset = self.offset.saturating_sub(PAGE);
    }
    fn scroll_page_up(&mut self) {
        self.offset = (self.offset + PAGE).min(self.max_offset());
    }
    fn scroll_top(&mut self) {
        self.offset = self.max_offset();
    }
    fn scroll_bottom(&mut self) {
        self.offset = 0;
    }
}

/// Read-only text such as a manifest.
#[derive(Debug, Default)]
pub struct TextPane {
    title: String,
    text: String,
    line_count: usize,
    scroll: usize,
}

impl TextPane {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            title: title.into(),
            line_count: text.lines().count(),
            text,
            scroll: 0,
        }
    }

    pub fn draw(&self, f: &mut Frame, area: Rect) {
        let block = Block::new()
            .title(format!(" {} ", self.title))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(colors::HEADER));
        let scroll = self.scroll.min(u16::MAX as usize) as u16;
        f.render_widget(
            Paragraph::new(self.text.as_str())
                .block(block)
                .wrap(Wrap { trim: false })
                .scroll((scroll, 0)),
            area,
        );
    }

    fn last(&self) -> usize {
        self.line_count.saturating_sub(1)
    }
}

impl Scrollable for TextPane {
    fn scroll_down(&mut self) {
        self.scroll = (self.scroll + 1).min(self.last());
    }
    fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }
    fn scroll_page_down(&mut self) {
        self.scroll = (self.scroll + PAGE).min(self.last());
    }
    fn scroll_page_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(PAGE);
    }
    fn scroll_top(&mut self) {
        self.scroll = 0;
    }
    fn scroll_bottom(&mut self) {
        self.scroll = self.last();
    }
}

/// Container choice shown before logs of a multi-container pod.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerPicker {
    pub fqn: Fqn,
    pub previous: bool,
    pub containers: Vec<String>,
}

impl ContainerPicker {
    /// Container bound to shortcut `key`: `a` is the first, `b` the second.
    pub fn choice(&self, key: char) -> Option<&str> {
        let idx = (key as u32).checked_sub('a' as u32)? as usize;
        self.containers.get(idx).map(String::as_str)
    }

    pub fn draw(&self, f: &mut Frame, area: Rect) {
        let popup = centered(area, 50, 40);
        let items: Vec<ListItem> = self
            .containers
            .iter()
            .zip('a'..='z')
            .map(|(name, key)| {
                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("{key} "),
                        Style::default().fg(colors::DEBUG).add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(name.as_str()),
                ]))
            })
            .collect();
        let block = Block::new()
            .title(format!(" Containers of {} ", self.fqn))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(colors::PENDING));
        f.render_widget(Clear, popup);
        f.render_widget(List::new(items).block(block), popup);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(range: std::ops::Range<usize>) -> Vec<String> {
        range.map(|i| format!("line {i}")).collect()
    }

    #[test]
    fn test_log_pane_is_bounded() {
        let mut pane = LogPane::new(5);
        pane.push_lines(lines(0..3));
        pane.push_lines(lines(3..8));
        assert_eq!(pane.len(), 5);
        assert_eq!(pane.lines().next(), Some("line 3"));
    }

    #[test]
    fn test_scrolled_pane_keeps_its_place() {
        let mut pane = LogPane::new(100);
        pane.push_lines(lines(0..10));
        pane.scroll_up();
        pane.scroll_up();
        assert!(!pane.is_following());
        pane.push_lines(lines(10..13));
        assert_eq!(pane.offset, 5);
        pane.scroll_bottom();
        assert!(pane.is_following());
    }

    #[test]
    fn test_fallback_line() {
        let mut pane = LogPane::new(10);
        pane.push_fallback();
        assert_eq!(pane.lines().collect::<Vec<_>>(), vec![NO_LOGS]);
    }

    #[test]
    fn test_picker_choice() {
        let picker = ContainerPicker {
            fqn: Fqn::from_key("default/web"),
            previous: false,
            containers: vec!["app".into(), "sidecar".into()],
        };
        assert_eq!(picker.choice('a'), Some("app"));
        assert_eq!(picker.choice('b'), Some("sidecar"));
        assert_eq!(picker.choice('c'), None);
        assert_eq!(picker.choice('1'), None);
    }

    #[test]
    fn test_text_pane_scroll_clamps() {
        let mut pane = TextPane::new("yaml", "a\nb\nc");
        pane.scroll_page_down();
        assert_eq!(pane.scroll, 2);
        pane.scroll_up();
        pane.scroll_top();
        assert_eq!(pane.scroll, 0);
    }
}
