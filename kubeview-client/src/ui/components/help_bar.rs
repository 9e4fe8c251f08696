//! Inline context-aware help bar component.

use ratatui::{
    prelude::*,
    style::{palette::tailwind, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Renders `key:desc │ key:desc │ ...`.
pub fn draw_help_bar(f: &mut Frame, area: Rect, hints: &[(&str, &str)]) {
    f.render_widget(
        Paragraph::new(help_line(hints)).alignment(Alignment::Left),
        area,
    );
}

fn help_line<'a>(hints: &[(&'a str, &'a str)]) -> Line<'a> {
    let mut spans = Vec::with_capacity(hints.len() * 3);
    let separator = Span::styled(" │ ", Style::default().fg(tailwind::GRAY.c600));

    for (i, (key, desc)) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(separator.clone());
        }
        spans.push(Span::styled(
            *key,
            Style::default()
                .fg(tailwind::YELLOW.c400)
                .add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::styled(
            format!(":{desc}"),
            Style::default().fg(tailwind::GRAY.c400),
        ));
    }
    Line::from(spans)
}

/// Hints of the log pane.
pub fn log_hints() -> Vec<(&'static str, &'static str)> {
    vec![("G", "follow"), ("esc", "back"), ("j/k", "scroll")]
}

/// Hints of the describe pane.
pub fn describe_hints() -> Vec<(&'static str, &'static str)> {
    vec![("esc", "back"), ("j/k", "scroll")]
}
