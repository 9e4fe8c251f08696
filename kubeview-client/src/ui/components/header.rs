//! Top line: context, namespace and view.

use ratatui::{
    prelude::*,
    style::{palette::tailwind, Modifier, Style},
    widgets::Paragraph,
    Frame,
};

use crate::structs::NamespaceScope;
use crate::ui::colors;

pub fn draw_header(f: &mut Frame, area: Rect, context: &str, scope: &NamespaceScope, view: &str) {
    let label = Style::default().fg(tailwind::GRAY.c400);
    let value = Style::default()
        .fg(colors::HEADER)
        .add_modifier(Modifier::BOLD);

    let line = Line::from(vec![
        Span::styled("context: ", label),
        Span::styled(context.to_string(), value),
        Span::raw("  "),
        Span::styled("namespace: ", label),
        Span::styled(scope.to_string(), value),
        Span::raw("  "),
        Span::styled("view: ", label),
        Span::styled(view.to_string(), value),
    ]);
    f.render_widget(Paragraph::new(line), area);
}
