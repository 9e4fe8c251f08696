//! Status notice or active prompt, sharing one line above the help bar.

use ratatui::{prelude::*, widgets::Paragraph, Frame};

use crate::structs::Status;
use crate::ui::colors;

pub fn draw_status(f: &mut Frame, area: Rect, status: Option<&Status>) {
    let Some(status) = status else { return };
    let style = Style::default().fg(colors::severity_color(status.severity));
    f.render_widget(Paragraph::new(Span::styled(status.message.as_str(), style)), area);
}

/// Draws `prefix` and `text` and parks the cursor after it.
pub fn draw_prompt(f: &mut Frame, area: Rect, prefix: &str, text: &str) {
    let line = Line::from(vec![
        Span::styled(prefix, Style::default().fg(colors::DEBUG).add_modifier(Modifier::BOLD)),
        Span::raw(text),
    ]);
    let width = line.width().min(area.width.saturating_sub(1) as usize) as u16;
    f.render_widget(Paragraph::new(line), area);
    f.set_cursor_position((area.x + width, area.y));
}
