//! Layout utilities for the table and the frame around it.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    text::Line,
};

use crate::reconcile::RenderedTable;
use crate::utils::human_age;

/// Gap between table columns.
pub const COL_GAP: u16 = 2;

/// Widest a single column may grow.
pub const MAX_COL_WIDTH: u16 = 60;

/// Extra room on the sorted column for its indicator.
pub const SORT_PAD: u16 = 2;

/// Frame regions: header line, body, prompt or status line, help bar.
pub struct FrameAreas {
    pub header: Rect,
    pub body: Rect,
    pub status: Rect,
    pub help: Rect,
}

pub fn frame_split(area: Rect) -> FrameAreas {
    let [header, body, status, help] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(area);
    FrameAreas {
        header,
        body,
        status,
        help,
    }
}

/// Text a cell displays; AGE values are shortened.
pub fn display_value<'a>(header: &str, value: &'a str) -> std::borrow::Cow<'a, str> {
    if header == "AGE" {
        human_age(value).into()
    } else {
        value.into()
    }
}

/// Widths from header and content, clamped to `MAX_COL_WIDTH`.
pub fn column_widths(table: &RenderedTable) -> Vec<u16> {
    table
        .header
        .iter()
        .enumerate()
        .map(|(col, head)| {
            let content = table
                .rows
                .iter()
                .map(|(_, ev)| text_width(&display_value(head, ev.field(col))))
                .max()
                .unwrap_or(0);
            let pad = if col == table.sort.index { SORT_PAD } else { 0 };
            (text_width(head) + pad).max(content).clamp(1, MAX_COL_WIDTH)
        })
        .collect()
}

fn text_width(s: &str) -> u16 {
    Line::from(s).width().min(u16::MAX as usize) as u16
}

/// Centered rectangle of `percent_x` by `percent_y` inside `area`.
pub fn centered(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let [_, mid, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(area);
    let [_, center, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(mid);
    center
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::{NamespaceScope, RowEvent, SortColumn};
    use std::collections::HashMap;

    fn table() -> RenderedTable {
        let row = |fields: &[&str]| RowEvent::new(fields.iter().map(|s| s.to_string()).collect());
        RenderedTable {
            header: vec!["NAME".into(), "AGE".into()],
            rows: vec![
                ("a".into(), row(&["very-long-name-here", "3h25m7s"])),
                ("b".into(), row(&["x", "5s"])),
            ],
            namespace: NamespaceScope::All,
            num_cols: HashMap::new(),
            sort: SortColumn::new(1, 2),
            filter: None,
            total: 2,
            generation: 1,
        }
    }

    #[test]
    fn test_column_widths_use_human_age_and_sort_pad() {
        // "3h25m" is 5 wide, the header "AGE" plus the sort pad is 5 as well.
        assert_eq!(column_widths(&table()), vec![19, 5]);
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value("AGE", "3h25m7s"), "3h25m");
        assert_eq!(display_value("NAME", "3h25m7s"), "3h25m7s");
    }
}
