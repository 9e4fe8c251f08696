//! The resource table: title chrome, sorted header, change highlighting.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Row as TableRow, Table, TableState},
};

use super::colors;
use super::events::Scrollable;
use super::layout::{column_widths, display_value, COL_GAP};
use crate::reconcile::RenderedTable;
use crate::structs::{Action, NamespaceScope};

const PAGE: usize = 20;

/// `Pods(default)[12]`, `Namespaces[4]`, with `</filter>` when one is active.
pub fn table_title(kind: &str, table: &RenderedTable) -> String {
    let mut title = match &table.namespace {
        NamespaceScope::Cluster => format!("{kind}[{}]", table.rows.len()),
        ns => format!("{kind}({ns})[{}]", table.rows.len()),
    };
    if let Some(filter) = &table.filter {
        title.push_str(&format!(" </{filter}>"));
    }
    title
}

/// Header cell text with the sort direction marker.
pub fn header_label(table: &RenderedTable, col: usize) -> String {
    let name = table.header.get(col).map(String::as_str).unwrap_or("");
    if col == table.sort.index {
        let arrow = if table.sort.ascending { '↑' } else { '↓' };
        format!("{name}{arrow}")
    } else {
        name.to_string()
    }
}

fn right_aligned(table: &RenderedTable, col: usize) -> bool {
    if table.is_numeric(col) {
        return true;
    }
    let h = table
        .header
        .get(col)
        .map(|h| h.trim_start_matches('%').to_ascii_uppercase())
        .unwrap_or_default();
    h.starts_with("CPU") || h.starts_with("MEM")
}

/// Latest snapshot plus the selection, which follows its row key across updates.
#[derive(Debug, Default)]
pub struct TableView {
    table: Option<RenderedTable>,
    state: TableState,
    selected_key: Option<String>,
}

impl TableView {
    pub fn table(&self) -> Option<&RenderedTable> {
        self.table.as_ref()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Replaces the snapshot wholesale.
    pub fn set(&mut self, table: RenderedTable) {
        let idx = self
            .selected_key
            .as_deref()
            .and_then(|key| table.rows.iter().position(|(k, _)| k == key))
            .or_else(|| self.state.selected().map(|i| i.min(table.rows.len().saturating_sub(1))));
        self.table = Some(table);
        self.select(idx.or(Some(0)));
    }

    pub fn selected_key(&self) -> Option<&str> {
        self.selected_key.as_deref()
    }

    fn len(&self) -> usize {
        self.table.as_ref().map_or(0, |t| t.rows.len())
    }

    fn select(&mut self, idx: Option<usize>) {
        let len = self.len();
        let idx = idx.filter(|_| len > 0).map(|i| i.min(len - 1));
        self.state.select(idx);
        self.selected_key = idx
            .and_then(|i| self.table.as_ref()?.rows.get(i))
            .map(|(k, _)| k.clone());
    }

    fn step(&mut self, delta: isize) {
        let current = self.state.selected().unwrap_or(0) as isize;
        self.select(Some((current + delta).max(0) as usize));
    }

    pub fn draw(&mut self, f: &mut Frame, area: Rect, kind: &str) {
        let Some(table) = &self.table else {
            let block = Block::new()
                .title(format!(" {kind} "))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(colors::GRAY));
            f.render_widget(block, area);
            return;
        };

        let header_style = Style::default().fg(colors::HEADER).add_modifier(Modifier::BOLD);
        let header = TableRow::new((0..table.header.len()).map(|col| {
            let label = header_label(table, col);
            let line = if right_aligned(table, col) {
                Line::from(label).alignment(Alignment::Right)
            } else {
                Line::from(label)
            };
            Cell::from(line)
        }))
        .style(header_style);

        let rows = table.rows.iter().map(|(_, ev)| {
            let cells = table.header.iter().enumerate().map(|(col, head)| {
                let value = display_value(head, ev.field(col)).into_owned();
                let mut style = if head == "STATUS" {
                    colors::status_style(&value)
                } else {
                    Style::default()
                };
                if ev.action == Action::Modified && ev.is_delta(col) {
                    style = colors::delta_style();
                }
                let line = Line::from(value);
                let line = if right_aligned(table, col) {
                    line.alignment(Alignment::Right)
                } else {
                    line
                };
                Cell::from(line).style(style)
            });
            TableRow::new(cells).style(colors::action_style(ev.action))
        });

        let widths: Vec<Constraint> = column_widths(table)
            .into_iter()
            .map(Constraint::Length)
            .collect();
        let block = Block::new()
            .title(format!(" {} ", table_title(kind, table)))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(colors::HEADER));

        let widget = Table::new(rows, widths)
            .header(header)
            .column_spacing(COL_GAP)
            .block(block)
            .row_highlight_style(Style::default().bg(colors::GRAY_BG).add_modifier(Modifier::BOLD));
        f.render_stateful_widget(widget, area, &mut self.state);
    }
}

impl Scrollable for TableView {
    fn scroll_down(&mut self) {
        self.step(1);
    }
    fn scroll_up(&mut self) {
        self.step(-1);
    }
    fn scroll_page_down(&mut self) {
        self.step(PAGE as isize);
    }
    fn scroll_page_up(&mut self) {
        self.step(-(PAGE as isize));
    }
    fn scroll_top(&mut self) {
        self.select(Some(0));
    }
    fn scroll_bottom(&mut self) {
        self.select(Some(self.len().saturating_sub(1)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::{RowEvent, SortColumn};
    use std::collections::HashMap;

    fn table(keys: &[&str], namespace: NamespaceScope) -> RenderedTable {
        RenderedTable {
            header: vec!["NAME".into(), "RESTARTS".into()],
            rows: keys
                .iter()
                .map(|k| (k.to_string(), RowEvent::new(vec![k.to_string(), "0".into()])))
                .collect(),
            namespace,
            num_cols: HashMap::from([("RESTARTS".to_string(), true)]),
            sort: SortColumn::new(0, 2),
            filter: None,
            total: keys.len(),
            generation: 1,
        }
    }

    #[test]
    fn test_title() {
        let mut t = table(&["a", "b"], NamespaceScope::Named("default".into()));
        assert_eq!(table_title("Pods", &t), "Pods(default)[2]");
        t.filter = Some("-l app=web".into());
        assert_eq!(table_title("Pods", &t), "Pods(default)[2] </-l app=web>");
        let t = table(&["kube-system"], NamespaceScope::Cluster);
        assert_eq!(table_title("Namespaces", &t), "Namespaces[1]");
        let t = table(&[], NamespaceScope::All);
        assert_eq!(table_title("Pods", &t), "Pods(all)[0]");
    }

    #[test]
    fn test_header_marks_sort_column() {
        let mut t = table(&["a"], NamespaceScope::All);
        assert_eq!(header_label(&t, 0), "NAME↑");
        assert_eq!(header_label(&t, 1), "RESTARTS");
        t.sort.ascending = false;
        assert_eq!(header_label(&t, 0), "NAME↓");
        assert!(right_aligned(&t, 1));
        assert!(!right_aligned(&t, 0));
    }

    #[test]
    fn test_selection_follows_key() {
        let mut view = TableView::default();
        view.set(table(&["a", "b", "c"], NamespaceScope::All));
        view.scroll_down();
        assert_eq!(view.selected_key(), Some("b"));

        view.set(table(&["0", "a", "b", "c"], NamespaceScope::All));
        assert_eq!(view.selected_key(), Some("b"));

        view.set(table(&["x"], NamespaceScope::All));
        assert_eq!(view.selected_key(), Some("x"));

        view.set(table(&[], NamespaceScope::All));
        assert_eq!(view.selected_key(), None);
    }
}
