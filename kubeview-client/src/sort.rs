//! Display ordering of a reconciled snapshot.
//!
//! Rows are partitioned by a grouping column (the NAMESPACE column when one
//! leads the header) and ordered inside each group by the active
//! [`SortColumn`]. Ties fall back to the row key so the order is total and
//! re-sorting the same input is byte-identical.

use std::cmp::Ordering;

use crate::structs::{RowEvent, SortColumn, TableData};
use crate::utils::parse_age;

/// How a column's values compare to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Numeric,
    Age,
}

impl ColumnKind {
    pub fn of(data: &TableData, col: usize) -> Self {
        let header = data.header.get(col).map(String::as_str).unwrap_or("");
        if header == "AGE" {
            Self::Age
        } else if data.is_numeric(col) || is_metric_header(header) {
            Self::Numeric
        } else {
            Self::Text
        }
    }

    pub fn compare(self, a: &str, b: &str) -> Ordering {
        match self {
            Self::Text => a.cmp(b),
            Self::Numeric => cmp_missing_first(leading_number(a), leading_number(b), |x, y| {
                x.partial_cmp(y).unwrap_or(Ordering::Equal)
            }),
            Self::Age => cmp_missing_first(parse_age(a), parse_age(b), |x, y| x.cmp(y)),
        }
    }
}

/// `CPU`, `%CPU`, `MEM`, `%MEM/R` and friends.
fn is_metric_header(header: &str) -> bool {
    let h = header.trim_start_matches('%').to_ascii_uppercase();
    h.starts_with("CPU") || h.starts_with("MEM")
}

fn cmp_missing_first<T>(a: Option<T>, b: Option<T>, cmp: impl Fn(&T, &T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => cmp(&a, &b),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Numeric prefix of a cell, so `250m`, `12Mi` and `3 (2h ago)` still order
/// by their magnitude.
fn leading_number(s: &str) -> Option<f64> {
    let s = s.trim();
    let end = s
        .char_indices()
        .find(|(i, c)| !(c.is_ascii_digit() || *c == '.' || (*i == 0 && *c == '-')))
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    s[..end].parse().ok()
}

/// Index of the grouping column, if the header has one.
pub fn group_column(data: &TableData) -> Option<usize> {
    match data.header.first() {
        Some(h) if h == "NAMESPACE" => Some(0),
        _ => None,
    }
}

/// Returns the rows of `data` in display order.
///
/// When `group_col` is the sort column itself, grouping is skipped and the
/// whole table follows the sort direction.
#[tracing::instrument(skip(data), fields(rows = data.rows.len()))]
pub fn sort_rows(
    data: &TableData,
    sort: &SortColumn,
    group_col: Option<usize>,
) -> Vec<(String, RowEvent)> {
    let col = sort.index.min(data.header.len().saturating_sub(1));
    let kind = ColumnKind::of(data, col);
    let group = group_col.filter(|g| *g != col && *g < data.header.len());

    let mut rows: Vec<(String, RowEvent)> = data
        .rows
        .iter()
        .map(|(k, ev)| (k.clone(), ev.clone()))
        .collect();

    rows.sort_by(|(ka, a), (kb, b)| {
        let within = kind
            .compare(a.field(col), b.field(col))
            .then_with(|| ka.cmp(kb));
        let within = if sort.ascending { within } else { within.reverse() };
        match group {
            Some(g) => a.field(g).cmp(b.field(g)).then(within),
            None => within,
        }
    });
    rows
}

/// Realigns `sort` to a header of `width` columns.
///
/// A width change shifts the index by the signed difference so it keeps
/// pointing at the same logical column, clamped to the valid range.
pub fn adjust_sorter(sort: &mut SortColumn, width: usize) {
    if sort.col_count != 0 && sort.col_count != width {
        let delta = width as isize - sort.col_count as isize;
        sort.index = (sort.index as isize + delta).max(0) as usize;
    }
    sort.col_count = width;
    sort.index = sort.index.min(width.saturating_sub(1));
}

/// User-issued sort changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortCommand {
    Name,
    Age,
    /// Leading column, the namespace when one is shown.
    First,
    Invert,
    Left,
    Right,
    Column(usize),
}

impl SortCommand {
    pub fn apply(self, sort: &mut SortColumn, data: &TableData) {
        let width = data.header.len();
        let last = width.saturating_sub(1);
        match self {
            Self::Name => select(sort, data.name_col()),
            Self::Age => select(sort, last),
            Self::First => select(sort, 0),
            Self::Column(col) => select(sort, col.min(last)),
            Self::Invert => sort.ascending = !sort.ascending,
            Self::Left => sort.index = sort.index.saturating_sub(1),
            Self::Right => sort.index = (sort.index + 1).min(last),
        }
        sort.col_count = width;
    }
}

/// Selecting a column always starts ascending; `I` is the only inversion.
fn select(sort: &mut SortColumn, col: usize) {
    sort.index = col;
    sort.ascending = true;
}
