//! Field-level comparison between two generations of a row.

use crate::structs::{Action, RowEvent};

/// Compares `old` and `new` column by column in a single pass.
///
/// Returns `None` when every column is equal, otherwise the indices that differ.
/// A column missing on one side compares as the empty string.
pub fn diff_fields(old: &[String], new: &[String]) -> Option<Vec<usize>> {
    let width = old.len().max(new.len());
    let mut changed = Vec::new();
    for col in 0..width {
        let a = old.get(col).map(String::as_str).unwrap_or("");
        let b = new.get(col).map(String::as_str).unwrap_or("");
        if a != b {
            changed.push(col);
        }
    }

    if changed.is_empty() {
        None
    } else {
        Some(changed)
    }
}

/// Annotates `ev` against the previous generation's fields.
///
/// `prev` is `None` when the key was absent from the cache. `width` is the
/// header length, which fixes the length of the delta row.
pub fn annotate(ev: &mut RowEvent, prev: Option<&[String]>, width: usize) {
    ev.deltas = vec![String::new(); width];

    let Some(old) = prev else {
        ev.action = Action::Added;
        return;
    };

    match diff_fields(old, &ev.fields) {
        None => ev.action = Action::Unchanged,
        Some(cols) => {
            ev.action = Action::Modified;
            for col in cols.into_iter().filter(|c| *c < width) {
                ev.deltas[col] = old.get(col).cloned().unwrap_or_default();
            }
        }
    }
}

/// First-cycle annotation: no comparison, every delta empty.
pub fn mark_new(ev: &mut RowEvent, width: usize) {
    ev.action = Action::New;
    ev.deltas = vec![String::new(); width];
}
