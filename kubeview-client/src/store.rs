//! Single-writer row cache holding the previous reconciled generation.

use tracing::{debug, span, Level};

use crate::access::Listing;
use crate::diff::{annotate, mark_new};
use crate::structs::{NamespaceScope, RowEvent, RowEvents, TableData};

/// The most recent post-eviction generation of a view's rows.
///
/// Owned by exactly one reconciler. Readers only ever see the [`TableData`]
/// handed out by [`RowCache::reconcile`].
#[derive(Debug, Default)]
pub struct RowCache {
    rows: RowEvents,
    generation: u64,
}

impl RowCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Number of completed reconciliations since the cache was created or cleared.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn get(&self, key: &str) -> Option<&RowEvent> {
        self.rows.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.rows.contains_key(key)
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.generation = 0;
    }

    /// Diffs `listing` against the cached generation, replaces the cache with
    /// the annotated rows and returns the new snapshot.
    ///
    /// Keys missing from `listing` are dropped without any event; their absence
    /// from the returned table is the eviction.
    #[tracing::instrument(skip(self, listing), fields(incoming = listing.rows.len(), cached = self.rows.len()))]
    pub fn reconcile(&mut self, listing: Listing, namespace: NamespaceScope) -> TableData {
        let Listing {
            header,
            mut rows,
            num_cols,
        } = listing;
        let width = header.len();
        let first = self.rows.is_empty();

        for (key, ev) in rows.iter_mut() {
            if first {
                mark_new(ev, width);
                continue;
            }
            let prev = self.rows.get(key).map(|p| p.fields.as_slice());
            annotate(ev, prev, width);
        }

        let evicted = self.rows.keys().filter(|k| !rows.contains_key(*k)).count();
        if evicted > 0 {
            debug!(evicted, "evicted stale rows");
        }

        self.rows = rows.clone();
        self.generation += 1;

        TableData {
            header,
            rows,
            namespace,
            num_cols,
        }
    }
}

/// Merges several upstream row sets into one; on key collision the later
/// source wins.
pub fn merge_sources<I>(sources: I) -> RowEvents
where
    I: IntoIterator<Item = RowEvents>,
{
    let _span = span!(Level::DEBUG, "merge_sources").entered();
    let mut merged = RowEvents::new();
    for source in sources {
        for (key, ev) in source {
            if let Some(prev) = merged.insert(key.clone(), ev) {
                debug!(key = %key, dropped = ?prev.fields, "row key collision, keeping later source");
            }
        }
    }
    merged
}
