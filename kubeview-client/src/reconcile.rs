//! Reconciliation loop of one table view.
//!
//! ```text
//! tick / command ─▶ list ─▶ RowCache::reconcile ─▶ filter ─▶ sort ─▶ ViewEvent::Table
//! ```
//!
//! The loop task is the only owner of the view's [`RowCache`]. The renderer
//! receives each snapshot by value and never sees the cache itself.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::access::{AccessError, Listable};
use crate::filter::{filter_table, FilterError, FilterQuery, RowFilter, SELECTOR_PREFIX};
use crate::sort::{adjust_sorter, group_column, sort_rows, SortCommand};
use crate::store::RowCache;
use crate::streaming::TaskScope;
use crate::structs::{NamespaceScope, Row, RowEvent, SortColumn, Status, TableData};

/// A filtered, sorted snapshot ready to paint. Replaces whatever was shown.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedTable {
    pub header: Row,
    pub rows: Vec<(String, RowEvent)>,
    pub namespace: NamespaceScope,
    pub num_cols: HashMap<String, bool>,
    pub sort: SortColumn,
    /// Active filter as typed, e.g. `nginx` or `-l app=web`.
    pub filter: Option<String>,
    /// Row count before filtering.
    pub total: usize,
    pub generation: u64,
}

impl RenderedTable {
    pub fn is_numeric(&self, col: usize) -> bool {
        self.header
            .get(col)
            .and_then(|h| self.num_cols.get(h))
            .copied()
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewCommand {
    /// Fetch now instead of waiting for the next tick.
    Refresh,
    /// New filter input. Empty input resets.
    Query(String),
    Sort(SortCommand),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    Table(RenderedTable),
    Status(Status),
}

/// What a filter change requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOutcome {
    /// Only the local view changed.
    Rerender,
    /// The server-side selector changed; fetch again.
    Refetch,
}

pub struct Reconciler<L> {
    source: Arc<L>,
    cache: RowCache,
    scope: NamespaceScope,
    selector: Option<String>,
    filter: Option<RowFilter>,
    sort: SortColumn,
    last: Option<TableData>,
}

impl<L: Listable> Reconciler<L> {
    pub fn new(source: Arc<L>, scope: NamespaceScope, sort: SortColumn) -> Self {
        let scope = if source.namespaced() {
            scope
        } else {
            NamespaceScope::Cluster
        };
        Self {
            source,
            cache: RowCache::new(),
            scope,
            selector: None,
            filter: None,
            sort,
            last: None,
        }
    }

    /// Starts from the sort and query of an earlier view of the same kind.
    /// The carried `col_count` lets the first render realign the sort column
    /// when the new scope adds or drops the NAMESPACE column.
    pub fn resume(mut self, previous: &RenderedTable) -> Self {
        self.sort = previous.sort;
        if let Some(query) = &previous.filter {
            if let Err(e) = self.set_query(query) {
                debug!(error = %e, "dropping carried filter");
            }
        }
        self
    }

    pub fn cache(&self) -> &RowCache {
        &self.cache
    }

    pub fn sort_column(&self) -> SortColumn {
        self.sort
    }

    pub fn query(&self) -> Option<String> {
        match (&self.selector, &self.filter) {
            (Some(sel), _) => Some(format!("{SELECTOR_PREFIX} {sel}")),
            (None, Some(f)) => Some(f.pattern().to_string()),
            (None, None) => None,
        }
    }

    /// One fetch, diff, cache update, filter and sort pass.
    ///
    /// A failed fetch leaves the cache as it was.
    #[tracing::instrument(skip(self), fields(scope = %self.scope, generation = self.cache.generation()))]
    pub async fn cycle(&mut self) -> Result<RenderedTable, AccessError> {
        let listing = self
            .source
            .list(&self.scope, self.selector.as_deref())
            .await?;
        let data = self.cache.reconcile(listing, self.scope.clone());
        self.last = Some(data);
        Ok(self.render())
    }

    /// Applies filter input. An invalid pattern clears the filter and is
    /// returned as an error; the view keeps showing the unfiltered rows.
    pub fn set_query(&mut self, input: &str) -> Result<QueryOutcome, FilterError> {
        match FilterQuery::parse(input) {
            FilterQuery::None => {
                self.filter = None;
                Ok(self.clear_selector())
            }
            FilterQuery::Pattern(pattern) => match RowFilter::compile(&pattern) {
                Ok(filter) => {
                    self.filter = Some(filter);
                    Ok(self.clear_selector())
                }
                Err(e) => {
                    self.filter = None;
                    Err(e)
                }
            },
            FilterQuery::Selector(sel) => {
                self.filter = None;
                self.selector = Some(sel);
                Ok(QueryOutcome::Refetch)
            }
        }
    }

    fn clear_selector(&mut self) -> QueryOutcome {
        if self.selector.take().is_some() {
            QueryOutcome::Refetch
        } else {
            QueryOutcome::Rerender
        }
    }

    pub fn sort(&mut self, cmd: SortCommand) -> RenderedTable {
        if let Some(data) = &self.last {
            cmd.apply(&mut self.sort, data);
        }
        self.render()
    }

    /// Filters and sorts the last reconciled snapshot. The cache is not touched.
    pub fn render(&mut self) -> RenderedTable {
        let empty;
        let data = match &self.last {
            Some(data) => data,
            None => {
                empty = TableData::empty(Row::new(), self.scope.clone());
                &empty
            }
        };

        if self.last.is_some() {
            adjust_sorter(&mut self.sort, data.header.len());
        }
        let filtered = filter_table(data, self.filter.as_ref());
        let rows = sort_rows(&filtered, &self.sort, group_column(&filtered));

        RenderedTable {
            header: filtered.header,
            rows,
            namespace: filtered.namespace,
            num_cols: filtered.num_cols,
            sort: self.sort,
            filter: self.query(),
            total: data.rows.len(),
            generation: self.cache.generation(),
        }
    }

    /// Runs until `token` fires or the command channel closes. Cycles are
    /// strictly sequential; a command arriving mid-fetch waits for it.
    pub async fn run(
        mut self,
        refresh: Duration,
        mut commands: mpsc::UnboundedReceiver<ViewCommand>,
        events: mpsc::UnboundedSender<ViewEvent>,
        token: CancellationToken,
    ) {
        let mut ticker = time::interval(refresh);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let refetch = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                cmd = commands.recv() => match cmd {
                    Some(cmd) => self.handle(cmd, &events),
                    None => break,
                },
                _ = ticker.tick() => true,
            };
            if !refetch {
                continue;
            }

            let result = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                result = self.cycle() => result,
            };
            ticker.reset();
            let event = match result {
                Ok(table) => ViewEvent::Table(table),
                Err(e) => {
                    warn!(error = %e, "fetch failed, keeping previous rows");
                    ViewEvent::Status(Status::error(&e))
                }
            };
            if events.send(event).is_err() {
                break;
            }
        }
        debug!(scope = %self.scope, "reconciler stopped");
    }

    /// Returns true when the command needs a fetch.
    fn handle(&mut self, cmd: ViewCommand, events: &mpsc::UnboundedSender<ViewEvent>) -> bool {
        match cmd {
            ViewCommand::Refresh => true,
            ViewCommand::Sort(cmd) => {
                events.send(ViewEvent::Table(self.sort(cmd))).ok();
                false
            }
            ViewCommand::Query(input) => match self.set_query(&input) {
                Ok(QueryOutcome::Refetch) => true,
                Ok(QueryOutcome::Rerender) => {
                    events.send(ViewEvent::Table(self.render())).ok();
                    false
                }
                Err(e) => {
                    events.send(ViewEvent::Status(Status::error(&e))).ok();
                    events.send(ViewEvent::Table(self.render())).ok();
                    false
                }
            },
        }
    }
}

/// Channels of a running view.
#[derive(Debug)]
pub struct ViewHandle {
    pub scope: TaskScope,
    pub commands: mpsc::UnboundedSender<ViewCommand>,
    pub events: mpsc::UnboundedReceiver<ViewEvent>,
}

impl ViewHandle {
    pub fn send(&self, cmd: ViewCommand) {
        if self.commands.send(cmd).is_err() {
            debug!("view already stopped");
        }
    }
}

/// Starts `reconciler` on its own task, refreshing every `refresh`.
pub fn spawn_reconciler<L>(reconciler: Reconciler<L>, refresh: Duration) -> ViewHandle
where
    L: Listable + 'static,
{
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (ev_tx, ev_rx) = mpsc::unbounded_channel();
    let scope = TaskScope::spawn("reconciler", move |token| {
        reconciler.run(refresh, cmd_rx, ev_tx, token)
    });
    ViewHandle {
        scope,
        commands: cmd_tx,
        events: ev_rx,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::Listing;
    use crate::structs::Action;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeSource {
        queue: Mutex<VecDeque<Result<Listing, AccessError>>>,
        selectors: Mutex<Vec<Option<String>>>,
    }

    impl FakeSource {
        fn with(results: Vec<Result<Listing, AccessError>>) -> Arc<Self> {
            Arc::new(Self {
                queue: Mutex::new(results.into()),
                selectors: Mutex::default(),
            })
        }
    }

    impl Listable for FakeSource {
        async fn list(
            &self,
            _scope: &NamespaceScope,
            selector: Option<&str>,
        ) -> Result<Listing, AccessError> {
            self.selectors
                .lock()
                .expect("lock")
                .push(selector.map(str::to_string));
            self.queue
                .lock()
                .expect("lock")
                .pop_front()
                .unwrap_or_else(|| Ok(Listing::new(vec!["NAME".into(), "AGE".into()])))
        }
    }

    fn listing(rows: &[(&str, &str)]) -> Listing {
        let mut l = Listing::new(vec!["NAME".into(), "AGE".into()]);
        for (name, age) in rows {
            l.push(name.to_string(), vec![name.to_string(), age.to_string()]);
        }
        l
    }

    fn failure() -> AccessError {
        AccessError::NotFound {
            kind: "pods".into(),
            name: "x".into(),
        }
    }

    fn keys(table: &RenderedTable) -> Vec<&str> {
        table.rows.iter().map(|(k, _)| k.as_str()).collect()
    }

    #[tokio::test]
    async fn test_cycle_annotates_against_previous_generation() {
        let source = FakeSource::with(vec![
            Ok(listing(&[("a", "1m")])),
            Ok(listing(&[("a", "2m"), ("b", "1s")])),
        ]);
        let mut rec = Reconciler::new(source, NamespaceScope::All, SortColumn::default());

        let first = rec.cycle().await.expect("cycle");
        assert_eq!(first.rows[0].1.action, Action::New);

        let second = rec.cycle().await.expect("cycle");
        assert_eq!(keys(&second), vec!["a", "b"]);
        assert_eq!(second.rows[0].1.action, Action::Modified);
        assert_eq!(second.rows[0].1.deltas, vec!["".to_string(), "1m".to_string()]);
        assert_eq!(second.rows[1].1.action, Action::Added);
        assert_eq!(second.generation, 2);
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_cache() {
        let source = FakeSource::with(vec![
            Ok(listing(&[("a", "1m"), ("b", "1m")])),
            Err(failure()),
        ]);
        let mut rec = Reconciler::new(source, NamespaceScope::All, SortColumn::default());
        rec.cycle().await.expect("cycle");

        assert!(rec.cycle().await.is_err());
        assert_eq!(rec.cache().generation(), 1);
        assert_eq!(rec.cache().len(), 2);
        assert_eq!(rec.render().rows.len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_filter_falls_back_to_full_rows() {
        let source = FakeSource::with(vec![Ok(listing(&[("api", "1m"), ("web", "1m")]))]);
        let mut rec = Reconciler::new(source, NamespaceScope::All, SortColumn::default());
        rec.cycle().await.expect("cycle");

        assert!(matches!(rec.set_query("WEB"), Ok(QueryOutcome::Rerender)));
        let table = rec.render();
        assert_eq!(keys(&table), vec!["web"]);
        assert_eq!(table.total, 2);
        assert_eq!(table.filter.as_deref(), Some("WEB"));

        assert!(rec.set_query("(").is_err());
        let table = rec.render();
        assert_eq!(keys(&table), vec!["api", "web"]);
        assert_eq!(table.filter, None);
    }

    #[tokio::test]
    async fn test_selector_refetches_and_clears_local_filter() {
        let source = FakeSource::with(vec![]);
        let mut rec = Reconciler::new(source.clone(), NamespaceScope::All, SortColumn::default());

        assert!(matches!(rec.set_query("web"), Ok(QueryOutcome::Rerender)));
        assert!(matches!(rec.set_query("-l app=web"), Ok(QueryOutcome::Refetch)));
        rec.cycle().await.expect("cycle");
        assert_eq!(rec.query().as_deref(), Some("-l app=web"));

        assert!(matches!(rec.set_query(""), Ok(QueryOutcome::Refetch)));
        rec.cycle().await.expect("cycle");

        let seen = source.selectors.lock().expect("lock").clone();
        assert_eq!(seen, vec![Some("app=web".to_string()), None]);
    }

    #[tokio::test]
    async fn test_sort_command_rerenders_without_fetch() {
        let source = FakeSource::with(vec![Ok(listing(&[("a", "5m"), ("b", "1s")]))]);
        let mut rec = Reconciler::new(source.clone(), NamespaceScope::All, SortColumn::default());
        rec.cycle().await.expect("cycle");

        let table = rec.sort(SortCommand::Age);
        assert_eq!(keys(&table), vec!["b", "a"]);
        let table = rec.sort(SortCommand::Invert);
        assert_eq!(keys(&table), vec!["a", "b"]);
        assert_eq!(source.selectors.lock().expect("lock").len(), 1);
    }

    #[tokio::test]
    async fn test_resume_realigns_sort_across_scope_change() {
        let named = FakeSource::with(vec![Ok(listing(&[("web", "5m"), ("db", "1s")]))]);
        let mut rec = Reconciler::new(named, NamespaceScope::Named("default".into()), SortColumn::default());
        rec.cycle().await.expect("cycle");
        rec.set_query("web|db").expect("valid pattern");
        let before = rec.sort(SortCommand::Age);
        assert_eq!(before.sort, SortColumn::new(1, 2));

        let mut wide = Listing::new(vec!["NAMESPACE".into(), "NAME".into(), "AGE".into()]);
        for (ns, name, age) in [("a", "web", "5m"), ("b", "db", "1s"), ("b", "cache", "2h")] {
            wide.push(format!("{ns}/{name}"), vec![ns.into(), name.into(), age.into()]);
        }
        let all = FakeSource::with(vec![Ok(wide)]);
        let mut rec = Reconciler::new(all, NamespaceScope::All, SortColumn::default()).resume(&before);
        let after = rec.cycle().await.expect("cycle");

        assert_eq!(after.sort, SortColumn::new(2, 3));
        assert_eq!(after.filter.as_deref(), Some("web|db"));
        assert_eq!(after.total, 3);
        assert_eq!(after.rows.len(), 2);

        let narrow = FakeSource::with(vec![Ok(listing(&[("web", "5m")]))]);
        let mut rec = Reconciler::new(narrow, NamespaceScope::Named("a".into()), SortColumn::default())
            .resume(&after);
        let back = rec.cycle().await.expect("cycle");
        assert_eq!(back.sort, SortColumn::new(1, 2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_emits_and_stops_on_cancel() {
        let source = FakeSource::with(vec![Ok(listing(&[("a", "1m")])), Err(failure())]);
        let rec = Reconciler::new(source, NamespaceScope::All, SortColumn::default());
        let mut view = spawn_reconciler(rec, Duration::from_secs(2));

        match view.events.recv().await {
            Some(ViewEvent::Table(t)) => assert_eq!(keys(&t), vec!["a"]),
            other => panic!("unexpected {other:?}"),
        }
        match view.events.recv().await {
            Some(ViewEvent::Status(s)) => assert!(s.message.contains("x")),
            other => panic!("unexpected {other:?}"),
        }

        view.send(ViewCommand::Query("(".into()));
        assert!(matches!(view.events.recv().await, Some(ViewEvent::Status(_))));
        assert!(matches!(view.events.recv().await, Some(ViewEvent::Table(_))));

        view.scope.shutdown().await;
        while view.events.recv().await.is_some() {}
    }
}
