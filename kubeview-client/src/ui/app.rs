//! Interactive session: routes keys, owns the active view and log session.
//!
//! ```text
//! crossterm keys ──┐
//! ViewEvent ───────┼─▶ App ─▶ terminal.draw
//! LogUpdate ───────┤
//! Fetched ─────────┘
//! ```

use std::io;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind};
use futures::StreamExt;
use ratatui::{backend::Backend, Frame, Terminal};
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::components::{describe_hints, draw_header, draw_help_bar, draw_prompt, draw_status, log_hints};
use super::events::{handle_scroll_key, is_ctrl_c, PromptEdit, PromptInput};
use super::layout::frame_split;
use super::panes::{ContainerPicker, LogPane, TextPane};
use super::table::TableView;
use crate::access::{AccessError, Describable, Tailable};
use crate::cmd::config::ClusterHandle;
use crate::cmd::get::KubeAccessor;
use crate::cmd::log_session::{LogEvent, LogSession, LogUpdate};
use crate::cmd::logs::PodLogs;
use crate::config::Config;
use crate::filter::FilterQuery;
use crate::keymap::{Command, KeyMap};
use crate::processors::{ResourceKind, UnknownKind};
use crate::reconcile::{spawn_reconciler, Reconciler, ViewCommand, ViewEvent, ViewHandle};
use crate::streaming::{TaskScope, TaskSlot};
use crate::structs::{Fqn, LogOptions, NamespaceScope, Severity, SortColumn, Status};

/// How long a status notice stays on screen.
const STATUS_TTL: Duration = Duration::from_secs(6);

enum Mode {
    Table,
    Filter(PromptInput),
    Command(PromptInput),
    Picker(ContainerPicker),
    Logs,
    Describe(TextPane),
}

/// Results of one-shot lookups made on behalf of a key press.
enum Fetched {
    Containers {
        fqn: Fqn,
        previous: bool,
        result: Result<Vec<String>, AccessError>,
    },
    Manifest {
        key: String,
        result: Result<String, AccessError>,
    },
}

/// Parsed `:` prompt input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptCommand {
    Quit,
    /// `<kind> [namespace]`.
    Switch {
        kind: ResourceKind,
        namespace: Option<String>,
    },
}

pub fn parse_command(input: &str) -> Result<Option<PromptCommand>, UnknownKind> {
    let mut words = input.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    if matches!(head, "q" | "q!" | "quit") {
        return Ok(Some(PromptCommand::Quit));
    }
    let kind = head.parse()?;
    Ok(Some(PromptCommand::Switch {
        kind,
        namespace: words.next().map(str::to_string),
    }))
}

pub struct App {
    cluster: ClusterHandle,
    config: Config,
    keymap: KeyMap,
    hints: Vec<(&'static str, &'static str)>,

    kind: ResourceKind,
    scope: NamespaceScope,
    /// Namespace to return to when leaving all-namespaces.
    home_namespace: String,
    source: Arc<KubeAccessor>,
    view: Option<ViewHandle>,
    table: TableView,
    mode: Mode,
    status: Option<(Status, Instant)>,

    pod_logs: Arc<PodLogs>,
    logs: LogSession,
    log_pane: LogPane,
    log_tx: mpsc::UnboundedSender<LogUpdate>,
    log_rx: mpsc::UnboundedReceiver<LogUpdate>,

    fetches: TaskSlot,
    fetch_tx: mpsc::UnboundedSender<Fetched>,
    fetch_rx: mpsc::UnboundedReceiver<Fetched>,
}

impl App {
    pub fn new(cluster: ClusterHandle, config: Config, kind: ResourceKind, scope: NamespaceScope) -> Self {
        let keymap = KeyMap::default_bindings();
        let hints = keymap.hints();
        let home_namespace = scope
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| cluster.default_namespace.clone());
        let (log_tx, log_rx) = mpsc::unbounded_channel();
        let (fetch_tx, fetch_rx) = mpsc::unbounded_channel();

        Self {
            source: Arc::new(KubeAccessor::new(cluster.client.clone(), kind)),
            pod_logs: Arc::new(PodLogs::new(cluster.client.clone())),
            log_pane: LogPane::new(config.log_scrollback),
            cluster,
            config,
            keymap,
            hints,
            kind,
            scope,
            home_namespace,
            view: None,
            table: TableView::default(),
            mode: Mode::Table,
            status: None,
            logs: LogSession::idle(),
            log_tx,
            log_rx,
            fetches: TaskSlot::new(),
            fetch_tx,
            fetch_rx,
        }
    }

    pub async fn run<B: Backend>(mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        let mut input = EventStream::new();
        self.switch_view(self.kind, self.scope.clone());

        loop {
            terminal.draw(|f| self.draw(f))?;

            let flow = tokio::select! {
                ev = input.next() => match ev {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => self.on_key(key),
                    Some(Ok(_)) => ControlFlow::Continue(()),
                    Some(Err(e)) => return Err(e),
                    None => ControlFlow::Break(()),
                },
                Some(ev) = next_view_event(&mut self.view) => {
                    self.on_view_event(ev);
                    ControlFlow::Continue(())
                }
                Some(update) = self.log_rx.recv() => {
                    self.on_log_update(update);
                    ControlFlow::Continue(())
                }
                Some(fetched) = self.fetch_rx.recv() => {
                    self.on_fetched(fetched);
                    ControlFlow::Continue(())
                }
            };
            if flow.is_break() {
                break;
            }
        }

        self.shutdown().await;
        Ok(())
    }

    async fn shutdown(mut self) {
        self.logs.stop();
        self.fetches.cancel();
        if let Some(view) = self.view.take() {
            view.scope.shutdown().await;
        }
        info!("session closed");
    }

    fn set_status(&mut self, status: Status) {
        self.status = Some((status, Instant::now()));
    }

    /// Tears down the current reconciler and its cache, then starts a fresh one.
    /// Staying on the same kind carries the sort column and query over.
    #[tracing::instrument(skip(self), fields(from = %self.kind))]
    fn switch_view(&mut self, kind: ResourceKind, scope: NamespaceScope) {
        let previous = self.table.table().filter(|_| kind == self.kind).cloned();
        self.logs.stop();
        self.fetches.cancel();
        self.view = None;
        self.table.clear();
        self.mode = Mode::Table;

        self.kind = kind;
        self.scope = if kind.namespaced() {
            scope
        } else {
            NamespaceScope::Cluster
        };
        self.source = Arc::new(KubeAccessor::new(self.cluster.client.clone(), kind));

        let sort = SortColumn::new(kind.default_sort_column(), 0);
        let mut reconciler = Reconciler::new(self.source.clone(), self.scope.clone(), sort);
        if let Some(previous) = &previous {
            reconciler = reconciler.resume(previous);
        }
        self.view = Some(spawn_reconciler(reconciler, self.config.refresh_rate()));
        debug!(scope = %self.scope, "view started");
    }

    fn send(&self, cmd: ViewCommand) {
        if let Some(view) = &self.view {
            view.send(cmd);
        }
    }

    fn on_view_event(&mut self, ev: ViewEvent) {
        match ev {
            ViewEvent::Table(table) => self.table.set(table),
            ViewEvent::Status(status) => self.set_status(status),
        }
    }

    fn on_log_update(&mut self, update: LogUpdate) {
        if update.session != self.logs.id() {
            return;
        }
        match update.event {
            LogEvent::Lines(lines) => self.log_pane.push_lines(lines),
            LogEvent::Error(message) => {
                self.set_status(Status {
                    severity: Severity::Error,
                    message,
                });
                self.log_pane.push_fallback();
            }
            LogEvent::Closed => {
                if self.log_pane.is_empty() {
                    self.log_pane.push_fallback();
                }
                self.set_status(Status::info("log stream ended"));
            }
        }
    }

    fn on_fetched(&mut self, fetched: Fetched) {
        match fetched {
            Fetched::Containers {
                fqn,
                previous,
                result: Ok(containers),
            } => {
                if containers.len() > 1 {
                    self.mode = Mode::Picker(ContainerPicker {
                        fqn,
                        previous,
                        containers,
                    });
                } else {
                    let container = containers.into_iter().next();
                    self.start_logs(fqn.with_container(container), previous);
                }
            }
            Fetched::Manifest {
                key,
                result: Ok(yaml),
            } => {
                self.mode = Mode::Describe(TextPane::new(format!("{} {key}", self.kind.title()), yaml));
            }
            Fetched::Containers { result: Err(e), .. } | Fetched::Manifest { result: Err(e), .. } => {
                self.set_status(Status::error(&e));
            }
        }
    }

    fn start_logs(&mut self, fqn: Fqn, previous: bool) {
        let title = if previous {
            format!("{fqn} (previous)")
        } else {
            fqn.to_string()
        };
        self.log_pane.reset(title);
        let opts = LogOptions {
            fqn,
            tail_lines: self.config.tail_lines(),
            previous,
        };
        self.logs.start(
            self.pod_logs.clone(),
            opts,
            self.config.log_settings(),
            self.log_tx.clone(),
        );
        self.mode = Mode::Logs;
    }

    fn on_key(&mut self, key: KeyEvent) -> ControlFlow<()> {
        if is_ctrl_c(&key) {
            return ControlFlow::Break(());
        }

        match std::mem::replace(&mut self.mode, Mode::Table) {
            Mode::Table => return self.on_table_key(key),
            Mode::Filter(mut input) => match input.apply(&key) {
                PromptEdit::Changed(text) => {
                    if !FilterQuery::parse(&text).is_selector() {
                        self.send(ViewCommand::Query(text));
                    }
                    self.mode = Mode::Filter(input);
                }
                PromptEdit::Submit(text) => self.send(ViewCommand::Query(text)),
                PromptEdit::Cancel => self.send(ViewCommand::Query(String::new())),
                PromptEdit::Ignored => self.mode = Mode::Filter(input),
            },
            Mode::Command(mut input) => match input.apply(&key) {
                PromptEdit::Submit(text) => return self.run_command(&text),
                PromptEdit::Cancel => {}
                PromptEdit::Changed(_) | PromptEdit::Ignored => self.mode = Mode::Command(input),
            },
            Mode::Picker(picker) => match key.code {
                KeyCode::Esc => {}
                KeyCode::Char(c) => match picker.choice(c).map(str::to_string) {
                    Some(container) => {
                        let fqn = picker.fqn.clone().with_container(Some(container));
                        self.start_logs(fqn, picker.previous);
                    }
                    None => self.mode = Mode::Picker(picker),
                },
                _ => self.mode = Mode::Picker(picker),
            },
            Mode::Logs => {
                if matches!(key.code, KeyCode::Esc | KeyCode::Char('q')) {
                    self.logs.stop();
                } else {
                    handle_scroll_key(&mut self.log_pane, key.code);
                    self.mode = Mode::Logs;
                }
            }
            Mode::Describe(mut pane) => {
                if !matches!(key.code, KeyCode::Esc | KeyCode::Char('q')) {
                    handle_scroll_key(&mut pane, key.code);
                    self.mode = Mode::Describe(pane);
                }
            }
        }
        ControlFlow::Continue(())
    }

    fn on_table_key(&mut self, key: KeyEvent) -> ControlFlow<()> {
        let Some(command) = self.keymap.lookup(&key) else {
            return ControlFlow::Continue(());
        };

        match command {
            Command::Quit => return ControlFlow::Break(()),
            Command::Filter => {
                let current = self
                    .table
                    .table()
                    .and_then(|t| t.filter.clone())
                    .unwrap_or_default();
                self.mode = Mode::Filter(PromptInput::with_text(current));
            }
            Command::Prompt => self.mode = Mode::Command(PromptInput::default()),
            Command::ToggleAllNamespaces => {
                if !self.kind.namespaced() {
                    self.set_status(Status::warn(format!("{} are cluster scoped", self.kind.title())));
                } else {
                    let scope = if self.scope.is_all() {
                        NamespaceScope::Named(self.home_namespace.clone())
                    } else {
                        NamespaceScope::All
                    };
                    self.switch_view(self.kind, scope);
                }
            }
            Command::Sort(cmd) => self.send(ViewCommand::Sort(cmd)),
            Command::Refresh => self.send(ViewCommand::Refresh),
            Command::Logs { previous } => self.request_logs(previous),
            Command::Describe => self.request_manifest(),
            Command::Up | Command::Down | Command::PageUp | Command::PageDown | Command::Top | Command::Bottom => {
                handle_scroll_key(&mut self.table, scroll_code(command));
            }
        }
        ControlFlow::Continue(())
    }

    fn run_command(&mut self, input: &str) -> ControlFlow<()> {
        match parse_command(input) {
            Ok(Some(PromptCommand::Quit)) => return ControlFlow::Break(()),
            Ok(Some(PromptCommand::Switch { kind, namespace })) => {
                let scope = match namespace {
                    Some(ns) => {
                        let scope = NamespaceScope::from_option(Some(ns));
                        if let Some(name) = scope.name() {
                            self.home_namespace = name.to_string();
                        }
                        scope
                    }
                    None if self.scope == NamespaceScope::Cluster => {
                        NamespaceScope::Named(self.home_namespace.clone())
                    }
                    None => self.scope.clone(),
                };
                self.switch_view(kind, scope);
            }
            Ok(None) => {}
            Err(e) => self.set_status(Status::error(&e)),
        }
        ControlFlow::Continue(())
    }

    fn request_logs(&mut self, previous: bool) {
        if !self.kind.supports_logs() {
            self.set_status(Status::warn(format!("{} have no logs", self.kind.title())));
            return;
        }
        let Some(key) = self.table.selected_key() else {
            return;
        };
        let fqn = Fqn::from_key(key);
        let source = self.pod_logs.clone();
        let tx = self.fetch_tx.clone();

        self.fetches.replace(TaskScope::spawn("containers", move |token| async move {
            tokio::select! {
                _ = token.cancelled() => {}
                result = source.containers(&fqn) => {
                    tx.send(Fetched::Containers { fqn, previous, result }).ok();
                }
            }
        }));
    }

    fn request_manifest(&mut self) {
        let Some(key) = self.table.selected_key().map(str::to_string) else {
            return;
        };
        let source = self.source.clone();
        let tx = self.fetch_tx.clone();

        self.fetches.replace(TaskScope::spawn("describe", move |token| async move {
            tokio::select! {
                _ = token.cancelled() => {}
                result = source.describe(&key) => {
                    tx.send(Fetched::Manifest { key, result }).ok();
                }
            }
        }));
    }

    fn draw(&mut self, f: &mut Frame) {
        let areas = frame_split(f.area());
        draw_header(
            f,
            areas.header,
            self.cluster.context_name(),
            &self.scope,
            &self.kind.to_string(),
        );

        match &self.mode {
            Mode::Logs => self.log_pane.draw(f, areas.body),
            Mode::Describe(pane) => pane.draw(f, areas.body),
            _ => self.table.draw(f, areas.body, self.kind.title()),
        }
        if let Mode::Picker(picker) = &self.mode {
            picker.draw(f, areas.body);
        }

        match &self.mode {
            Mode::Filter(input) => draw_prompt(f, areas.status, "/", input.text()),
            Mode::Command(input) => draw_prompt(f, areas.status, ":", input.text()),
            _ => {
                let status = self
                    .status
                    .as_ref()
                    .filter(|(_, at)| at.elapsed() < STATUS_TTL)
                    .map(|(s, _)| s);
                draw_status(f, areas.status, status);
            }
        }

        let hints = match &self.mode {
            Mode::Logs => log_hints(),
            Mode::Describe(_) => describe_hints(),
            _ => self.hints.clone(),
        };
        draw_help_bar(f, areas.help, &hints);
    }
}

async fn next_view_event(view: &mut Option<ViewHandle>) -> Option<ViewEvent> {
    match view {
        Some(view) => view.events.recv().await,
        None => std::future::pending().await,
    }
}

fn scroll_code(command: Command) -> KeyCode {
    match command {
        Command::Up => KeyCode::Up,
        Command::PageUp => KeyCode::PageUp,
        Command::PageDown => KeyCode::PageDown,
        Command::Top => KeyCode::Home,
        Command::Bottom => KeyCode::End,
        _ => KeyCode::Down,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::SubjectKind;

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("   "), Ok(None));
        assert_eq!(parse_command("q"), Ok(Some(PromptCommand::Quit)));
        assert_eq!(
            parse_command("deploy kube-system"),
            Ok(Some(PromptCommand::Switch {
                kind: ResourceKind::Deployments,
                namespace: Some("kube-system".into()),
            }))
        );
        assert_eq!(
            parse_command("sas"),
            Ok(Some(PromptCommand::Switch {
                kind: ResourceKind::Subjects(SubjectKind::ServiceAccount),
                namespace: None,
            }))
        );
        assert!(parse_command("nope").is_err());
    }

    #[test]
    fn test_scroll_code_covers_navigation() {
        assert_eq!(scroll_code(Command::Down), KeyCode::Down);
        assert_eq!(scroll_code(Command::Bottom), KeyCode::End);
    }
}
