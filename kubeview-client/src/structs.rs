use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordered display fields for one entity, one entry per header column.
pub type Row = Vec<String>;

/// Live cache and reconciliation output, keyed by the row's stable identifier.
pub type RowEvents = HashMap<String, RowEvent>;

/// Change annotation of a row relative to the previous cache generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Action {
    /// First cycle of a view, nothing to compare against.
    New,
    /// Key absent from the previous generation.
    Added,
    /// At least one field differs from the previous generation.
    Modified,
    Unchanged,
}

/// A row annotated with its [`Action`] and the previous value of every changed column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowEvent {
    pub fields: Row,
    pub action: Action,
    /// Same length as the header. Populated only where the field changed.
    pub deltas: Row,
}

impl RowEvent {
    pub fn new(fields: Row) -> Self {
        Self {
            fields,
            action: Action::New,
            deltas: Row::new(),
        }
    }

    pub fn field(&self, col: usize) -> &str {
        self.fields.get(col).map(String::as_str).unwrap_or("")
    }

    /// Returns true if the column changed in the last reconciliation.
    pub fn is_delta(&self, col: usize) -> bool {
        self.deltas.get(col).is_some_and(|d| !d.is_empty())
    }

    pub fn has_deltas(&self) -> bool {
        self.deltas.iter().any(|d| !d.is_empty())
    }

    /// Space-joined concatenation of all fields, the text a filter matches against.
    pub fn joined(&self) -> String {
        self.fields.join(" ")
    }
}

/// Namespace scope a view is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
pub enum NamespaceScope {
    /// Every namespace; namespaced kinds get a leading NAMESPACE column.
    #[default]
    All,
    Named(String),
    /// Cluster-scoped kinds.
    Cluster,
}

impl NamespaceScope {
    pub fn from_option(ns: Option<String>) -> Self {
        match ns {
            Some(ns) if !ns.is_empty() && ns != "all" => Self::Named(ns),
            _ => Self::All,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Named(ns) => Some(ns.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for NamespaceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Named(ns) => write!(f, "{ns}"),
            Self::Cluster => write!(f, "-"),
        }
    }
}

/// One fully reconciled snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableData {
    pub header: Row,
    pub rows: RowEvents,
    pub namespace: NamespaceScope,
    /// Column name to "compares as a number".
    pub num_cols: HashMap<String, bool>,
}

impl TableData {
    pub fn empty(header: Row, namespace: NamespaceScope) -> Self {
        Self {
            header,
            rows: RowEvents::new(),
            namespace,
            num_cols: HashMap::new(),
        }
    }

    /// Same header, scope and column flags with no rows.
    pub fn head(&self) -> Self {
        Self {
            header: self.header.clone(),
            rows: RowEvents::with_capacity(self.rows.len()),
            namespace: self.namespace.clone(),
            num_cols: self.num_cols.clone(),
        }
    }

    pub fn is_numeric(&self, col: usize) -> bool {
        self.header
            .get(col)
            .and_then(|h| self.num_cols.get(h))
            .copied()
            .unwrap_or(false)
    }

    /// Index of the NAME column, shifted by one when a NAMESPACE column leads.
    pub fn name_col(&self) -> usize {
        match self.header.first() {
            Some(h) if h == "NAMESPACE" => 1,
            _ => 0,
        }
    }
}

/// Active sort column. `col_count` is the header width it was set against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortColumn {
    pub index: usize,
    pub ascending: bool,
    pub col_count: usize,
}

impl SortColumn {
    pub fn new(index: usize, col_count: usize) -> Self {
        Self {
            index,
            ascending: true,
            col_count,
        }
    }
}

impl Default for SortColumn {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

/// Fully qualified container reference.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct Fqn {
    pub namespace: String,
    pub name: String,
    pub container: Option<String>,
}

impl Fqn {
    /// Splits a `namespace/name` row key. Keys without a slash are cluster scoped.
    pub fn from_key(key: &str) -> Self {
        match key.split_once('/') {
            Some((ns, name)) => Self {
                namespace: ns.to_string(),
                name: name.to_string(),
                container: None,
            },
            None => Self {
                namespace: String::new(),
                name: key.to_string(),
                container: None,
            },
        }
    }

    pub fn with_container(mut self, container: Option<String>) -> Self {
        self.container = container;
        self
    }
}

impl fmt::Display for Fqn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.namespace.is_empty() {
            write!(f, "{}/", self.namespace)?;
        }
        write!(f, "{}", self.name)?;
        if let Some(co) = &self.container {
            write!(f, ":{co}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct LogOptions {
    pub fqn: Fqn,
    pub tail_lines: Option<i64>,
    pub previous: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

/// Short user-facing notice shown in the status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub severity: Severity,
    pub message: String,
}

impl Status {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
        }
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warn,
            message: message.into(),
        }
    }

    /// Renders `err` with its source chain, `outer: inner: root`.
    pub fn error(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Self {
            severity: Severity::Error,
            message,
        }
    }
}

/// Builds the row key the way every processor does.
pub fn row_key(namespace: Option<&str>, name: &str) -> String {
    match namespace {
        Some(ns) if !ns.is_empty() => format!("{ns}/{name}"),
        _ => name.to_string(),
    }
}
