//! Capability interfaces between the live view and the cluster.
//!
//! A view resolves the capabilities it needs when it is constructed: the
//! reconciler only knows [`Listable`], the log session only knows [`Tailable`].

use std::collections::HashMap;
use std::future::Future;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::decode::DecodeError;
use crate::structs::{Fqn, LogOptions, NamespaceScope, Row, RowEvent, RowEvents};

#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error(transparent)]
    Kube(#[from] kube::Error),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("yaml encoding failed")]
    Yaml(#[from] serde_yaml::Error),
    #[error("no {kind} named {name}")]
    NotFound { kind: String, name: String },
    #[error("log stream for {fqn} failed: {reason}")]
    Stream { fqn: String, reason: String },
    #[error("{kind} cannot be {op}")]
    Unsupported { kind: String, op: &'static str },
}

/// Result of one fetch: header plus un-annotated rows.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    pub header: Row,
    pub rows: RowEvents,
    pub num_cols: HashMap<String, bool>,
}

impl Listing {
    pub fn new(header: Row) -> Self {
        Self {
            header,
            rows: RowEvents::new(),
            num_cols: HashMap::new(),
        }
    }

    /// Flags the named columns as numeric.
    pub fn numeric(mut self, cols: &[&str]) -> Self {
        for col in cols {
            if self.header.iter().any(|h| h == col) {
                self.num_cols.insert(col.to_string(), true);
            }
        }
        self
    }

    /// Inserts a row; an existing row with the same key is replaced.
    pub fn push(&mut self, key: String, fields: Row) {
        self.rows.insert(key, RowEvent::new(fields));
    }
}

/// Single-shot fetch of every row of one resource kind.
pub trait Listable: Send + Sync {
    /// Fetches the current full row set. `selector` is a server-side label selector.
    fn list(
        &self,
        scope: &NamespaceScope,
        selector: Option<&str>,
    ) -> impl Future<Output = Result<Listing, AccessError>> + Send;

    /// Cluster-scoped kinds ignore the requested namespace.
    fn namespaced(&self) -> bool {
        true
    }
}

/// Live, cancellable stream of a container's log lines.
pub trait Tailable: Send + Sync {
    /// Container names of the pod, regular containers first.
    fn containers(&self, fqn: &Fqn) -> impl Future<Output = Result<Vec<String>, AccessError>> + Send;

    /// Streams lines into `out` until `cancel` fires or the source ends.
    /// Dropping `out` on return closes the channel.
    fn tail(
        &self,
        cancel: CancellationToken,
        out: mpsc::Sender<String>,
        opts: LogOptions,
    ) -> impl Future<Output = Result<(), AccessError>> + Send;
}

/// Full manifest of a single object.
pub trait Describable: Send + Sync {
    fn describe(&self, key: &str) -> impl Future<Output = Result<String, AccessError>> + Send;
}
