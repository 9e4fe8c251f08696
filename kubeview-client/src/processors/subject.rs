//! RBAC subject views: every user, group or service account referenced by a
//! binding, with the first binding it was found in.

use k8s_openapi::api::rbac::v1::{ClusterRoleBinding, RoleBinding, Subject};

use crate::access::Listing;
use crate::decode::{require_name, DecodeError};
use crate::store::merge_sources;
use crate::structs::{RowEvent, RowEvents};

use super::kind::SubjectKind;

#[derive(Debug, Clone, Copy)]
pub struct SubjectProcessor {
    pub kind: SubjectKind,
}

impl SubjectProcessor {
    pub fn new(kind: SubjectKind) -> Self {
        Self { kind }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        &["NAME", "KIND", "FIRST LOCATION"]
    }

    /// Cluster bindings are collected first, then namespaced ones. A subject
    /// named in both keeps the namespaced entry.
    #[tracing::instrument(skip(self, crbs, rbs), fields(kind = self.kind.as_str(), crbs = crbs.len(), rbs = rbs.len()))]
    pub fn process(
        &self,
        crbs: &[ClusterRoleBinding],
        rbs: &[RoleBinding],
    ) -> Result<Listing, DecodeError> {
        let mut cluster = RowEvents::new();
        for crb in crbs {
            let binding = require_name(&crb.metadata)?;
            self.collect(&mut cluster, crb.subjects.as_deref(), "ClusterRoleBinding", None, binding);
        }

        let mut namespaced = RowEvents::new();
        for rb in rbs {
            let binding = require_name(&rb.metadata)?;
            let ns = rb.metadata.namespace.as_deref();
            self.collect(&mut namespaced, rb.subjects.as_deref(), "RoleBinding", ns, binding);
        }

        let header = self.columns().iter().map(|c| c.to_string()).collect();
        let mut listing = Listing::new(header);
        listing.rows = merge_sources([cluster, namespaced]);
        Ok(listing)
    }

    /// Adds one row per matching subject; a later binding replaces an earlier one.
    fn collect(
        &self,
        rows: &mut RowEvents,
        subjects: Option<&[Subject]>,
        binding_kind: &str,
        namespace: Option<&str>,
        binding: &str,
    ) {
        for s in subjects.unwrap_or_default() {
            if s.kind != self.kind.as_str() {
                continue;
            }
            let location = match namespace {
                Some(ns) => format!("{ns}/{binding}"),
                None => binding.to_string(),
            };
            rows.insert(
                s.name.clone(),
                RowEvent::new(vec![s.name.clone(), binding_kind.to_string(), location]),
            );
        }
    }
}
