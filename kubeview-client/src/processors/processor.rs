use std::fmt::Debug;

use k8s_openapi::serde_json::{from_value, to_value};
use kube::api::DynamicObject;
use rayon::prelude::*;
use serde::de::DeserializeOwned;

use crate::access::Listing;
use crate::decode::{require_name, DecodeError};
use crate::structs::{row_key, NamespaceScope, Row};
use crate::utils::raw_age;

pub const NAMESPACE_COL: &str = "NAMESPACE";

/// Turns upstream objects of one kind into table rows.
pub trait Processor: Debug + Send + Sync {
    /// Columns of a row, without the leading NAMESPACE column.
    fn columns(&self) -> &'static [&'static str];

    /// Columns compared as numbers when sorting.
    fn numeric_columns(&self) -> &'static [&'static str] {
        &[]
    }

    fn namespaced(&self) -> bool {
        true
    }

    fn build_row(&self, obj: &DynamicObject) -> Result<Row, DecodeError>;

    /// Header for `scope`; namespaced kinds seen across all namespaces get
    /// a leading NAMESPACE column.
    fn header(&self, scope: &NamespaceScope) -> Row {
        let mut header = Vec::with_capacity(self.columns().len() + 1);
        if self.shows_namespace(scope) {
            header.push(NAMESPACE_COL.to_string());
        }
        header.extend(self.columns().iter().map(|c| c.to_string()));
        header
    }

    fn shows_namespace(&self, scope: &NamespaceScope) -> bool {
        self.namespaced() && scope.is_all()
    }

    /// Builds every row. The first malformed object aborts the whole listing.
    #[tracing::instrument(skip(self, items), fields(item_count = items.len()))]
    fn process(&self, items: &[DynamicObject], scope: &NamespaceScope) -> Result<Listing, DecodeError> {
        let with_ns = self.shows_namespace(scope);
        let rows = items
            .par_iter()
            .map(|obj| {
                let name = require_name(&obj.metadata)?;
                let ns = obj.metadata.namespace.as_deref();
                let mut row = self.build_row(obj)?;
                if with_ns {
                    row.insert(0, ns.unwrap_or_default().to_string());
                }
                Ok((row_key(ns, name), row))
            })
            .collect::<Result<Vec<_>, DecodeError>>()?;

        let mut listing = Listing::new(self.header(scope)).numeric(self.numeric_columns());
        for (key, row) in rows {
            listing.push(key, row);
        }
        Ok(listing)
    }
}

/// Re-reads a dynamic object as its typed counterpart.
pub fn dynamic_to_typed<K: DeserializeOwned>(obj: &DynamicObject) -> Result<K, DecodeError> {
    let value = to_value(obj).map_err(|e| DecodeError::invalid("object", e.to_string()))?;
    from_value(value).map_err(|e| DecodeError::invalid("object", e.to_string()))
}

/// Raw age from the creation timestamp; absent timestamps read `<unknown>`.
pub fn age_of(obj: &DynamicObject) -> String {
    obj.metadata
        .creation_timestamp
        .as_ref()
        .map(|ts| raw_age(&ts.0))
        .unwrap_or_else(|| "<unknown>".into())
}
