use kube::api::DynamicObject;

use super::processor::{age_of, Processor};
use crate::decode::{CrdMeta, DecodeError};
use crate::structs::Row;

#[derive(Debug, Clone)]
pub struct CustomResourceDefinitionProcessor;

impl Processor for CustomResourceDefinitionProcessor {
    fn columns(&self) -> &'static [&'static str] {
        &["NAME", "GROUP", "KIND", "VERSIONS", "SCOPE", "AGE"]
    }

    fn namespaced(&self) -> bool {
        false
    }

    fn build_row(&self, obj: &DynamicObject) -> Result<Row, DecodeError> {
        let meta = CrdMeta::decode(obj)?;
        let scope = if meta.namespaced { "Namespaced" } else { "Cluster" };

        Ok(vec![
            meta.name,
            meta.group,
            meta.kind,
            meta.versions.join(","),
            scope.to_string(),
            age_of(obj),
        ])
    }
}
