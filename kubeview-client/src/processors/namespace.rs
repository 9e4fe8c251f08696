use k8s_openapi::api::core::v1::Namespace;
use kube::api::DynamicObject;

use super::processor::{age_of, dynamic_to_typed, Processor};
use crate::decode::DecodeError;
use crate::structs::Row;

#[derive(Debug, Clone)]
pub struct NamespaceProcessor;

impl Processor for NamespaceProcessor {
    fn columns(&self) -> &'static [&'static str] {
        &["NAME", "STATUS", "AGE"]
    }

    fn namespaced(&self) -> bool {
        false
    }

    fn build_row(&self, obj: &DynamicObject) -> Result<Row, DecodeError> {
        let ns: Namespace = dynamic_to_typed(obj)?;
        let phase = ns
            .status
            .as_ref()
            .and_then(|s| s.phase.clone())
            .unwrap_or_else(|| "Unknown".into());

        Ok(vec![ns.metadata.name.clone().unwrap_or_default(), phase, age_of(obj)])
    }
}
