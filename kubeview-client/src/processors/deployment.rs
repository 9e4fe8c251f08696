use k8s_openapi::api::apps::v1::Deployment;
use kube::api::DynamicObject;

use super::processor::{age_of, dynamic_to_typed, Processor};
use crate::decode::DecodeError;
use crate::structs::Row;

#[derive(Debug, Clone)]
pub struct DeploymentProcessor;

impl Processor for DeploymentProcessor {
    fn columns(&self) -> &'static [&'static str] {
        &["NAME", "READY", "UP-TO-DATE", "AVAILABLE", "AGE"]
    }

    fn numeric_columns(&self) -> &'static [&'static str] {
        &["UP-TO-DATE", "AVAILABLE"]
    }

    fn build_row(&self, obj: &DynamicObject) -> Result<Row, DecodeError> {
        let deployment: Deployment = dynamic_to_typed(obj)?;
        let status = deployment.status.as_ref();
        let available = status.and_then(|s| s.available_replicas).unwrap_or(0);
        let up_to_date = status.and_then(|s| s.updated_replicas).unwrap_or(0);
        let replicas = deployment
            .spec
            .as_ref()
            .and_then(|s| s.replicas)
            .or_else(|| status.and_then(|s| s.replicas))
            .unwrap_or(0);

        Ok(vec![
            deployment.metadata.name.clone().unwrap_or_default(),
            format!("{available}/{replicas}"),
            up_to_date.to_string(),
            available.to_string(),
            age_of(obj),
        ])
    }
}
