use k8s_openapi::api::apps::v1::DaemonSet;
use kube::api::DynamicObject;

use super::processor::{age_of, dynamic_to_typed, Processor};
use crate::decode::DecodeError;
use crate::structs::Row;

#[derive(Debug, Clone)]
pub struct DaemonsetProcessor;

impl Processor for DaemonsetProcessor {
    fn columns(&self) -> &'static [&'static str] {
        &["NAME", "DESIRED", "CURRENT", "READY", "UP-TO-DATE", "AVAILABLE", "AGE"]
    }

    fn numeric_columns(&self) -> &'static [&'static str] {
        &["DESIRED", "CURRENT", "READY", "UP-TO-DATE", "AVAILABLE"]
    }

    fn build_row(&self, obj: &DynamicObject) -> Result<Row, DecodeError> {
        let ds: DaemonSet = dynamic_to_typed(obj)?;
        let status = ds.status.as_ref();

        Ok(vec![
            ds.metadata.name.clone().unwrap_or_default(),
            status.map(|s| s.desired_number_scheduled).unwrap_or(0).to_string(),
            status.map(|s| s.current_number_scheduled).unwrap_or(0).to_string(),
            status.map(|s| s.number_ready).unwrap_or(0).to_string(),
            status
                .and_then(|s| s.updated_number_scheduled)
                .unwrap_or(0)
                .to_string(),
            status.and_then(|s| s.number_available).unwrap_or(0).to_string(),
            age_of(obj),
        ])
    }
}
