use std::collections::HashMap;

use k8s_openapi::api::core::v1::{ContainerStatus, Pod};
use kube::api::DynamicObject;

use super::processor::{age_of, dynamic_to_typed, Processor};
use crate::decode::DecodeError;
use crate::structs::Row;

#[derive(Debug, Clone)]
pub struct PodProcessor;

impl Processor for PodProcessor {
    fn columns(&self) -> &'static [&'static str] {
        &["NAME", "READY", "STATUS", "RESTARTS", "IP", "NODE", "AGE"]
    }

    fn numeric_columns(&self) -> &'static [&'static str] {
        &["RESTARTS"]
    }

    fn build_row(&self, obj: &DynamicObject) -> Result<Row, DecodeError> {
        let pod: Pod = dynamic_to_typed(obj)?;

        Ok(vec![
            pod.metadata.name.clone().unwrap_or_default(),
            get_ready(&pod),
            get_pod_status(&pod),
            get_restarts(&pod).to_string(),
            pod.status
                .as_ref()
                .and_then(|s| s.pod_ip.clone())
                .unwrap_or_default(),
            pod.spec
                .as_ref()
                .and_then(|s| s.node_name.clone())
                .unwrap_or_default(),
            age_of(obj),
        ])
    }
}

/// Container names of a pod, regular containers first, then init containers.
pub fn container_names(pod: &Pod) -> Vec<String> {
    let Some(spec) = pod.spec.as_ref() else {
        return Vec::new();
    };
    let mut names: Vec<String> = spec.containers.iter().map(|c| c.name.clone()).collect();
    if let Some(init) = &spec.init_containers {
        names.extend(init.iter().map(|c| c.name.clone()));
    }
    names
}

fn get_restarts(pod: &Pod) -> i32 {
    pod.status
        .as_ref()
        .and_then(|s| s.container_statuses.as_ref())
        .map(|statuses| statuses.iter().map(|cs| cs.restart_count).sum())
        .unwrap_or(0)
}

fn get_ready(pod: &Pod) -> String {
    let containers = pod.spec.as_ref().map(|spec| spec.containers.len()).unwrap_or(0);
    let ready = pod
        .status
        .as_ref()
        .and_then(|s| s.container_statuses.as_ref())
        .map(|statuses| statuses.iter().filter(|cs| cs.ready).count())
        .unwrap_or(0);
    format!("{ready}/{containers}")
}

fn check_init_container_status(
    cs: &ContainerStatus,
    count: usize,
    init_count: usize,
    restartable: bool,
) -> Option<String> {
    let state = cs.state.as_ref()?;
    if let Some(term) = &state.terminated {
        if term.exit_code == 0 {
            return None;
        }
        if let Some(reason) = term.reason.as_deref().filter(|r| !r.is_empty()) {
            return Some(format!("Init:{reason}"));
        }
        return Some(match term.signal.unwrap_or(0) {
            0 => format!("Init:ExitCode:{}", term.exit_code),
            signal => format!("Init:Signal:{signal}"),
        });
    }
    if restartable && cs.started.unwrap_or(false) {
        if cs.ready {
            return None;
        }
    } else if let Some(reason) = state
        .waiting
        .as_ref()
        .and_then(|w| w.reason.as_deref())
        .filter(|r| !r.is_empty() && *r != "PodInitializing")
    {
        return Some(format!("Init:{reason}"));
    }
    Some(format!("Init:{count}/{init_count}"))
}

/// First pending init container status, if any.
fn get_init_container_status(pod: &Pod) -> Option<String> {
    let init = pod.spec.as_ref()?.init_containers.as_ref()?;
    if init.is_empty() {
        return None;
    }
    let restartable: HashMap<&str, bool> = init
        .iter()
        .map(|c| (c.name.as_str(), c.restart_policy.as_deref() == Some("Always")))
        .collect();

    let statuses = pod.status.as_ref()?.init_container_statuses.as_ref()?;
    statuses.iter().enumerate().find_map(|(i, cs)| {
        check_init_container_status(
            cs,
            i + 1,
            init.len(),
            restartable.get(cs.name.as_str()).copied().unwrap_or(false),
        )
    })
}

fn get_container_status(statuses: &[ContainerStatus], default_status: &str) -> (String, bool) {
    let mut status = default_status.to_string();
    let mut running = false;

    for cs in statuses.iter().rev() {
        let Some(state) = &cs.state else { continue };
        if let Some(reason) = state
            .waiting
            .as_ref()
            .and_then(|w| w.reason.as_deref())
            .filter(|r| !r.is_empty())
        {
            status = reason.to_string();
            continue;
        }
        if let Some(term) = &state.terminated {
            status = match (term.reason.as_deref(), term.signal) {
                (Some(reason), _) if !reason.is_empty() => reason.to_string(),
                (_, Some(signal)) if signal != 0 => format!("Signal:{signal}"),
                _ => format!("ExitCode:{}", term.exit_code),
            };
            continue;
        }
        if cs.ready && state.running.is_some() {
            running = true;
        }
    }

    (status, running)
}

fn get_pod_status(pod: &Pod) -> String {
    let Some(status) = pod.status.as_ref() else {
        return "Unknown".into();
    };
    let terminating = pod.metadata.deletion_timestamp.is_some();

    let mut phase = status.phase.as_deref().unwrap_or("Unknown");
    if let Some(reason) = status.reason.as_deref() {
        if terminating && reason == "NodeLost" {
            return "Unknown".into();
        }
        phase = reason;
    }

    if let Some(init) = get_init_container_status(pod) {
        return init;
    }

    let (mut final_status, running) = match &status.container_statuses {
        Some(statuses) => get_container_status(statuses, phase),
        None => (phase.to_string(), false),
    };
    if running && final_status == "Completed" {
        final_status = "Running".into();
    }
    if terminating {
        return "Terminating".into();
    }
    final_status
}
