use futures::{AsyncBufReadExt, TryStreamExt};
use k8s_openapi::api::core::v1::Pod;
use kube::api::LogParams;
use kube::{Api, Client};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::access::{AccessError, Tailable};
use crate::processors::pod::container_names;
use crate::structs::{Fqn, LogOptions};

/// Follows container logs through the pod log subresource.
#[derive(Clone)]
pub struct PodLogs {
    client: Client,
}

impl PodLogs {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, fqn: &Fqn) -> Api<Pod> {
        Api::namespaced(self.client.clone(), &fqn.namespace)
    }
}

impl Tailable for PodLogs {
    #[tracing::instrument(skip(self, fqn), fields(fqn = %fqn))]
    async fn containers(&self, fqn: &Fqn) -> Result<Vec<String>, AccessError> {
        let pod = self.api(fqn).get(&fqn.name).await?;
        Ok(container_names(&pod))
    }

    #[tracing::instrument(skip(self, cancel, out), fields(fqn = %opts.fqn))]
    async fn tail(
        &self,
        cancel: CancellationToken,
        out: mpsc::Sender<String>,
        opts: LogOptions,
    ) -> Result<(), AccessError> {
        let lp = LogParams {
            follow: true,
            container: opts.fqn.container.clone(),
            tail_lines: opts.tail_lines,
            previous: opts.previous,
            ..LogParams::default()
        };
        let api = self.api(&opts.fqn);

        let stream = tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            stream = api.log_stream(&opts.fqn.name, &lp) => stream?,
        };

        let mut lines = stream.lines();
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(()),
                next = lines.try_next() => match next {
                    Ok(Some(line)) => {
                        if out.send(line).await.is_err() {
                            debug!("log receiver dropped");
                            return Ok(());
                        }
                    }
                    Ok(None) => return Ok(()),
                    Err(e) => {
                        return Err(AccessError::Stream {
                            fqn: opts.fqn.to_string(),
                            reason: e.to_string(),
                        })
                    }
                },
            }
        }
    }
}
