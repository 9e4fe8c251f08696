use k8s_openapi::api::rbac::v1::{ClusterRoleBinding, RoleBinding};
use kube::api::{Api, ApiResource, DynamicObject, ListParams, ResourceExt};
use kube::Client;
use tracing::debug;

use crate::access::{AccessError, Describable, Listable, Listing};
use crate::processors::subject::SubjectProcessor;
use crate::processors::ResourceKind;
use crate::structs::{Fqn, NamespaceScope};

/// Cluster-backed source for one resource kind.
#[derive(Clone)]
pub struct KubeAccessor {
    client: Client,
    kind: ResourceKind,
}

impl KubeAccessor {
    pub fn new(client: Client, kind: ResourceKind) -> Self {
        Self { client, kind }
    }

    fn dynamic_api(&self, ar: &ApiResource, namespace: Option<&str>) -> Api<DynamicObject> {
        match namespace.filter(|_| self.kind.namespaced()) {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, ar),
            None => Api::all_with(self.client.clone(), ar),
        }
    }

    #[tracing::instrument(skip(self, ar), fields(kind = %self.kind))]
    async fn list_objects(
        &self,
        ar: &ApiResource,
        scope: &NamespaceScope,
        selector: Option<&str>,
    ) -> Result<Vec<DynamicObject>, kube::Error> {
        let api = self.dynamic_api(ar, scope.name());
        let mut list = api.list(&list_params(selector)).await?;
        for obj in &mut list.items {
            obj.managed_fields_mut().clear();
        }
        debug!(count = list.items.len(), "listed");
        Ok(list.items)
    }

    #[tracing::instrument(skip(self), fields(kind = %self.kind))]
    async fn list_subjects(
        &self,
        proc: SubjectProcessor,
        selector: Option<&str>,
    ) -> Result<Listing, AccessError> {
        let crbs: Api<ClusterRoleBinding> = Api::all(self.client.clone());
        let rbs: Api<RoleBinding> = Api::all(self.client.clone());
        let lp = list_params(selector);
        let (crbs, rbs) = tokio::try_join!(crbs.list(&lp), rbs.list(&lp))?;
        Ok(proc.process(&crbs.items, &rbs.items)?)
    }
}

fn list_params(selector: Option<&str>) -> ListParams {
    match selector {
        Some(sel) => ListParams::default().labels(sel),
        None => ListParams::default(),
    }
}

impl Listable for KubeAccessor {
    async fn list(
        &self,
        scope: &NamespaceScope,
        selector: Option<&str>,
    ) -> Result<Listing, AccessError> {
        if let ResourceKind::Subjects(kind) = self.kind {
            return self.list_subjects(SubjectProcessor::new(kind), selector).await;
        }

        let (Some(proc), Some(ar)) = (self.kind.processor(), self.kind.api_resource()) else {
            return Err(AccessError::Unsupported {
                kind: self.kind.to_string(),
                op: "listed",
            });
        };
        let items = self.list_objects(&ar, scope, selector).await?;
        Ok(proc.process(&items, scope)?)
    }

    fn namespaced(&self) -> bool {
        self.kind.namespaced()
    }
}

impl Describable for KubeAccessor {
    #[tracing::instrument(skip(self), fields(kind = %self.kind))]
    async fn describe(&self, key: &str) -> Result<String, AccessError> {
        let Some(ar) = self.kind.api_resource() else {
            return Err(AccessError::Unsupported {
                kind: self.kind.to_string(),
                op: "described",
            });
        };
        let fqn = Fqn::from_key(key);
        let ns = (!fqn.namespace.is_empty()).then_some(fqn.namespace.as_str());
        let api = self.dynamic_api(&ar, ns);

        let Some(mut obj) = api.get_opt(&fqn.name).await? else {
            return Err(AccessError::NotFound {
                kind: self.kind.to_string(),
                name: key.to_string(),
            });
        };
        obj.managed_fields_mut().clear();
        Ok(serde_yaml::to_string(&obj)?)
    }
}
