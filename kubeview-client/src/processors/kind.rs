use std::fmt;
use std::str::FromStr;

use k8s_openapi::api::apps::v1::{DaemonSet, Deployment};
use k8s_openapi::api::core::v1::{Namespace, Pod};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::api::ApiResource;

use super::{
    customresourcedefinition::CustomResourceDefinitionProcessor, daemonset::DaemonsetProcessor,
    deployment::DeploymentProcessor, namespace::NamespaceProcessor, pod::PodProcessor,
    processor::Processor,
};

/// RBAC subject kind shown by the subject views.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SubjectKind {
    User,
    Group,
    ServiceAccount,
}

impl SubjectKind {
    /// Maps a view command to a subject kind. Anything unrecognised is a user.
    pub fn from_cmd(cmd: &str) -> Self {
        match cmd {
            "groups" | "group" | "grp" => Self::Group,
            "serviceaccounts" | "serviceaccount" | "sas" | "sa" => Self::ServiceAccount,
            _ => Self::User,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Group => "Group",
            Self::ServiceAccount => "ServiceAccount",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ResourceKind {
    Pods,
    Deployments,
    DaemonSets,
    Namespaces,
    CustomResourceDefinitions,
    Subjects(SubjectKind),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown resource `{0}`")]
pub struct UnknownKind(pub String);

impl FromStr for ResourceKind {
    type Err = UnknownKind;

    #[tracing::instrument]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cmd = s.trim().to_lowercase();
        Ok(match cmd.as_str() {
            "pods" | "pod" | "po" => Self::Pods,
            "deployments" | "deployment" | "deploy" | "dp" => Self::Deployments,
            "daemonsets" | "daemonset" | "ds" => Self::DaemonSets,
            "namespaces" | "namespace" | "ns" => Self::Namespaces,
            "customresourcedefinitions" | "customresourcedefinition" | "crd" | "crds" => {
                Self::CustomResourceDefinitions
            }
            "users" | "user" | "usr" | "groups" | "group" | "grp" | "serviceaccounts"
            | "serviceaccount" | "sas" | "sa" => Self::Subjects(SubjectKind::from_cmd(&cmd)),
            _ => return Err(UnknownKind(s.trim().to_string())),
        })
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pods => "pods",
            Self::Deployments => "deployments",
            Self::DaemonSets => "daemonsets",
            Self::Namespaces => "namespaces",
            Self::CustomResourceDefinitions => "customresourcedefinitions",
            Self::Subjects(SubjectKind::User) => "users",
            Self::Subjects(SubjectKind::Group) => "groups",
            Self::Subjects(SubjectKind::ServiceAccount) => "serviceaccounts",
        })
    }
}

impl ResourceKind {
    /// Name shown in the table title.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Pods => "Pods",
            Self::Deployments => "Deployments",
            Self::DaemonSets => "DaemonSets",
            Self::Namespaces => "Namespaces",
            Self::CustomResourceDefinitions => "CustomResourceDefinitions",
            Self::Subjects(SubjectKind::User) => "Users",
            Self::Subjects(SubjectKind::Group) => "Groups",
            Self::Subjects(SubjectKind::ServiceAccount) => "ServiceAccounts",
        }
    }

    pub fn namespaced(&self) -> bool {
        matches!(self, Self::Pods | Self::Deployments | Self::DaemonSets)
    }

    pub fn supports_logs(&self) -> bool {
        matches!(self, Self::Pods)
    }

    /// Column the view is sorted by when it opens.
    pub fn default_sort_column(&self) -> usize {
        match self {
            Self::Subjects(_) => 1,
            _ => 0,
        }
    }

    /// Row builder for kinds listed as plain objects. Subject views are
    /// assembled from bindings instead and have none.
    pub fn processor(&self) -> Option<&'static dyn Processor> {
        match self {
            Self::Pods => Some(&PodProcessor),
            Self::Deployments => Some(&DeploymentProcessor),
            Self::DaemonSets => Some(&DaemonsetProcessor),
            Self::Namespaces => Some(&NamespaceProcessor),
            Self::CustomResourceDefinitions => Some(&CustomResourceDefinitionProcessor),
            Self::Subjects(_) => None,
        }
    }

    pub fn api_resource(&self) -> Option<ApiResource> {
        Some(match self {
            Self::Pods => ApiResource::erase::<Pod>(&()),
            Self::Deployments => ApiResource::erase::<Deployment>(&()),
            Self::DaemonSets => ApiResource::erase::<DaemonSet>(&()),
            Self::Namespaces => ApiResource::erase::<Namespace>(&()),
            Self::CustomResourceDefinitions => ApiResource::erase::<CustomResourceDefinition>(&()),
            Self::Subjects(_) => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases() {
        assert_eq!("po".parse(), Ok(ResourceKind::Pods));
        assert_eq!("dp".parse(), Ok(ResourceKind::Deployments));
        assert_eq!("DS".parse(), Ok(ResourceKind::DaemonSets));
        assert_eq!("ns".parse(), Ok(ResourceKind::Namespaces));
        assert_eq!("crds".parse(), Ok(ResourceKind::CustomResourceDefinitions));
        assert_eq!(
            "grp".parse(),
            Ok(ResourceKind::Subjects(SubjectKind::Group))
        );
        assert_eq!(
            "sas".parse(),
            Ok(ResourceKind::Subjects(SubjectKind::ServiceAccount))
        );
        assert_eq!(
            "nope".parse::<ResourceKind>(),
            Err(UnknownKind("nope".into()))
        );
    }

    #[test]
    fn test_subject_fallback_is_user() {
        assert_eq!(SubjectKind::from_cmd("usr"), SubjectKind::User);
        assert_eq!(SubjectKind::from_cmd("whatever"), SubjectKind::User);
    }

    #[test]
    fn test_display_round_trips() {
        for kind in [
            ResourceKind::Pods,
            ResourceKind::CustomResourceDefinitions,
            ResourceKind::Subjects(SubjectKind::ServiceAccount),
        ] {
            assert_eq!(kind.to_string().parse(), Ok(kind));
        }
    }
}
