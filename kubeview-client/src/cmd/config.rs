use kube::config::{KubeConfigOptions, Kubeconfig, KubeconfigError};
use kube::{Client, Config};

#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("failed to load kubeconfig")]
    Kubeconfig(#[from] KubeconfigError),
    #[error(transparent)]
    Client(#[from] kube::Error),
}

/// A connected client plus the namespace its context defaults to.
#[derive(Clone)]
pub struct ClusterHandle {
    pub client: Client,
    /// Resolved context name, `None` for kubeconfigs without one.
    pub context: Option<String>,
    pub default_namespace: String,
}

impl ClusterHandle {
    pub fn context_name(&self) -> &str {
        self.context.as_deref().unwrap_or("in-cluster")
    }
}

/// Builds a client for `context`, or the kubeconfig's current context.
#[tracing::instrument]
pub async fn connect(context: Option<String>) -> Result<ClusterHandle, ConnectError> {
    let kubeconfig = Kubeconfig::read()?;
    let context = context.or_else(|| kubeconfig.current_context.clone());
    let options = KubeConfigOptions {
        context: context.clone(),
        cluster: None,
        user: None,
    };
    let config = Config::from_custom_kubeconfig(kubeconfig, &options).await?;
    let default_namespace = config.default_namespace.clone();
    let client = Client::try_from(config)?;
    tracing::info!(context = ?context, namespace = %default_namespace, "connected");

    Ok(ClusterHandle {
        client,
        context,
        default_namespace,
    })
}
