use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing::info;

use kubeview_client::cmd::config::connect;
use kubeview_client::config::{Cli, Config};
use kubeview_client::processors::ResourceKind;
use kubeview_client::structs::NamespaceScope;
use kubeview_client::{install_panic_hook, logging, ui};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())
        .context("loading configuration")?
        .with_overrides(&cli);

    let log_dir = config.log_dir();
    logging::setup_logger(&log_dir, &config.log_level, &config.otlp_endpoint)
        .map_err(|e| anyhow!(e))
        .with_context(|| format!("initialising logging in {}", log_dir.display()))?;
    install_panic_hook(ui::restore_terminal);

    let kind: ResourceKind = config.resource.parse()?;
    let cluster = connect(config.context.clone())
        .await
        .context("connecting to the cluster")?;

    let scope = match config.namespace.as_deref() {
        None => NamespaceScope::Named(cluster.default_namespace.clone()),
        Some(ns) => NamespaceScope::from_option(Some(ns.to_string())),
    };
    info!(context = cluster.context_name(), %kind, %scope, "starting");

    let app = ui::App::new(cluster, config, kind, scope);
    let res = ui::run(app).await.context("terminal session failed");

    logging::shutdown();
    res
}
