//! Command handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Value, json};

use safetrack_client::{CacheController, ControllerConfig, HttpNetwork, Intercept, MemoryShell, Network, NetworkConfig};
use safetrack_core::{CacheDb, Destination, Request, RequestMode, WorkerConfig, classify};

use crate::args::{Cli, Commands};

fn to_value<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).context("failed to render output")
}

/// Load configuration, open the database and run the command.
pub async fn run(cli: &Cli) -> Result<Value> {
    let config = WorkerConfig::load_from(cli.config_file.clone())?;
    let db = CacheDb::open(&config.db_path)
        .await
        .with_context(|| format!("opening {}", config.db_path.display()))?;
    let network = HttpNetwork::new(NetworkConfig {
        user_agent: config.user_agent.clone(),
        timeout: config.timeout(),
        ..Default::default()
    })?;
    let controller = CacheController::new(ControllerConfig::from_worker_config(&config)?, db, Arc::new(network));

    execute(&controller, &cli.command).await
}

/// Run one command against a controller.
///
/// The CLI has no open pages, so activation claims nothing and clicks are
/// not offered.
pub async fn execute<N: Network + 'static>(controller: &CacheController<N>, command: &Commands) -> Result<Value> {
    let shell = MemoryShell::new();
    match command {
        Commands::Install => {
            let install = controller.install().await?;
            let activation = if install.skip_waiting { Some(controller.activate(&shell).await?) } else { None };
            Ok(json!({ "install": to_value(&install)?, "activation": to_value(&activation)? }))
        }
        Commands::Activate => to_value(&controller.activate(&shell).await?),
        Commands::Fetch { url, mode, destination, method } => {
            fetch(controller, url, mode.as_deref(), destination.as_deref(), method).await
        }
        Commands::Partitions => to_value(&controller.db().partitions().await?),
        Commands::Entries { partition } => to_value(&controller.db().entries(partition).await?),
        Commands::Purge { partition } => {
            let deleted = controller.db().delete_partition(partition).await?;
            Ok(json!({ "partition": partition, "deleted": deleted }))
        }
        Commands::Status => to_value(&controller.status().await?),
    }
}

async fn fetch<N: Network + 'static>(
    controller: &CacheController<N>, url: &str, mode: Option<&str>, destination: Option<&str>, method: &str,
) -> Result<Value> {
    let mode: RequestMode = mode.map(str::parse::<RequestMode>).transpose()?.unwrap_or_default();
    let destination = match (destination, mode) {
        (Some(dest), _) => Destination::parse(dest),
        (None, RequestMode::Navigate) => Destination::Document,
        (None, _) => Destination::Empty,
    };
    let mut request = Request::get(controller.resolve(url)?).with_method(method);
    request.mode = mode;
    request.destination = destination;

    let policy = classify(&request, &controller.config().scope);
    let intercept = controller.handle_fetch(&request).await;

    // Revalidations must land before the process exits.
    let settled = controller.settle().await;

    let (response, source, partition) = match intercept? {
        Intercept::Respond(served) => (served.response, Some(served.source), served.partition),
        Intercept::Passthrough => (controller.network().fetch(&request).await?, None, None),
    };

    Ok(json!({
        "url": request.url.as_str(),
        "policy": policy,
        "source": source,
        "partition": partition,
        "status": response.status,
        "content_type": response.content_type(),
        "size": response.body.len(),
        "settled": settled,
        "body": String::from_utf8_lossy(&response.body),
    }))
}
