// src/server/mod.rs

use crate::config::Config;
use anyhow::Result;

mod context;
mod initialization;
mod metrics_server;
mod spawner;
mod supervisor;

pub use metrics_server::router as metrics_router;

/// The exporter startup function, orchestrating all setup phases.
pub async fn run(config: Config) -> Result<()> {
    // 1. Build the shared client and recorder, bind the endpoint, discover clusters.
    let mut context = initialization::setup(config).await?;

    // 2. Spawn the pull endpoint and the scrape loop.
    spawner::spawn_all(&mut context)?;

    // 3. Run until a signal arrives or a task fails.
    supervisor::run(context).await
}
