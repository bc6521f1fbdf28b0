use anyhow::{Context, Result};
use audiobook_catalog::{
    configuration::Configuration, connection_pool, controllers, storage::Storage, telemetry,
};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let config = Configuration::from_env().context("Failed to read configuration.")?;
    telemetry::init(config.honeycomb.as_ref())?;

    connection_pool::run_migrations(&config.database_url)?;
    let pool = connection_pool::establish_connection_pool(&config.database_url);
    let storage = Storage::new(&config.storage).context("Failed to create storage client.")?;

    let (address, server) = controllers::get_server_future(
        &pool,
        &storage,
        config.bind_address,
        config.rate_limit_per_second,
        async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(?err, "Failed to listen for shutdown signal.");
            }
            info!("Shutdown signal received, draining requests.");
        },
    )
    .context("Failed to bind server address.")?;
    info!(%address, "Serving audiobook catalog.");
    server.await;

    telemetry::shutdown();
    Ok(())
}
