mod setup;
mod state;

use interactives_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::from_env()?;

    // Wire storage, clients, importer and the queue consumer
    let app = crate::setup::initialize_app(&config).await?;

    // Serve health endpoints until a shutdown signal arrives
    let served = crate::setup::server::start_server(&config, app.router).await;

    app.consumer.shutdown().await;

    served
}
