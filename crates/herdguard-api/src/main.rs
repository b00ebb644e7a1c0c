use herdguard_api::setup;
use herdguard_core::ServiceConfig;
use tokio_util::sync::CancellationToken;

// Use mimalloc as the global allocator for better performance and lower fragmentation,
// especially when running on musl-based systems inside containers.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = ServiceConfig::from_env()?;
    let shutdown = CancellationToken::new();

    // Initialize the application (cluster client, node state, gate, routes)
    let app = setup::initialize_app(&config, shutdown.clone()).await?;

    // Start the server
    setup::server::start_server(&config, app.router, shutdown).await?;

    if let Some(watcher) = app.watcher {
        watcher.await.ok();
    }

    Ok(())
}
