use kongre_api::setup;
use kongre_core::Config;

// Use mimalloc as the global allocator for lower fragmentation in long-running
// containers.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration; an invalid configuration stops the process here.
    let config = Config::from_env()?;

    // Initialize the application (telemetry, database, storage, services, routes)
    let (_state, router) = setup::initialize_app(config.clone()).await?;

    // Start the server
    setup::server::start_server(&config, router).await?;

    Ok(())
}
