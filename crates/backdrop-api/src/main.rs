use backdrop_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize the application (telemetry, upstream clients, routes)
    let (_state, router) = backdrop_api::setup::initialize_app(config.clone()).await?;

    // Start the server
    backdrop_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
