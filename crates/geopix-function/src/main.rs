use geopix_core::Config;
use geopix_function::{setup, telemetry};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;

    telemetry::init_telemetry(config.log_json())?;

    let (_state, router) = setup::initialize_app(config.clone()).await?;

    setup::server::start_server(&config, router).await?;

    Ok(())
}
