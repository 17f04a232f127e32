mod error;
mod handlers;
mod identity;
mod middleware;
mod setup;
mod state;

use hrvault_core::Config;

// mimalloc keeps allocation overhead flat under concurrent multipart
// uploads, especially on musl-based container images.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;

    let (_state, router) = setup::initialize_app(config.clone()).await?;

    setup::server::start_server(&config, router).await?;

    Ok(())
}
