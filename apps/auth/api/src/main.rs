use core_config::tracing::{init_tracing, install_color_eyre};
use credentials::Credentials;
use std::sync::Arc;
use tracing::info;

mod config;
mod directory;
mod server;

use config::Config;
use directory::InMemoryDirectory;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Before any fallible operation so config errors are reported nicely
    install_color_eyre();

    let config = Config::from_env()?;

    init_tracing(&config.environment);

    let policy = Arc::new(config.credentials);
    info!(
        issuer = policy.issuer(),
        access_ttl_secs = policy.access_ttl().num_seconds(),
        refresh_ttl_secs = policy.refresh_ttl().num_seconds(),
        cookie = %policy.cookie().name,
        "Credential policy loaded"
    );

    let mut directory = InMemoryDirectory::new();
    let demo = config.demo_user;
    directory.insert(demo.identity.clone(), demo.email, &demo.password)?;
    info!(user_id = demo.identity.id, "Identity directory seeded");

    let router = server::build_router(Credentials::new(policy), Arc::new(directory));

    server::serve(router, &config.server)
        .await
        .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Auth API shutdown complete");
    Ok(())
}
