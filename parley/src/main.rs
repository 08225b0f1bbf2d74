mod server;

use anyhow::Result;
use tracing::info;

use parley_core::{logging, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let config_file = std::env::args().nth(1);
    let config = Config::load(config_file.as_deref())?;

    // Fail fast on misconfigurations before any component starts
    if let Err(errors) = config.validate() {
        for e in &errors {
            eprintln!("Config validation error: {e}");
        }
        return Err(anyhow::anyhow!(
            "Configuration validation failed with {} error(s)",
            errors.len()
        ));
    }

    logging::init_logging(&config.logging)?;
    info!("Parley server starting...");
    info!("HTTP address: {}", config.http_address());

    server::run(config).await
}
