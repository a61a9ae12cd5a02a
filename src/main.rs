use clap::Parser;
use printful_proxy::config::read_config;
use printful_proxy::endpoints::EndpointRegistry;
use printful_proxy::logger::{log, LogTag};
use printful_proxy::printful::PrintfulClient;
use printful_proxy::store::EntityStore;
use printful_proxy::warmer;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "printful-proxy", about = "Rate-limited caching proxy for the Printful API")]
struct Arguments {
    /// Path to the JSON configuration file.
    #[arg(long, default_value = "config.json")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let arguments = Arguments::parse();
    let config = read_config(&arguments.config)?;

    let store = EntityStore::open(&config.database.path)?;
    let registry = Arc::new(EndpointRegistry::new());
    let client = Arc::new(PrintfulClient::new(&config.printful, registry, store)?);

    if config.printful.warm_on_startup {
        warmer::spawn(client.clone());
    }

    log(
        LogTag::System,
        "INFO",
        &format!("printful-proxy ready, entity cache at {}", config.database.path),
    );

    tokio::signal::ctrl_c().await?;
    log(LogTag::System, "INFO", "shutdown requested, exiting");
    Ok(())
}
