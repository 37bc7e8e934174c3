use bitcoinde::{BitcoindeBuilder, BitcoindeConfig, BitcoindeError};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Reads BITCOINDE_API_KEY / BITCOINDE_API_SECRET from .env or the environment
    #[cfg(feature = "env-file")]
    let config = BitcoindeConfig::from_env_file("BITCOINDE")?;
    #[cfg(not(feature = "env-file"))]
    let config = BitcoindeConfig::from_env("BITCOINDE")?;

    let client = BitcoindeBuilder::new(config)
        .with_observer(|err: &BitcoindeError| eprintln!("client error: {}", err))
        .build()?;

    println!("Fetching account...");
    match client.get("account", ()).await {
        Ok(account) => println!("{}", serde_json::to_string_pretty(&account)?),
        Err(e) => println!("Error fetching account: {}", e),
    }

    // Example order query (read-only)
    let orders = client
        .get("orders", [("trading_pair", "btceur"), ("type", "buy")])
        .await;
    if let Ok(orders) = orders {
        println!("{}", serde_json::to_string_pretty(&orders)?);
    }

    Ok(())
}
