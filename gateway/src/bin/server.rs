use std::net::SocketAddr;

use tracing_subscriber::fmt;

use gridmind_core::LlmClient;
use gridmind_gateway::{start_server, GatewayConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt().compact().init();

    // Credentials may come from a local .env as well as the environment.
    dotenvy::dotenv().ok();

    // A missing OPENROUTER_API_KEY is fatal here, before any request is taken.
    let llm = LlmClient::from_env()?;

    let config = GatewayConfig::from_env();
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    start_server(addr, llm).await?;

    Ok(())
}
