use mock_server::demo::{self, PokemonEndpoints};
use mock_server::{MockServer, ServerConfig};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env()?;
    let endpoints = PokemonEndpoints::new();
    let server = MockServer::with_strategy(
        demo::handlers(&endpoints, demo::seed()),
        config.on_unhandled_request,
    );

    let addr = config.addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, on_unhandled = %config.on_unhandled_request, "listening");
    mock_server::run(listener, server).await?;
    Ok(())
}
