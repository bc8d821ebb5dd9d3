use clap::Parser;
use rmcp::ServiceExt;
use specmcp::{
    config::ProxyConfig,
    mcp::proxy::{self, ProxyService, RemoteListener},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // stdout carries the protocol
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "specmcp=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ProxyConfig::parse();
    config.validate()?;

    let listener = RemoteListener::default();
    let remote = proxy::connect(&config.server_url, listener.clone()).await?;
    tracing::info!("🔗 Connected to {}", config.server_url);

    let local = ProxyService::new(remote.peer().clone())
        .serve(rmcp::transport::stdio())
        .await?;
    listener.attach(local.peer().clone());

    local.waiting().await?;
    tracing::info!("Local client disconnected");
    remote.cancel().await?;

    Ok(())
}
