use clap::Parser;
use specmcp::{config::Config, mcp, services};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "specmcp=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::parse();
    let addr = config.listen_addr()?;

    let services = match services::bootstrap(config).await {
        Ok(services) => services,
        Err(e) => {
            tracing::error!("Startup failed: {}", e);
            std::process::exit(1);
        }
    };

    let ct = CancellationToken::new();
    let monitor = tokio::spawn(services.monitor.clone().run(ct.clone()));

    let app = mcp::build_router(services.state.clone());

    tracing::info!("🚀 Starting MCP server on {}", addr);
    tracing::info!("📡 MCP endpoint: http://{}{}", addr, mcp::MCP_PATH);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(ct.clone()))
        .await?;

    tracing::info!("Shutting down...");
    ct.cancel();
    if let Err(e) = monitor.await {
        tracing::error!("Version monitor task failed: {}", e);
    }

    // Last references to the shared upstream client
    drop(services);
    tracing::info!("HTTP client closed");

    Ok(())
}

async fn shutdown_signal(ct: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
        _ = ct.cancelled() => {},
    }
}
