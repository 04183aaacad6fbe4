use academix::{Portal, Settings};
use academix_gateway::create_router;
use anyhow::Result;
use time::macros::format_description;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let time_format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    tracing_subscriber::fmt()
        .with_timer(UtcTime::new(time_format))
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "academix=info,academix_gateway=info,tower_http=info".into()),
        )
        .init();

    let settings = Settings::new()?;
    info!("Configuration loaded (store backend: {:?})", settings.database.backend);
    let bind_address = settings.server.bind_address.clone();

    let portal = Portal::connect(settings).await?;
    let sweeper = portal.start_sweeper();
    let app = create_router(portal)?;

    let listener = TcpListener::bind(&bind_address).await?;
    info!("🚀 Academix API listening on {}", bind_address);
    info!("📋 API Documentation: http://{}/api-docs/openapi.json", bind_address);
    info!("🔍 Health Check: http://{}/health", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }
    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
