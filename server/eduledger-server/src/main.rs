use std::env;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use eduledger_server::{create_app, EduLedgerServer};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let server = EduLedgerServer::in_memory();
    let app = create_app(server);

    let host = env::var("EDULEDGER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("EDULEDGER_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "eduledger server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
