use quadpong::ServerBuilder;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("QUADPONG_ADDR").ok())
        .unwrap_or_else(|| "0.0.0.0:8080".to_string());

    // A failed bind propagates out of main for a nonzero exit.
    let server = ServerBuilder::new().bind(&addr).build().await?;
    tracing::info!(%addr, "quadpong listening");
    server.run_until_shutdown().await?;
    Ok(())
}
