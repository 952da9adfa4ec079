/**
 * Taskboard Server Entry Point
 *
 * Loads configuration, installs tracing and serves the board API and the
 * realtime board connection.
 */

#[cfg(feature = "ssr")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use taskboard::backend::server::{create_app, ServerConfig};

    // Load environment variables from .env file if present
    dotenv::dotenv().ok();

    let config = ServerConfig::load()?;

    eprintln!("[STARTUP] Setting log filter {}", config.log_filter);

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&config.log_filter))
        .init();

    tracing::info!("[STARTUP] Server initialization started");

    let addr = config.socket_addr()?;
    let app = create_app(config).await;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("[STARTUP] Listening on {}", addr);
    eprintln!("[STARTUP] Clients should connect to ws://{}/ws", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(not(feature = "ssr"))]
fn main() {
    eprintln!("Server requires the 'ssr' feature to be enabled.");
    eprintln!("Run with: cargo run --bin taskboard-server --features ssr");
    std::process::exit(1);
}
