use sea_orm::Database;
use tracing::info;
use tracing_subscriber::EnvFilter;

use product_maintenance::build_app;
use product_maintenance::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;
    let db = Database::connect(&config.database_url).await?;
    let app = build_app(db).await?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "Running");
    axum::serve(listener, app).await?;
    Ok(())
}
