//! Entry point: load config, wire dependencies, and run the server.

use asset_tracker::auth::{ensure_bootstrap_admin, TokenService};
use asset_tracker::config::Config;
use asset_tracker::db;
use asset_tracker::{create_app, AppState};
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("config: {}", e))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db_pool = db::create_pool(&config.database_url).await?;
    db::init_schema(&db_pool).await?;
    if let Some(admin) = &config.bootstrap_admin {
        ensure_bootstrap_admin(&db_pool, admin).await?;
    }

    let tokens = TokenService::new(&config.jwt_secret, config.token_ttl_minutes)?;
    let state = AppState::new(db_pool, tokens);

    let app = create_app(state).layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    tracing::info!(addr = %config.server_addr, "listening");
    let listener = tokio::net::TcpListener::bind(config.server_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
