use padel_server::{api, auth, config, create_app, db, gateway, registration};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load config
    let config = config::Config::from_env();
    tracing::info!("Starting padel server on {}", config.server_addr());

    // Create database pool
    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Database connected");

    // Run migrations
    db::run_migrations(&pool).await?;

    // Create JWT manager
    let jwt_manager = Arc::new(auth::JwtManager::new(config.jwt_secret.clone()));

    // Payment gateway; the offline implementation is used until real
    // credentials are wired up.
    if config.gateway.gateway_enabled() {
        tracing::info!(
            "Payment gateway credentials loaded for shop {}",
            config.gateway.shop_id
        );
    }
    let payment_gateway: Arc<dyn gateway::PaymentGateway> = Arc::new(gateway::DevGateway);

    // Create registration core
    let ctx = Arc::new(registration::RegistrationContext::new(
        pool.clone(),
        payment_gateway,
        config.frontend_url.clone(),
    ));
    let manager = Arc::new(registration::RegistrationManager::new(ctx.clone()));

    // Create shared state for API endpoints
    let state = Arc::new(api::AppState {
        pool: pool.clone(),
        jwt_manager,
        manager,
    });

    // Build router using lib function
    let app = create_app(state);

    // Spawn background task to drop roster ledgers of closed tournaments
    let cleanup_ctx = ctx.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(600));
        loop {
            interval.tick().await;
            if let Err(e) = cleanup_ctx.cleanup_closed_rosters().await {
                tracing::error!("Error cleaning up rosters: {:?}", e);
            }
        }
    });

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.server_addr()).await?;
    tracing::info!("Server listening on {}", config.server_addr());

    axum::serve(listener, app).await?;

    Ok(())
}
