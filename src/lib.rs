//! Padel Booking Server Library
//!
//! This module exposes the server components for integration testing.

pub mod api;
pub mod audit;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod gateway;
pub mod registration;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Creates the application router with all endpoints
pub fn create_app(state: Arc<api::AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(|| async { "Padel Server" }))
        .route("/health", get(|| async { "OK" }))
        .nest("/api/auth", api::auth_router().with_state(state.clone()))
        .nest_service(
            "/api/tournaments",
            api::tournaments_router().with_state(state.clone()),
        )
        .nest(
            "/api/registrations",
            api::registrations_router().with_state(state.clone()),
        )
        .nest_service("/api/webhook", api::webhook_router().with_state(state))
        .layer(cors)
}

/// Test helper to create an in-memory database and run migrations.
/// A single connection keeps every query on the same in-memory database.
pub async fn create_test_db() -> db::DbPool {
    use std::str::FromStr;
    // Match production: clubs/courts/loyalty tiers are external references
    // that are never populated locally, so keep foreign-key enforcement off.
    let options = sqlx::sqlite::SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("valid sqlite url")
        .foreign_keys(false);
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("Failed to create in-memory database");

    db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

/// Test helper to create a fully configured test app
pub async fn create_test_app() -> (Router, Arc<api::AppState>) {
    let pool = create_test_db().await;
    let jwt_manager = Arc::new(auth::JwtManager::new("test_secret_key".to_string()));
    let payment_gateway: Arc<dyn gateway::PaymentGateway> = Arc::new(gateway::DevGateway);

    let ctx = Arc::new(registration::RegistrationContext::new(
        pool.clone(),
        payment_gateway,
        "http://localhost:3000".to_string(),
    ));
    let manager = Arc::new(registration::RegistrationManager::new(ctx));

    let state = Arc::new(api::AppState {
        pool,
        jwt_manager,
        manager,
    });

    let app = create_app(state.clone());
    (app, state)
}
