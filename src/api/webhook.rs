//! Payment gateway callback endpoint.
//!
//! The gateway may deliver the same event more than once and events may
//! arrive out of order; the handler is safe to call repeatedly, so the
//! caller retries freely on transport failures.

use crate::db::models::PaymentStatus;
use crate::error::Result;
use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct EventObject {
    pub id: String,
    pub status: PaymentStatus,
}

#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    pub object: EventObject,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", post(handle_webhook))
}

async fn handle_webhook(
    State(state): State<Arc<AppState>>,
    Json(event): Json<WebhookEvent>,
) -> Result<Json<serde_json::Value>> {
    tracing::debug!(
        "Gateway webhook: {} for payment {} ({})",
        event.event,
        event.object.id,
        event.object.status
    );

    state
        .manager
        .handle_payment_callback(&event.object.id, event.object.status)
        .await?;

    Ok(Json(json!({ "status": "success" })))
}
