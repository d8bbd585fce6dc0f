use crate::{
    auth::AuthUser,
    db::models::{Payment, PaymentStatus, Registration},
    error::{AppError, Result},
    registration::CancelActor,
};
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

use super::AppState;

// ==================== Response Types ====================

#[derive(Debug, Serialize)]
pub struct RegistrationResponse {
    pub registration: Registration,
    pub payment: Option<Payment>,
    pub waitlist_position: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RegistrationDetailResponse {
    pub registration: Registration,
    pub payments: Vec<Payment>,
    pub payment_status: Option<PaymentStatus>,
    pub waitlist_position: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct WaitlistPositionResponse {
    pub registration_id: String,
    pub waitlist_position: Option<usize>,
}

// ==================== Router ====================

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tournament/:tournament_id", post(register_for_tournament))
        .route("/my", get(my_registrations))
        .route("/:id", get(get_registration))
        .route("/:id", delete(cancel_registration))
        .route("/:id/admin", delete(admin_cancel_registration))
        .route("/:id/payment", post(create_payment))
        .route("/:id/waitlist-position", get(waitlist_position))
}

// ==================== Handlers ====================

async fn register_for_tournament(
    State(state): State<Arc<AppState>>,
    Path(tournament_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<RegistrationResponse>> {
    let auth_header = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Unauthorized)?;
    let auth_user = AuthUser::from_header(&state.jwt_manager, auth_header)?;

    let outcome = state
        .manager
        .register(&auth_user.user_id, &tournament_id)
        .await?;

    Ok(Json(RegistrationResponse {
        registration: outcome.registration,
        payment: outcome.payment,
        waitlist_position: outcome.waitlist_position,
    }))
}

async fn my_registrations(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Registration>>> {
    let auth_header = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Unauthorized)?;
    let auth_user = AuthUser::from_header(&state.jwt_manager, auth_header)?;

    let registrations: Vec<Registration> = sqlx::query_as(
        "SELECT * FROM registrations WHERE user_id = ? ORDER BY created_at DESC",
    )
    .bind(&auth_user.user_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(registrations))
}

async fn get_registration(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<RegistrationDetailResponse>> {
    let auth_header = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Unauthorized)?;
    let auth_user = AuthUser::from_header(&state.jwt_manager, auth_header)?;

    let detail = state.manager.get_registration(&id).await?;

    if detail.registration.user_id != auth_user.user_id && !auth_user.is_superuser {
        return Err(AppError::Forbidden);
    }

    Ok(Json(RegistrationDetailResponse {
        registration: detail.registration,
        payments: detail.payments,
        payment_status: detail.payment_status,
        waitlist_position: detail.waitlist_position,
    }))
}

async fn cancel_registration(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Registration>> {
    let auth_header = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Unauthorized)?;
    let auth_user = AuthUser::from_header(&state.jwt_manager, auth_header)?;

    let registration = state
        .manager
        .cancel(
            &id,
            CancelActor::User {
                user_id: auth_user.user_id,
            },
        )
        .await?;

    Ok(Json(registration))
}

async fn admin_cancel_registration(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Registration>> {
    let auth_header = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Unauthorized)?;
    let auth_user = AuthUser::from_header(&state.jwt_manager, auth_header)?;
    auth_user.require_superuser()?;

    let registration = state
        .manager
        .cancel(
            &id,
            CancelActor::Admin {
                admin_id: auth_user.user_id,
            },
        )
        .await?;

    Ok(Json(registration))
}

async fn create_payment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<RegistrationResponse>> {
    let auth_header = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Unauthorized)?;
    let auth_user = AuthUser::from_header(&state.jwt_manager, auth_header)?;

    // Only the owner (or an admin) may start the payment flow.
    let detail = state.manager.get_registration(&id).await?;
    if detail.registration.user_id != auth_user.user_id && !auth_user.is_superuser {
        return Err(AppError::Forbidden);
    }

    let (registration, payment) = state.manager.create_payment(&id).await?;

    Ok(Json(RegistrationResponse {
        registration,
        payment,
        waitlist_position: None,
    }))
}

async fn waitlist_position(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<WaitlistPositionResponse>> {
    let auth_header = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Unauthorized)?;
    let auth_user = AuthUser::from_header(&state.jwt_manager, auth_header)?;

    let detail = state.manager.get_registration(&id).await?;
    if detail.registration.user_id != auth_user.user_id && !auth_user.is_superuser {
        return Err(AppError::Forbidden);
    }

    Ok(Json(WaitlistPositionResponse {
        registration_id: id,
        waitlist_position: detail.waitlist_position,
    }))
}
