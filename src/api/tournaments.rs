use crate::{
    audit,
    auth::AuthUser,
    db::models::Tournament,
    error::{AppError, Result},
    registration::rating,
};
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::{delete, get, patch, post},
    Json, Router,
};
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::AppState;

// ==================== Request/Response Types ====================

#[derive(Debug, Deserialize)]
pub struct CreateTournamentRequest {
    pub club_id: String,
    pub name: String,
    pub start_time: String, // ISO 8601 timestamp
    pub end_time: Option<String>,
    pub price: i64,
    pub rank_min: f64,
    pub rank_max: f64,
    pub max_users: i32,
    pub tournament_type: String,
}

#[derive(Debug, Deserialize)]
pub struct PatchTournamentRequest {
    pub name: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub price: Option<i64>,
    pub tournament_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TournamentResponse {
    pub tournament: Tournament,
    /// Human-readable rank band, e.g. "Beginner - Advanced".
    pub rank_band: String,
}

#[derive(Debug, Serialize)]
pub struct TournamentListResponse {
    pub tournaments: Vec<TournamentWithStats>,
}

#[derive(Debug, Serialize)]
pub struct TournamentWithStats {
    pub tournament: Tournament,
    pub rank_band: String,
    pub confirmed_count: i32,
    pub waitlist_count: i32,
    pub is_registered: bool,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct Participant {
    pub registration_id: String,
    pub user_id: String,
    pub username: String,
    pub rank: f64,
    pub status: String,
    pub registered_at: String,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct WaitlistEntry {
    pub registration_id: String,
    pub user_id: String,
    pub username: String,
    pub rank: f64,
    pub registered_at: String,
}

#[derive(Debug, Serialize)]
pub struct TournamentDetailResponse {
    pub tournament: Tournament,
    pub rank_band: String,
    pub participants: Vec<Participant>,
    pub waitlist: Vec<WaitlistEntry>,
    pub is_registered: bool,
}

// ==================== Router ====================

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_tournament))
        .route("/", get(list_tournaments))
        .route("/:id", get(get_tournament_details))
        .route("/:id", patch(patch_tournament))
        .route("/:id", delete(delete_tournament))
}

// ==================== Handlers ====================

async fn create_tournament(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreateTournamentRequest>,
) -> Result<Json<TournamentResponse>> {
    let auth_header = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Unauthorized)?;
    let auth_user = AuthUser::from_header(&state.jwt_manager, auth_header)?;
    auth_user.require_superuser()?;

    // Input validation
    if req.name.is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }
    if req.price < 0 {
        return Err(AppError::Validation("Price must be non-negative".to_string()));
    }
    if req.rank_min > req.rank_max {
        return Err(AppError::Validation(
            "rank_min must not exceed rank_max".to_string(),
        ));
    }
    if req.max_users < 2 {
        return Err(AppError::Validation(
            "Tournament needs at least 2 participants".to_string(),
        ));
    }
    if DateTime::parse_from_rfc3339(&req.start_time).is_err() {
        return Err(AppError::Validation(
            "start_time must be an RFC 3339 timestamp".to_string(),
        ));
    }
    if let Some(end_time) = &req.end_time {
        if DateTime::parse_from_rfc3339(end_time).is_err() {
            return Err(AppError::Validation(
                "end_time must be an RFC 3339 timestamp".to_string(),
            ));
        }
    }

    let tournament = Tournament::new(
        req.club_id,
        req.name,
        req.start_time,
        req.end_time,
        req.price,
        req.rank_min,
        req.rank_max,
        req.max_users,
        req.tournament_type,
        auth_user.user_id.clone(),
    );

    sqlx::query(
        "INSERT INTO tournaments (
            id, club_id, name, start_time, end_time, price, rank_min, rank_max,
            max_users, tournament_type, organizer_id, is_deleted, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&tournament.id)
    .bind(&tournament.club_id)
    .bind(&tournament.name)
    .bind(&tournament.start_time)
    .bind(&tournament.end_time)
    .bind(tournament.price)
    .bind(tournament.rank_min)
    .bind(tournament.rank_max)
    .bind(tournament.max_users)
    .bind(&tournament.tournament_type)
    .bind(&tournament.organizer_id)
    .bind(tournament.is_deleted)
    .bind(&tournament.created_at)
    .execute(&state.pool)
    .await?;

    audit::log_admin_action(&auth_user.user_id, "create_tournament", &tournament.id);
    tracing::info!("Created tournament: {} ({})", tournament.name, tournament.id);

    let rank_band = rating::describe_range(tournament.rank_min, tournament.rank_max);

    Ok(Json(TournamentResponse {
        tournament,
        rank_band,
    }))
}

async fn list_tournaments(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<TournamentListResponse>> {
    let auth_header = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Unauthorized)?;
    let auth_user = AuthUser::from_header(&state.jwt_manager, auth_header)?;

    let tournaments: Vec<Tournament> = sqlx::query_as(
        "SELECT * FROM tournaments WHERE is_deleted = 0 ORDER BY start_time LIMIT 50",
    )
    .fetch_all(&state.pool)
    .await?;

    let mut results = Vec::new();
    for tournament in tournaments {
        let (confirmed_count,): (i32,) = sqlx::query_as(
            "SELECT COUNT(*) FROM registrations
             WHERE tournament_id = ? AND seat_state = 'confirmed' AND status IN ('PENDING', 'ACTIVE')",
        )
        .bind(&tournament.id)
        .fetch_one(&state.pool)
        .await?;

        let (waitlist_count,): (i32,) = sqlx::query_as(
            "SELECT COUNT(*) FROM registrations
             WHERE tournament_id = ? AND seat_state = 'waitlisted' AND status = 'PENDING'",
        )
        .bind(&tournament.id)
        .fetch_one(&state.pool)
        .await?;

        let is_registered: Option<(String,)> = sqlx::query_as(
            "SELECT id FROM registrations
             WHERE tournament_id = ? AND user_id = ? AND status IN ('PENDING', 'ACTIVE')",
        )
        .bind(&tournament.id)
        .bind(&auth_user.user_id)
        .fetch_optional(&state.pool)
        .await?;

        results.push(TournamentWithStats {
            rank_band: rating::describe_range(tournament.rank_min, tournament.rank_max),
            confirmed_count,
            waitlist_count,
            is_registered: is_registered.is_some(),
            tournament,
        });
    }

    Ok(Json(TournamentListResponse {
        tournaments: results,
    }))
}

async fn get_tournament_details(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<TournamentDetailResponse>> {
    let auth_header = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Unauthorized)?;
    let auth_user = AuthUser::from_header(&state.jwt_manager, auth_header)?;

    let tournament: Tournament =
        sqlx::query_as("SELECT * FROM tournaments WHERE id = ? AND is_deleted = 0")
            .bind(&id)
            .fetch_optional(&state.pool)
            .await?
            .ok_or(AppError::NotFound("Tournament not found".to_string()))?;

    let participants: Vec<Participant> = sqlx::query_as(
        "SELECT r.id as registration_id, r.user_id, u.username, u.rank, r.status, r.created_at as registered_at
         FROM registrations r
         JOIN users u ON r.user_id = u.id
         WHERE r.tournament_id = ? AND r.seat_state = 'confirmed' AND r.status IN ('PENDING', 'ACTIVE')
         ORDER BY r.created_at, r.id",
    )
    .bind(&id)
    .fetch_all(&state.pool)
    .await?;

    let waitlist: Vec<WaitlistEntry> = sqlx::query_as(
        "SELECT r.id as registration_id, r.user_id, u.username, u.rank, r.created_at as registered_at
         FROM registrations r
         JOIN users u ON r.user_id = u.id
         WHERE r.tournament_id = ? AND r.seat_state = 'waitlisted' AND r.status = 'PENDING'
         ORDER BY r.created_at, r.id",
    )
    .bind(&id)
    .fetch_all(&state.pool)
    .await?;

    let is_registered = participants
        .iter()
        .any(|p| p.user_id == auth_user.user_id)
        || waitlist.iter().any(|w| w.user_id == auth_user.user_id);

    Ok(Json(TournamentDetailResponse {
        rank_band: rating::describe_range(tournament.rank_min, tournament.rank_max),
        tournament,
        participants,
        waitlist,
        is_registered,
    }))
}

async fn patch_tournament(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<PatchTournamentRequest>,
) -> Result<Json<TournamentResponse>> {
    let auth_header = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Unauthorized)?;
    let auth_user = AuthUser::from_header(&state.jwt_manager, auth_header)?;
    auth_user.require_superuser()?;

    let mut tournament: Tournament =
        sqlx::query_as("SELECT * FROM tournaments WHERE id = ? AND is_deleted = 0")
            .bind(&id)
            .fetch_optional(&state.pool)
            .await?
            .ok_or(AppError::NotFound("Tournament not found".to_string()))?;

    if let Some(name) = req.name {
        if name.is_empty() {
            return Err(AppError::Validation("Name must not be empty".to_string()));
        }
        tournament.name = name;
    }
    if let Some(start_time) = req.start_time {
        if DateTime::parse_from_rfc3339(&start_time).is_err() {
            return Err(AppError::Validation(
                "start_time must be an RFC 3339 timestamp".to_string(),
            ));
        }
        tournament.start_time = start_time;
    }
    if let Some(end_time) = req.end_time {
        if DateTime::parse_from_rfc3339(&end_time).is_err() {
            return Err(AppError::Validation(
                "end_time must be an RFC 3339 timestamp".to_string(),
            ));
        }
        tournament.end_time = Some(end_time);
    }
    if let Some(price) = req.price {
        if price < 0 {
            return Err(AppError::Validation("Price must be non-negative".to_string()));
        }
        tournament.price = price;
    }
    if let Some(tournament_type) = req.tournament_type {
        tournament.tournament_type = tournament_type;
    }

    sqlx::query(
        "UPDATE tournaments
         SET name = ?, start_time = ?, end_time = ?, price = ?, tournament_type = ?
         WHERE id = ?",
    )
    .bind(&tournament.name)
    .bind(&tournament.start_time)
    .bind(&tournament.end_time)
    .bind(tournament.price)
    .bind(&tournament.tournament_type)
    .bind(&id)
    .execute(&state.pool)
    .await?;

    audit::log_admin_action(&auth_user.user_id, "patch_tournament", &id);

    let rank_band = rating::describe_range(tournament.rank_min, tournament.rank_max);

    Ok(Json(TournamentResponse {
        tournament,
        rank_band,
    }))
}

async fn delete_tournament(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Tournament>> {
    let auth_header = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Unauthorized)?;
    let auth_user = AuthUser::from_header(&state.jwt_manager, auth_header)?;
    auth_user.require_superuser()?;

    let tournament: Tournament = sqlx::query_as("SELECT * FROM tournaments WHERE id = ?")
        .bind(&id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(AppError::NotFound("Tournament not found".to_string()))?;

    // Registrations keep referencing the row; it is only ever hidden.
    sqlx::query("UPDATE tournaments SET is_deleted = 1 WHERE id = ?")
        .bind(&id)
        .execute(&state.pool)
        .await?;

    audit::log_admin_action(&auth_user.user_id, "delete_tournament", &id);
    tracing::info!("Soft-deleted tournament: {} ({})", tournament.name, id);

    let mut tournament = tournament;
    tournament.is_deleted = true;

    Ok(Json(tournament))
}
