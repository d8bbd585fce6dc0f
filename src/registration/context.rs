//! Shared handles for the registration core: database pool, payment
//! tracker, gateway, and the per-tournament ledger locks. One context is
//! created at startup and passed into the services that need it; there
//! is no process-wide singleton.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::db::{
    models::{LoyaltyLevel, Registration, RegistrationStatus, SeatState, Tournament, User},
    DbPool,
};
use crate::error::{AppError, Result};
use crate::gateway::PaymentGateway;

use super::error::RegistrationError;
use super::locks::{LedgerHandle, RosterLocks};
use super::payments::PaymentTracker;
use super::roster::RosterLedger;

pub struct RegistrationContext {
    pub pool: DbPool,
    pub gateway: Arc<dyn PaymentGateway>,
    pub payments: PaymentTracker,
    pub locks: RosterLocks,
    /// Base URL the payer is sent back to after the gateway flow.
    pub frontend_url: String,
}

impl RegistrationContext {
    pub fn new(pool: DbPool, gateway: Arc<dyn PaymentGateway>, frontend_url: String) -> Self {
        Self {
            payments: PaymentTracker::new(pool.clone()),
            pool,
            gateway,
            locks: RosterLocks::new(),
            frontend_url,
        }
    }

    /// Load a tournament row, soft-deleted ones included; callers on the
    /// registration path must reject deleted tournaments themselves.
    pub async fn load_tournament(&self, tournament_id: &str) -> Result<Tournament> {
        sqlx::query_as::<_, Tournament>("SELECT * FROM tournaments WHERE id = ?")
            .bind(tournament_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| {
                RegistrationError::TournamentNotFound {
                    id: tournament_id.to_string(),
                }
                .into()
            })
    }

    pub async fn load_registration(&self, registration_id: &str) -> Result<Registration> {
        sqlx::query_as::<_, Registration>("SELECT * FROM registrations WHERE id = ?")
            .bind(registration_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| {
                RegistrationError::RegistrationNotFound {
                    id: registration_id.to_string(),
                }
                .into()
            })
    }

    pub async fn load_user(&self, user_id: &str) -> Result<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// The one live (PENDING or ACTIVE) registration for this user and
    /// tournament, if any. Terminal rows are audit history and ignored.
    pub async fn find_live_registration(
        &self,
        user_id: &str,
        tournament_id: &str,
    ) -> Result<Option<Registration>> {
        Ok(sqlx::query_as::<_, Registration>(
            "SELECT * FROM registrations
             WHERE user_id = ? AND tournament_id = ? AND status IN ('PENDING', 'ACTIVE')
             LIMIT 1",
        )
        .bind(user_id)
        .bind(tournament_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    /// Discount percentage from the user's loyalty level, zero without one.
    pub async fn loyalty_discount(&self, user: &User) -> Result<i64> {
        let Some(loyalty_id) = user.loyalty_id else {
            return Ok(0);
        };

        let level: Option<LoyaltyLevel> =
            sqlx::query_as("SELECT * FROM loyalty_levels WHERE id = ?")
                .bind(loyalty_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(level.map(|l| l.discount).unwrap_or(0))
    }

    /// Lock handle for a tournament's roster ledger, rebuilding it from
    /// persisted seat states on first access after startup.
    pub async fn roster(&self, tournament: &Tournament) -> Result<LedgerHandle> {
        if let Some(handle) = self.locks.get(&tournament.id).await {
            return Ok(handle);
        }

        let confirmed: Vec<(String,)> = sqlx::query_as(
            "SELECT id FROM registrations
             WHERE tournament_id = ? AND seat_state = 'confirmed' AND status IN ('PENDING', 'ACTIVE')
             ORDER BY created_at, id",
        )
        .bind(&tournament.id)
        .fetch_all(&self.pool)
        .await?;

        let waitlisted_rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT id, created_at FROM registrations
             WHERE tournament_id = ? AND seat_state = 'waitlisted' AND status = 'PENDING'
             ORDER BY created_at, id",
        )
        .bind(&tournament.id)
        .fetch_all(&self.pool)
        .await?;

        let mut waitlisted = Vec::with_capacity(waitlisted_rows.len());
        for (id, created_at) in waitlisted_rows {
            let requested_at = parse_timestamp(&created_at)?;
            waitlisted.push((id, requested_at));
        }

        let ledger = RosterLedger::from_rows(
            tournament.max_users.max(0) as usize,
            confirmed.into_iter().map(|(id,)| id).collect(),
            waitlisted,
        );

        Ok(self.locks.insert_if_absent(&tournament.id, ledger).await)
    }

    pub async fn insert_registration(&self, registration: &Registration) -> Result<()> {
        sqlx::query(
            "INSERT INTO registrations (id, user_id, tournament_id, status, seat_state, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&registration.id)
        .bind(&registration.user_id)
        .bind(&registration.tournament_id)
        .bind(registration.status)
        .bind(registration.seat_state)
        .bind(&registration.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn set_registration_state(
        &self,
        registration_id: &str,
        status: RegistrationStatus,
        seat_state: Option<SeatState>,
    ) -> Result<()> {
        sqlx::query("UPDATE registrations SET status = ?, seat_state = ? WHERE id = ?")
            .bind(status)
            .bind(seat_state)
            .bind(registration_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn set_seat_state(
        &self,
        registration_id: &str,
        seat_state: Option<SeatState>,
    ) -> Result<()> {
        sqlx::query("UPDATE registrations SET seat_state = ? WHERE id = ?")
            .bind(seat_state)
            .bind(registration_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Drop ledger handles for tournaments that no longer take
    /// registrations (soft-deleted or past their end). Called from the
    /// background maintenance task.
    pub async fn cleanup_closed_rosters(&self) -> Result<usize> {
        let now = Utc::now().to_rfc3339();

        let stale: Vec<(String,)> = sqlx::query_as(
            "SELECT id FROM tournaments
             WHERE is_deleted = 1
                OR (end_time IS NOT NULL AND end_time < ?)
                OR (end_time IS NULL AND start_time < ?)",
        )
        .bind(&now)
        .bind(&now)
        .fetch_all(&self.pool)
        .await?;

        let stale: Vec<String> = stale.into_iter().map(|(id,)| id).collect();
        let removed = self.locks.remove_stale(&stale).await;

        if removed > 0 {
            tracing::info!("Cleaned up {} closed tournament rosters from memory", removed);
        }

        Ok(removed)
    }
}

pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            RegistrationError::InconsistentState(format!("unparseable timestamp: {}", value)).into()
        })
}
