//! Registration lifecycle orchestration.
//!
//! Drives one user's registration for one tournament from request to
//! terminal state: eligibility gating, capacity decisions through the
//! roster ledger, payment reconciliation, and waitlist promotion when a
//! seat frees up. All roster mutations for a tournament happen while
//! holding its ledger lock; payment-gateway calls are dispatched only
//! after the lock is released.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::audit;
use crate::db::models::{
    Payment, PaymentStatus, Registration, RegistrationStatus, SeatState, Tournament,
};
use crate::error::{AppError, Result};
use crate::registration::{
    context::{parse_timestamp, RegistrationContext},
    error::RegistrationError,
    pricing, rating,
    roster::{RosterLedger, SeatOutcome},
};

/// Who asked for a cancellation; decides the terminal status.
#[derive(Debug, Clone)]
pub enum CancelActor {
    User { user_id: String },
    Admin { admin_id: String },
}

/// What a registration attempt produced.
#[derive(Debug, Clone)]
pub struct RegistrationOutcome {
    pub registration: Registration,
    /// Present when a seat was confirmed and the tournament is paid.
    pub payment: Option<Payment>,
    /// Present when the registration landed on the waitlist.
    pub waitlist_position: Option<usize>,
}

/// Full view of one registration for the read endpoints.
#[derive(Debug, Clone)]
pub struct RegistrationDetail {
    pub registration: Registration,
    pub payments: Vec<Payment>,
    /// Status of the most recent payment attempt, if any.
    pub payment_status: Option<PaymentStatus>,
    pub waitlist_position: Option<usize>,
}

pub struct RegistrationManager {
    ctx: Arc<RegistrationContext>,
}

impl RegistrationManager {
    pub fn new(ctx: Arc<RegistrationContext>) -> Self {
        Self { ctx }
    }

    /// Register a user for a tournament.
    ///
    /// Gate order: tournament exists and is open; the start time has not
    /// passed; the rank band admits the user; no live registration for
    /// the pair. The capacity decision and the duplicate check run under
    /// the tournament's ledger lock so two racing requests cannot both
    /// take the last seat or both create a row.
    pub async fn register(
        &self,
        user_id: &str,
        tournament_id: &str,
    ) -> Result<RegistrationOutcome> {
        let tournament = self.ctx.load_tournament(tournament_id).await?;
        if tournament.is_deleted {
            return Err(RegistrationError::TournamentNotFound {
                id: tournament_id.to_string(),
            }
            .into());
        }

        if !registration_window_open(&tournament, Utc::now())? {
            return Err(RegistrationError::RegistrationClosed.into());
        }

        let user = self.ctx.load_user(user_id).await?;
        if !rating::is_eligible(user.rank, tournament.rank_min, tournament.rank_max)? {
            return Err(RegistrationError::NotEligible {
                rank: user.rank,
                rank_min: tournament.rank_min,
                rank_max: tournament.rank_max,
            }
            .into());
        }

        let discount = self.ctx.loyalty_discount(&user).await?;
        let amount = pricing::final_amount(tournament.price, discount);

        let handle = self.ctx.roster(&tournament).await?;
        let (registration, outcome) = {
            let mut ledger = handle.lock().await;

            if self
                .ctx
                .find_live_registration(user_id, tournament_id)
                .await?
                .is_some()
            {
                return Err(RegistrationError::AlreadyRegistered {
                    user_id: user_id.to_string(),
                    tournament_id: tournament_id.to_string(),
                }
                .into());
            }

            let mut registration =
                Registration::new(user_id.to_string(), tournament_id.to_string());
            let requested_at = parse_timestamp(&registration.created_at)?;
            let outcome = ledger.try_reserve(&registration.id, requested_at);

            match outcome {
                SeatOutcome::Confirmed => {
                    registration.seat_state = Some(SeatState::Confirmed);
                    // Free entries skip the payment machine entirely.
                    if amount == 0 {
                        registration.status = RegistrationStatus::Active;
                    }
                }
                SeatOutcome::Waitlisted { .. } => {
                    registration.seat_state = Some(SeatState::Waitlisted);
                }
            }

            self.ctx.insert_registration(&registration).await?;
            (registration, outcome)
        };

        audit::log_registration_event(
            tournament_id,
            &registration.id,
            "created",
            &format!("user {} -> {:?}", user_id, outcome),
        );
        tracing::info!(
            "User {} registered for tournament {} ({:?})",
            user_id,
            tournament_id,
            outcome
        );

        let (payment, waitlist_position) = match outcome {
            SeatOutcome::Confirmed if registration.status == RegistrationStatus::Pending => {
                // Gateway I/O happens after the lock is gone. A gateway
                // failure leaves the registration PENDING with its seat;
                // the payment can be re-issued through create_payment.
                match self.issue_confirmed_payment(&registration).await {
                    Ok(payment) => (payment, None),
                    Err(err) => {
                        tracing::error!(
                            "Failed to create payment for registration {}: {:?}",
                            registration.id,
                            err
                        );
                        (None, None)
                    }
                }
            }
            SeatOutcome::Confirmed => (None, None),
            SeatOutcome::Waitlisted { position } => (None, Some(position)),
        };

        let registration = self.ctx.load_registration(&registration.id).await?;

        Ok(RegistrationOutcome {
            registration,
            payment,
            waitlist_position,
        })
    }

    /// Issue (or re-issue) the payment for a PENDING registration that
    /// holds a confirmed seat. Used by the explicit payment endpoint and
    /// as the retry path after a canceled payment attempt.
    pub async fn create_payment(
        &self,
        registration_id: &str,
    ) -> Result<(Registration, Option<Payment>)> {
        let registration = self.ctx.load_registration(registration_id).await?;

        if registration.status == RegistrationStatus::Active {
            return Err(AppError::Conflict(
                "Registration is already paid".to_string(),
            ));
        }
        if registration.status.is_terminal() {
            return Err(RegistrationError::AlreadyTerminal {
                status: registration.status,
            }
            .into());
        }

        if registration.seat_state != Some(SeatState::Confirmed) {
            return Err(RegistrationError::NotConfirmed {
                registration_id: registration_id.to_string(),
            }
            .into());
        }

        let payment = self.issue_confirmed_payment(&registration).await?;
        let registration = self.ctx.load_registration(registration_id).await?;

        Ok((registration, payment))
    }

    /// Apply a gateway status callback and drive the registration.
    ///
    /// Safe to call repeatedly for the same (payment, status) pair.
    /// Serialized per tournament so two callbacks for one payment, or a
    /// callback racing a cancellation, cannot interleave roster updates.
    pub async fn handle_payment_callback(
        &self,
        external_id: &str,
        status: PaymentStatus,
    ) -> Result<()> {
        let payment = self
            .ctx
            .payments
            .find_by_external_id(external_id)
            .await?
            .ok_or_else(|| RegistrationError::PaymentNotFound {
                external_id: external_id.to_string(),
            })?;

        let registration = self.ctx.load_registration(&payment.registration_id).await?;
        let tournament = self.ctx.load_tournament(&registration.tournament_id).await?;

        let handle = self.ctx.roster(&tournament).await?;
        let mut promoted = None;
        {
            let mut ledger = handle.lock().await;

            let outcome = self
                .ctx
                .payments
                .apply_gateway_status(external_id, status)
                .await?;
            if !outcome.changed {
                // Replayed delivery; everything below already happened.
                return Ok(());
            }

            // Re-read under the lock: a cancellation may have landed
            // between the lookup above and acquiring the section.
            let registration = self.ctx.load_registration(&payment.registration_id).await?;

            match status {
                PaymentStatus::Succeeded => {
                    if registration.status.is_terminal() {
                        return Err(RegistrationError::InconsistentState(format!(
                            "payment {} succeeded but registration {} is {}",
                            external_id, registration.id, registration.status
                        ))
                        .into());
                    }

                    match registration.seat_state {
                        Some(SeatState::Confirmed) => {
                            if registration.status == RegistrationStatus::Pending {
                                self.ctx
                                    .set_registration_state(
                                        &registration.id,
                                        RegistrationStatus::Active,
                                        Some(SeatState::Confirmed),
                                    )
                                    .await?;
                                audit::log_registration_event(
                                    &tournament.id,
                                    &registration.id,
                                    "activated",
                                    "payment succeeded",
                                );
                            }
                        }
                        _ => {
                            return Err(RegistrationError::InconsistentState(format!(
                                "payment {} succeeded for registration {} without a confirmed seat",
                                external_id, registration.id
                            ))
                            .into());
                        }
                    }
                }
                PaymentStatus::Canceled => {
                    // Only a PENDING registration is tied to an open
                    // payment; anything else keeps its state.
                    if registration.status == RegistrationStatus::Pending {
                        promoted = self
                            .cancel_under_lock(
                                &mut ledger,
                                &tournament,
                                &registration,
                                RegistrationStatus::Canceled,
                            )
                            .await?;
                    }
                }
                PaymentStatus::Pending | PaymentStatus::WaitingForCapture => {
                    // Intermediate gateway states; the registration waits.
                }
            }
        }

        if let Some(promoted_id) = promoted {
            self.dispatch_promotion_payment(&promoted_id).await;
        }

        Ok(())
    }

    /// Cancel a registration. User-initiated cancellations land in
    /// CANCELED_BY_USER, admin ones in CANCELED; both free the seat
    /// atomically with the transition and promote the waitlist head.
    /// Canceling an already-terminal registration is a no-op.
    pub async fn cancel(
        &self,
        registration_id: &str,
        actor: CancelActor,
    ) -> Result<Registration> {
        let registration = self.ctx.load_registration(registration_id).await?;

        let target = match &actor {
            CancelActor::User { user_id } => {
                if &registration.user_id != user_id {
                    return Err(AppError::Forbidden);
                }
                RegistrationStatus::CanceledByUser
            }
            CancelActor::Admin { admin_id } => {
                audit::log_admin_action(admin_id, "cancel_registration", registration_id);
                RegistrationStatus::Canceled
            }
        };

        if registration.status.is_terminal() {
            return Ok(registration);
        }

        let tournament = self.ctx.load_tournament(&registration.tournament_id).await?;
        let handle = self.ctx.roster(&tournament).await?;

        let promoted = {
            let mut ledger = handle.lock().await;
            let registration = self.ctx.load_registration(registration_id).await?;
            if registration.status.is_terminal() {
                None
            } else {
                self.cancel_under_lock(&mut ledger, &tournament, &registration, target)
                    .await?
            }
        };

        if let Some(promoted_id) = promoted {
            self.dispatch_promotion_payment(&promoted_id).await;
        }

        self.ctx.load_registration(registration_id).await
    }

    pub async fn get_registration(&self, registration_id: &str) -> Result<RegistrationDetail> {
        let registration = self.ctx.load_registration(registration_id).await?;
        let payments = self
            .ctx
            .payments
            .list_for_registration(registration_id)
            .await?;
        let payment_status = self.ctx.payments.current_status(registration_id).await?;
        let waitlist_position = self.waitlist_position_of(&registration).await?;

        Ok(RegistrationDetail {
            registration,
            payments,
            payment_status,
            waitlist_position,
        })
    }

    // ========================================================================
    // Helper Methods
    // ========================================================================

    /// Must be called with the tournament's ledger lock held.
    async fn cancel_under_lock(
        &self,
        ledger: &mut RosterLedger,
        tournament: &Tournament,
        registration: &Registration,
        target: RegistrationStatus,
    ) -> Result<Option<String>> {
        let promoted = ledger.release(&registration.id);

        self.ctx
            .set_registration_state(&registration.id, target, None)
            .await?;

        if let Some(promoted_id) = &promoted {
            self.ctx
                .set_seat_state(promoted_id, Some(SeatState::Confirmed))
                .await?;
        }

        audit::log_registration_event(
            &tournament.id,
            &registration.id,
            target.as_str(),
            &match &promoted {
                Some(promoted_id) => format!("seat released, promoted {}", promoted_id),
                None => "seat released".to_string(),
            },
        );
        tracing::info!(
            "Registration {} -> {} for tournament {}",
            registration.id,
            target,
            tournament.id
        );

        Ok(promoted)
    }

    /// Create the payment for a confirmed PENDING registration; free
    /// entries are activated immediately instead.
    async fn issue_confirmed_payment(
        &self,
        registration: &Registration,
    ) -> Result<Option<Payment>> {
        let tournament = self.ctx.load_tournament(&registration.tournament_id).await?;
        let user = self.ctx.load_user(&registration.user_id).await?;
        let discount = self.ctx.loyalty_discount(&user).await?;
        let amount = pricing::final_amount(tournament.price, discount);

        if amount == 0 {
            self.ctx
                .set_registration_state(
                    &registration.id,
                    RegistrationStatus::Active,
                    Some(SeatState::Confirmed),
                )
                .await?;
            audit::log_registration_event(
                &tournament.id,
                &registration.id,
                "activated",
                "free entry",
            );
            return Ok(None);
        }

        let payment = self
            .ctx
            .payments
            .create_payment_request(
                &*self.ctx.gateway,
                &registration.id,
                amount,
                format!("Tournament '{}' entry", tournament.name),
                format!("{}/tournament/{}", self.ctx.frontend_url, tournament.id),
            )
            .await?;

        Ok(Some(payment))
    }

    /// A promoted registration needs a fresh payment request; failures
    /// are logged rather than propagated since the promotion itself has
    /// already committed and the payment can be re-issued.
    async fn dispatch_promotion_payment(&self, registration_id: &str) {
        match self.ctx.load_registration(registration_id).await {
            Ok(registration) => {
                if let Err(err) = self.issue_confirmed_payment(&registration).await {
                    tracing::error!(
                        "Failed to create payment for promoted registration {}: {:?}",
                        registration_id,
                        err
                    );
                }
            }
            Err(err) => {
                tracing::error!(
                    "Promoted registration {} disappeared: {:?}",
                    registration_id,
                    err
                );
            }
        }
    }

    async fn waitlist_position_of(&self, registration: &Registration) -> Result<Option<usize>> {
        if registration.seat_state != Some(SeatState::Waitlisted) {
            return Ok(None);
        }

        let tournament = self.ctx.load_tournament(&registration.tournament_id).await?;
        let handle = self.ctx.roster(&tournament).await?;
        let ledger = handle.lock().await;
        Ok(ledger.position_in_waitlist(&registration.id))
    }
}

/// Registrations are only accepted strictly before the start time; it is
/// the single time-based gate in the lifecycle.
fn registration_window_open(
    tournament: &Tournament,
    now: DateTime<Utc>,
) -> Result<bool> {
    let start = parse_timestamp(&tournament.start_time)?;
    Ok(now < start)
}
