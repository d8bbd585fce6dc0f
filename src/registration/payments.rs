//! Payment records attached to registrations and their status machine.
//!
//! A registration accumulates payment attempts over time but holds at
//! most one non-terminal payment. Gateway callbacks may arrive out of
//! order or more than once; applying a status is idempotent and illegal
//! transitions leave the stored state untouched.

use crate::db::{
    models::{Payment, PaymentStatus},
    DbPool,
};
use crate::error::Result;
use crate::gateway::{ChargeRequest, PaymentGateway};

use super::error::RegistrationError;

/// Legal gateway-driven transitions. Succeeded and canceled are terminal.
fn legal_transition(from: PaymentStatus, to: PaymentStatus) -> bool {
    use PaymentStatus::*;
    matches!(
        (from, to),
        (Pending, WaitingForCapture)
            | (Pending, Succeeded)
            | (Pending, Canceled)
            | (WaitingForCapture, Succeeded)
            | (WaitingForCapture, Canceled)
    )
}

/// Result of applying a gateway callback to a stored payment.
#[derive(Debug, Clone)]
pub struct CallbackOutcome {
    pub payment: Payment,
    /// False when the callback was a replay and nothing changed.
    pub changed: bool,
}

#[derive(Clone)]
pub struct PaymentTracker {
    pool: DbPool,
}

impl PaymentTracker {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a new pending payment for a registration, calling out to
    /// the gateway for the charge handles. Fails with a conflict if a
    /// non-terminal payment already exists; a canceled prior attempt
    /// stays in place and is superseded by the new row.
    pub async fn create_payment_request(
        &self,
        gateway: &dyn PaymentGateway,
        registration_id: &str,
        amount: i64,
        description: String,
        return_url: String,
    ) -> Result<Payment> {
        if let Some(open) = self.find_non_terminal(registration_id).await? {
            tracing::warn!(
                "Rejected duplicate payment for registration {} (open payment {})",
                registration_id,
                open.external_id
            );
            return Err(RegistrationError::PaymentConflict {
                registration_id: registration_id.to_string(),
            }
            .into());
        }

        let charge = gateway
            .create_charge(ChargeRequest {
                amount,
                description,
                return_url,
                idempotency_key: uuid::Uuid::new_v4().to_string(),
            })
            .await?;

        let payment = Payment::new(
            registration_id.to_string(),
            charge.external_id,
            amount,
            charge.payment_link,
            charge.confirmation_token,
        );

        sqlx::query(
            "INSERT INTO payments (id, registration_id, external_id, amount, status, payment_link, confirmation_token, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&payment.id)
        .bind(&payment.registration_id)
        .bind(&payment.external_id)
        .bind(payment.amount)
        .bind(payment.status)
        .bind(&payment.payment_link)
        .bind(&payment.confirmation_token)
        .bind(&payment.created_at)
        .execute(&self.pool)
        .await?;

        crate::audit::log_payment_event(
            registration_id,
            &payment.external_id,
            "created",
            payment.amount,
        );

        Ok(payment)
    }

    /// Apply a gateway-reported status to the payment with the given
    /// external id. Replaying the current status is a no-op; an illegal
    /// transition is rejected and the stored state left unchanged.
    pub async fn apply_gateway_status(
        &self,
        external_id: &str,
        new_status: PaymentStatus,
    ) -> Result<CallbackOutcome> {
        let mut payment = self
            .find_by_external_id(external_id)
            .await?
            .ok_or_else(|| RegistrationError::PaymentNotFound {
                external_id: external_id.to_string(),
            })?;

        if payment.status == new_status {
            return Ok(CallbackOutcome {
                payment,
                changed: false,
            });
        }

        if !legal_transition(payment.status, new_status) {
            tracing::warn!(
                "Rejected payment transition {} -> {} for {}",
                payment.status,
                new_status,
                external_id
            );
            return Err(RegistrationError::IllegalPaymentTransition {
                from: payment.status,
                to: new_status,
            }
            .into());
        }

        sqlx::query("UPDATE payments SET status = ? WHERE external_id = ?")
            .bind(new_status)
            .bind(external_id)
            .execute(&self.pool)
            .await?;

        payment.status = new_status;

        crate::audit::log_payment_event(
            &payment.registration_id,
            external_id,
            new_status.as_str(),
            payment.amount,
        );

        Ok(CallbackOutcome {
            payment,
            changed: true,
        })
    }

    /// Latest payment status for a registration, if it has any payments.
    pub async fn current_status(&self, registration_id: &str) -> Result<Option<PaymentStatus>> {
        let status: Option<(PaymentStatus,)> = sqlx::query_as(
            "SELECT status FROM payments WHERE registration_id = ? ORDER BY created_at DESC, id DESC LIMIT 1",
        )
        .bind(registration_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(status.map(|(s,)| s))
    }

    pub async fn find_by_external_id(&self, external_id: &str) -> Result<Option<Payment>> {
        Ok(
            sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE external_id = ?")
                .bind(external_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    pub async fn find_non_terminal(&self, registration_id: &str) -> Result<Option<Payment>> {
        Ok(sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE registration_id = ? AND status IN ('pending', 'waiting_for_capture') LIMIT 1",
        )
        .bind(registration_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    /// All payment attempts for a registration, oldest first.
    pub async fn list_for_registration(&self, registration_id: &str) -> Result<Vec<Payment>> {
        Ok(sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE registration_id = ? ORDER BY created_at, id",
        )
        .bind(registration_id)
        .fetch_all(&self.pool)
        .await?)
    }
}
