//! Typed errors for the registration core.
//!
//! Invariant violations are rejected at the component boundary and never
//! retried automatically; the HTTP layer maps each variant to a status
//! code and a stable error code.

use std::fmt;

use crate::db::models::{PaymentStatus, RegistrationStatus};

#[derive(Debug, Clone, PartialEq)]
pub enum RegistrationError {
    /// A live (PENDING or ACTIVE) registration already exists for this
    /// user and tournament.
    AlreadyRegistered {
        user_id: String,
        tournament_id: String,
    },

    /// User rank falls outside the tournament's rank band.
    NotEligible {
        rank: f64,
        rank_min: f64,
        rank_max: f64,
    },

    /// The tournament's start time has passed.
    RegistrationClosed,

    /// The registration is in a terminal status and cannot transition.
    AlreadyTerminal { status: RegistrationStatus },

    RegistrationNotFound { id: String },
    TournamentNotFound { id: String },
    PaymentNotFound { external_id: String },

    /// A non-terminal payment already exists for the registration.
    PaymentConflict { registration_id: String },

    /// The gateway reported a status the current payment state cannot
    /// reach (e.g. succeeded -> pending).
    IllegalPaymentTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },

    /// Payment was requested for a registration that does not hold a
    /// confirmed seat.
    NotConfirmed { registration_id: String },

    /// The tournament's rank band is misconfigured (min > max);
    /// eligibility fails closed.
    InvalidRankBand { min: f64, max: f64 },

    /// A callback contradicts the roster. Surfaced for operator
    /// investigation, never auto-corrected.
    InconsistentState(String),
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationError::AlreadyRegistered {
                user_id,
                tournament_id,
            } => {
                write!(
                    f,
                    "User {} is already registered for tournament {}",
                    user_id, tournament_id
                )
            }
            RegistrationError::NotEligible {
                rank,
                rank_min,
                rank_max,
            } => {
                write!(
                    f,
                    "User rank {:.1} is not within tournament range {:.1}-{:.1}",
                    rank, rank_min, rank_max
                )
            }
            RegistrationError::RegistrationClosed => {
                write!(f, "Tournament is no longer accepting registrations")
            }
            RegistrationError::AlreadyTerminal { status } => {
                write!(f, "Registration is already {}", status)
            }
            RegistrationError::RegistrationNotFound { id } => {
                write!(f, "Registration not found: {}", id)
            }
            RegistrationError::TournamentNotFound { id } => {
                write!(f, "Tournament not found: {}", id)
            }
            RegistrationError::PaymentNotFound { external_id } => {
                write!(f, "Payment not found: {}", external_id)
            }
            RegistrationError::PaymentConflict { registration_id } => {
                write!(
                    f,
                    "Registration {} already has an open payment",
                    registration_id
                )
            }
            RegistrationError::IllegalPaymentTransition { from, to } => {
                write!(f, "Illegal payment transition: {} -> {}", from, to)
            }
            RegistrationError::NotConfirmed { registration_id } => {
                write!(
                    f,
                    "Registration {} does not hold a confirmed seat",
                    registration_id
                )
            }
            RegistrationError::InvalidRankBand { min, max } => {
                write!(f, "Invalid rank band: min {:.1} > max {:.1}", min, max)
            }
            RegistrationError::InconsistentState(details) => {
                write!(f, "Inconsistent registration state: {}", details)
            }
        }
    }
}

impl std::error::Error for RegistrationError {}

/// Result type for registration core operations
pub type RegistrationResult<T> = Result<T, RegistrationError>;
