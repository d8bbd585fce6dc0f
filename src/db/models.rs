use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Numeric skill rank used for tournament eligibility.
    pub rank: f64,
    pub loyalty_id: Option<i64>,
    pub is_superuser: bool,
    pub created_at: String,
}

impl User {
    pub fn new(username: String, email: String, password_hash: String, rank: f64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            username,
            email,
            password_hash,
            rank,
            loyalty_id: None,
            is_superuser: false,
            created_at: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LoyaltyLevel {
    pub id: i64,
    pub name: String,
    /// Discount percentage applied to tournament prices.
    pub discount: i64,
}

// Club CRUD lives in the admin back office; rows here only anchor
// tournament references.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Club {
    pub id: String,
    pub name: String,
    pub created_at: String,
}

impl Club {
    pub fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            created_at: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tournament {
    pub id: String,
    pub club_id: String,
    pub name: String,
    pub start_time: String,
    pub end_time: Option<String>,
    /// Price in the smallest currency unit. Zero means a free tournament.
    pub price: i64,
    pub rank_min: f64,
    pub rank_max: f64,
    pub max_users: i32,
    pub tournament_type: String,
    pub organizer_id: String,
    pub is_deleted: bool,
    pub created_at: String,
}

impl Tournament {
    pub fn new(
        club_id: String,
        name: String,
        start_time: String,
        end_time: Option<String>,
        price: i64,
        rank_min: f64,
        rank_max: f64,
        max_users: i32,
        tournament_type: String,
        organizer_id: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            club_id,
            name,
            start_time,
            end_time,
            price,
            rank_min,
            rank_max,
            max_users,
            tournament_type,
            organizer_id,
            is_deleted: false,
            created_at: Utc::now().to_rfc3339(),
        }
    }
}

// ============================================================================
// Registration Models
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistrationStatus {
    Pending,
    Active,
    Canceled,
    CanceledByUser,
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Pending => "PENDING",
            RegistrationStatus::Active => "ACTIVE",
            RegistrationStatus::Canceled => "CANCELED",
            RegistrationStatus::CanceledByUser => "CANCELED_BY_USER",
        }
    }

    /// Terminal statuses permit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RegistrationStatus::Canceled | RegistrationStatus::CanceledByUser
        )
    }
}

impl std::fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a live registration sits in the roster: holding a confirmed seat
/// or queued on the waitlist. NULL in storage once the registration is
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SeatState {
    Confirmed,
    Waitlisted,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Registration {
    pub id: String,
    pub user_id: String,
    pub tournament_id: String,
    pub status: RegistrationStatus,
    pub seat_state: Option<SeatState>,
    pub created_at: String,
}

impl Registration {
    pub fn new(user_id: String, tournament_id: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            tournament_id,
            status: RegistrationStatus::Pending,
            seat_state: None,
            created_at: Utc::now().to_rfc3339(),
        }
    }
}

// ============================================================================
// Payment Models
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    WaitingForCapture,
    Succeeded,
    Canceled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::WaitingForCapture => "waiting_for_capture",
            PaymentStatus::Succeeded => "succeeded",
            PaymentStatus::Canceled => "canceled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Succeeded | PaymentStatus::Canceled)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub id: String,
    pub registration_id: String,
    /// Identifier assigned by the payment gateway; callbacks are keyed by it.
    pub external_id: String,
    pub amount: i64,
    pub status: PaymentStatus,
    pub payment_link: String,
    pub confirmation_token: String,
    pub created_at: String,
}

impl Payment {
    pub fn new(
        registration_id: String,
        external_id: String,
        amount: i64,
        payment_link: String,
        confirmation_token: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            registration_id,
            external_id,
            amount,
            status: PaymentStatus::Pending,
            payment_link,
            confirmation_token,
            created_at: Utc::now().to_rfc3339(),
        }
    }
}
