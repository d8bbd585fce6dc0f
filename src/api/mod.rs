pub mod auth;
pub mod registrations;
pub mod tournaments;
pub mod webhook;

pub use auth::{router as auth_router, AppState};
pub use registrations::router as registrations_router;
pub use tournaments::router as tournaments_router;
pub use webhook::router as webhook_router;
