//! Structured audit logging for security-relevant events.
//!
//! Registration transitions, payment status changes, and admin mutations
//! are logged using tracing spans for structured output.

/// Log a registration lifecycle transition
pub fn log_registration_event(
    tournament_id: &str,
    registration_id: &str,
    event: &str,
    details: &str,
) {
    tracing::info!(
        target: "audit",
        event = "registration",
        tournament_id = tournament_id,
        registration_id = registration_id,
        registration_event = event,
        details = details,
        "Registration {}: {} - {}",
        registration_id,
        event,
        details
    );
}

/// Log a payment status change
pub fn log_payment_event(registration_id: &str, external_id: &str, event: &str, amount: i64) {
    tracing::info!(
        target: "audit",
        event = "payment",
        registration_id = registration_id,
        external_id = external_id,
        payment_event = event,
        amount = amount,
        "Payment {}: {} for registration {}",
        external_id,
        event,
        registration_id
    );
}

/// Log an admin mutation (tournament CRUD, forced cancellations)
pub fn log_admin_action(admin_id: &str, action: &str, subject: &str) {
    tracing::info!(
        target: "audit",
        event = "admin",
        admin_id = admin_id,
        action = action,
        subject = subject,
        "Admin {}: {} on {}",
        admin_id,
        action,
        subject
    );
}

/// Log an authentication event
pub fn log_auth_event(username: &str, event: &str, success: bool) {
    if success {
        tracing::info!(
            target: "audit",
            event = "auth",
            username = username,
            auth_event = event,
            success = success,
            "Auth: {} - {} (success={})",
            event,
            username,
            success
        );
    } else {
        tracing::warn!(
            target: "audit",
            event = "auth",
            username = username,
            auth_event = event,
            success = success,
            "Auth: {} - {} (success={})",
            event,
            username,
            success
        );
    }
}
