//! Integration tests for the registration lifecycle:
//! - capacity-bounded roster and FIFO waitlist
//! - payment reconciliation through the webhook route
//! - waitlist promotion when seats free up
//! - cancellation semantics for users and admins

use axum::http::{header::AUTHORIZATION, HeaderValue};
use axum_test::TestServer;
use chrono::{Duration, Utc};
use padel_server::{api::AppState, create_test_app};
use serde_json::{json, Value};
use std::sync::Arc;

/// Helper to create a test server instance
async fn setup() -> (TestServer, Arc<AppState>) {
    let (app, state) = create_test_app().await;
    (TestServer::new(app).unwrap(), state)
}

fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
}

/// Helper to register a user and return (token, user_id)
async fn register_user(server: &TestServer, username: &str, rank: f64) -> (String, String) {
    let response = server
        .post("/api/auth/register")
        .json(&json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": "password123",
            "rank": rank
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let token = body["token"].as_str().unwrap().to_string();
    let user_id = body["user"]["id"].as_str().unwrap().to_string();
    (token, user_id)
}

/// Helper to create a superuser and return (token, user_id)
async fn create_admin(
    server: &TestServer,
    state: &Arc<AppState>,
    username: &str,
) -> (String, String) {
    let (_, user_id) = register_user(server, username, 5.0).await;

    sqlx::query("UPDATE users SET is_superuser = 1 WHERE id = ?")
        .bind(&user_id)
        .execute(&state.pool)
        .await
        .unwrap();

    // Log in again so the token carries the superuser claim
    let response = server
        .post("/api/auth/login")
        .json(&json!({
            "username": username,
            "password": "password123"
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let token = body["token"].as_str().unwrap().to_string();
    (token, user_id)
}

/// Helper to create a tournament and return its id
async fn create_tournament(
    server: &TestServer,
    admin_token: &str,
    price: i64,
    rank_min: f64,
    rank_max: f64,
    max_users: i32,
) -> String {
    let start_time = (Utc::now() + Duration::days(1)).to_rfc3339();

    let response = server
        .post("/api/tournaments/")
        .add_header(AUTHORIZATION, bearer(admin_token))
        .json(&json!({
            "club_id": "club-1",
            "name": "Test Open",
            "start_time": start_time,
            "price": price,
            "rank_min": rank_min,
            "rank_max": rank_max,
            "max_users": max_users,
            "tournament_type": "americano"
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    body["tournament"]["id"].as_str().unwrap().to_string()
}

async fn register_for(server: &TestServer, token: &str, tournament_id: &str) -> Value {
    let response = server
        .post(&format!("/api/registrations/tournament/{}", tournament_id))
        .add_header(AUTHORIZATION, bearer(token))
        .await;

    response.assert_status_ok();
    response.json()
}

async fn send_webhook(server: &TestServer, external_id: &str, status: &str) -> axum_test::TestResponse {
    server
        .post("/api/webhook/")
        .json(&json!({
            "event": "payment.status_changed",
            "object": { "id": external_id, "status": status }
        }))
        .await
}

// ============================================================================
// Roster and Waitlist Tests
// ============================================================================

#[tokio::test]
async fn test_registration_fills_seats_then_waitlists() {
    let (server, state) = setup().await;
    let (admin_token, _) = create_admin(&server, &state, "admin").await;
    let tournament_id = create_tournament(&server, &admin_token, 2000, 0.0, 7.0, 2).await;

    let (t1, _) = register_user(&server, "player1", 3.0).await;
    let (t2, _) = register_user(&server, "player2", 3.0).await;
    let (t3, _) = register_user(&server, "player3", 3.0).await;

    let r1 = register_for(&server, &t1, &tournament_id).await;
    assert_eq!(r1["registration"]["status"], "PENDING");
    assert_eq!(r1["registration"]["seat_state"], "confirmed");
    assert!(r1["payment"]["external_id"].as_str().is_some());

    let r2 = register_for(&server, &t2, &tournament_id).await;
    assert_eq!(r2["registration"]["seat_state"], "confirmed");

    // Third registration exceeds max_users=2 and lands on the waitlist
    // with no payment requested.
    let r3 = register_for(&server, &t3, &tournament_id).await;
    assert_eq!(r3["registration"]["status"], "PENDING");
    assert_eq!(r3["registration"]["seat_state"], "waitlisted");
    assert_eq!(r3["waitlist_position"], 1);
    assert!(r3["payment"].is_null());
}

#[tokio::test]
async fn test_payment_cancellation_promotes_waitlist_head() {
    let (server, state) = setup().await;
    let (admin_token, _) = create_admin(&server, &state, "admin").await;
    let tournament_id = create_tournament(&server, &admin_token, 2000, 0.0, 7.0, 2).await;

    let (t1, _) = register_user(&server, "player1", 3.0).await;
    let (t2, _) = register_user(&server, "player2", 3.0).await;
    let (t3, _) = register_user(&server, "player3", 3.0).await;

    let r1 = register_for(&server, &t1, &tournament_id).await;
    register_for(&server, &t2, &tournament_id).await;
    let r3 = register_for(&server, &t3, &tournament_id).await;

    let u1_payment = r1["payment"]["external_id"].as_str().unwrap().to_string();
    let r1_id = r1["registration"]["id"].as_str().unwrap().to_string();
    let r3_id = r3["registration"]["id"].as_str().unwrap().to_string();

    // U1's payment is canceled by the gateway: the registration is
    // canceled, the seat frees up, and U3 is promoted off the waitlist.
    send_webhook(&server, &u1_payment, "canceled").await.assert_status_ok();

    let detail = server
        .get(&format!("/api/registrations/{}", r1_id))
        .add_header(AUTHORIZATION, bearer(&t1))
        .await;
    detail.assert_status_ok();
    let detail: Value = detail.json();
    assert_eq!(detail["registration"]["status"], "CANCELED");
    assert!(detail["registration"]["seat_state"].is_null());

    let promoted = server
        .get(&format!("/api/registrations/{}", r3_id))
        .add_header(AUTHORIZATION, bearer(&t3))
        .await;
    promoted.assert_status_ok();
    let promoted: Value = promoted.json();
    assert_eq!(promoted["registration"]["status"], "PENDING");
    assert_eq!(promoted["registration"]["seat_state"], "confirmed");
    assert!(promoted["waitlist_position"].is_null());
    // Promotion triggered a fresh payment request for U3.
    assert_eq!(promoted["payments"].as_array().unwrap().len(), 1);
    assert_eq!(promoted["payments"][0]["status"], "pending");
}

#[tokio::test]
async fn test_cancel_active_registration_frees_exactly_one_seat() {
    let (server, state) = setup().await;
    let (admin_token, _) = create_admin(&server, &state, "admin").await;
    let tournament_id = create_tournament(&server, &admin_token, 2000, 0.0, 7.0, 2).await;

    let (t1, _) = register_user(&server, "player1", 3.0).await;
    let (t2, _) = register_user(&server, "player2", 3.0).await;
    let (t3, _) = register_user(&server, "player3", 3.0).await;
    let (t4, _) = register_user(&server, "player4", 3.0).await;

    let r1 = register_for(&server, &t1, &tournament_id).await;
    register_for(&server, &t2, &tournament_id).await;
    let r3 = register_for(&server, &t3, &tournament_id).await;
    let r4 = register_for(&server, &t4, &tournament_id).await;
    assert_eq!(r3["waitlist_position"], 1);
    assert_eq!(r4["waitlist_position"], 2);

    // U1 pays and becomes ACTIVE.
    let u1_payment = r1["payment"]["external_id"].as_str().unwrap();
    send_webhook(&server, u1_payment, "succeeded").await.assert_status_ok();

    // U1 cancels: exactly one seat frees, and only the waitlist head
    // (U3) is promoted; U4 moves up but stays waitlisted.
    let r1_id = r1["registration"]["id"].as_str().unwrap();
    let response = server
        .delete(&format!("/api/registrations/{}", r1_id))
        .add_header(AUTHORIZATION, bearer(&t1))
        .await;
    response.assert_status_ok();
    let canceled: Value = response.json();
    assert_eq!(canceled["status"], "CANCELED_BY_USER");

    let r3_id = r3["registration"]["id"].as_str().unwrap();
    let promoted = server
        .get(&format!("/api/registrations/{}", r3_id))
        .add_header(AUTHORIZATION, bearer(&t3))
        .await;
    let promoted: Value = promoted.json();
    assert_eq!(promoted["registration"]["seat_state"], "confirmed");

    let r4_id = r4["registration"]["id"].as_str().unwrap();
    let waiting = server
        .get(&format!("/api/registrations/{}/waitlist-position", r4_id))
        .add_header(AUTHORIZATION, bearer(&t4))
        .await;
    let waiting: Value = waiting.json();
    assert_eq!(waiting["waitlist_position"], 1);
}

#[tokio::test]
async fn test_cancel_is_idempotent() {
    let (server, state) = setup().await;
    let (admin_token, _) = create_admin(&server, &state, "admin").await;
    let tournament_id = create_tournament(&server, &admin_token, 2000, 0.0, 7.0, 4).await;

    let (t1, _) = register_user(&server, "player1", 3.0).await;
    let r1 = register_for(&server, &t1, &tournament_id).await;
    let r1_id = r1["registration"]["id"].as_str().unwrap();

    let first = server
        .delete(&format!("/api/registrations/{}", r1_id))
        .add_header(AUTHORIZATION, bearer(&t1))
        .await;
    first.assert_status_ok();

    // Canceling a registration that is already terminal is a no-op.
    let second = server
        .delete(&format!("/api/registrations/{}", r1_id))
        .add_header(AUTHORIZATION, bearer(&t1))
        .await;
    second.assert_status_ok();
    let body: Value = second.json();
    assert_eq!(body["status"], "CANCELED_BY_USER");
}

#[tokio::test]
async fn test_admin_cancel_lands_in_canceled() {
    let (server, state) = setup().await;
    let (admin_token, _) = create_admin(&server, &state, "admin").await;
    let tournament_id = create_tournament(&server, &admin_token, 2000, 0.0, 7.0, 4).await;

    let (t1, _) = register_user(&server, "player1", 3.0).await;
    let r1 = register_for(&server, &t1, &tournament_id).await;
    let r1_id = r1["registration"]["id"].as_str().unwrap();

    let response = server
        .delete(&format!("/api/registrations/{}/admin", r1_id))
        .add_header(AUTHORIZATION, bearer(&admin_token))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "CANCELED");

    // A regular user cannot use the admin cancel route.
    let (t2, _) = register_user(&server, "player2", 3.0).await;
    let r2 = register_for(&server, &t2, &tournament_id).await;
    let r2_id = r2["registration"]["id"].as_str().unwrap();

    let forbidden = server
        .delete(&format!("/api/registrations/{}/admin", r2_id))
        .add_header(AUTHORIZATION, bearer(&t2))
        .await;
    forbidden.assert_status_forbidden();
}

// ============================================================================
// Eligibility and Duplicate Registration Tests
// ============================================================================

#[tokio::test]
async fn test_ineligible_rank_is_rejected_without_roster_mutation() {
    let (server, state) = setup().await;
    let (admin_token, _) = create_admin(&server, &state, "admin").await;
    let tournament_id = create_tournament(&server, &admin_token, 2000, 3.5, 7.0, 4).await;

    let (token, _) = register_user(&server, "rookie", 2.0).await;

    let response = server
        .post(&format!("/api/registrations/tournament/{}", tournament_id))
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["code"], "not_eligible");

    // No registration row was created.
    let detail = server
        .get(&format!("/api/tournaments/{}", tournament_id))
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    let detail: Value = detail.json();
    assert_eq!(detail["participants"].as_array().unwrap().len(), 0);
    assert_eq!(detail["waitlist"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_duplicate_registration_is_rejected() {
    let (server, state) = setup().await;
    let (admin_token, _) = create_admin(&server, &state, "admin").await;
    let tournament_id = create_tournament(&server, &admin_token, 2000, 0.0, 7.0, 4).await;

    let (token, _) = register_user(&server, "player1", 3.0).await;

    register_for(&server, &token, &tournament_id).await;

    let response = server
        .post(&format!("/api/registrations/tournament/{}", tournament_id))
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status(axum::http::StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["code"], "already_registered");

    // Exactly one registration row exists for the pair.
    let detail = server
        .get(&format!("/api/tournaments/{}", tournament_id))
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    let detail: Value = detail.json();
    assert_eq!(detail["participants"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_reregistration_after_cancel_creates_a_new_row() {
    let (server, state) = setup().await;
    let (admin_token, _) = create_admin(&server, &state, "admin").await;
    let tournament_id = create_tournament(&server, &admin_token, 2000, 0.0, 7.0, 4).await;

    let (token, _) = register_user(&server, "player1", 3.0).await;

    let first = register_for(&server, &token, &tournament_id).await;
    let first_id = first["registration"]["id"].as_str().unwrap().to_string();

    server
        .delete(&format!("/api/registrations/{}", first_id))
        .add_header(AUTHORIZATION, bearer(&token))
        .await
        .assert_status_ok();

    let second = register_for(&server, &token, &tournament_id).await;
    let second_id = second["registration"]["id"].as_str().unwrap();
    assert_ne!(first_id, second_id);

    // The canceled row is preserved as audit history.
    let mine = server
        .get("/api/registrations/my")
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    let mine: Value = mine.json();
    assert_eq!(mine.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_registration_closed_after_start_time() {
    let (server, state) = setup().await;
    let (admin_token, _) = create_admin(&server, &state, "admin").await;

    // Start time in the past
    let start_time = (Utc::now() - Duration::hours(1)).to_rfc3339();
    let response = server
        .post("/api/tournaments/")
        .add_header(AUTHORIZATION, bearer(&admin_token))
        .json(&json!({
            "club_id": "club-1",
            "name": "Started Open",
            "start_time": start_time,
            "price": 2000,
            "rank_min": 0.0,
            "rank_max": 7.0,
            "max_users": 4,
            "tournament_type": "americano"
        }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    let tournament_id = body["tournament"]["id"].as_str().unwrap();

    let (token, _) = register_user(&server, "latecomer", 3.0).await;
    let response = server
        .post(&format!("/api/registrations/tournament/{}", tournament_id))
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["code"], "registration_closed");
}

// ============================================================================
// Payment Reconciliation Tests
// ============================================================================

#[tokio::test]
async fn test_succeeded_callback_activates_registration() {
    let (server, state) = setup().await;
    let (admin_token, _) = create_admin(&server, &state, "admin").await;
    let tournament_id = create_tournament(&server, &admin_token, 2000, 0.0, 7.0, 4).await;

    let (token, _) = register_user(&server, "player1", 3.0).await;
    let r = register_for(&server, &token, &tournament_id).await;
    let external_id = r["payment"]["external_id"].as_str().unwrap();
    let reg_id = r["registration"]["id"].as_str().unwrap();

    send_webhook(&server, external_id, "succeeded").await.assert_status_ok();

    let detail = server
        .get(&format!("/api/registrations/{}", reg_id))
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    let detail: Value = detail.json();
    assert_eq!(detail["registration"]["status"], "ACTIVE");
}

#[tokio::test]
async fn test_replayed_callback_is_a_noop() {
    let (server, state) = setup().await;
    let (admin_token, _) = create_admin(&server, &state, "admin").await;
    let tournament_id = create_tournament(&server, &admin_token, 2000, 0.0, 7.0, 4).await;

    let (token, _) = register_user(&server, "player1", 3.0).await;
    let r = register_for(&server, &token, &tournament_id).await;
    let external_id = r["payment"]["external_id"].as_str().unwrap();
    let reg_id = r["registration"]["id"].as_str().unwrap();

    send_webhook(&server, external_id, "succeeded").await.assert_status_ok();
    send_webhook(&server, external_id, "succeeded").await.assert_status_ok();

    let detail = server
        .get(&format!("/api/registrations/{}", reg_id))
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    let detail: Value = detail.json();
    assert_eq!(detail["registration"]["status"], "ACTIVE");
    assert_eq!(detail["payments"].as_array().unwrap().len(), 1);
    assert_eq!(detail["payments"][0]["status"], "succeeded");
    assert_eq!(detail["payment_status"], "succeeded");
}

#[tokio::test]
async fn test_illegal_payment_transition_is_rejected() {
    let (server, state) = setup().await;
    let (admin_token, _) = create_admin(&server, &state, "admin").await;
    let tournament_id = create_tournament(&server, &admin_token, 2000, 0.0, 7.0, 4).await;

    let (token, _) = register_user(&server, "player1", 3.0).await;
    let r = register_for(&server, &token, &tournament_id).await;
    let external_id = r["payment"]["external_id"].as_str().unwrap();
    let reg_id = r["registration"]["id"].as_str().unwrap();

    send_webhook(&server, external_id, "canceled").await.assert_status_ok();

    // canceled is terminal; a late "succeeded" must not resurrect it.
    let response = send_webhook(&server, external_id, "succeeded").await;
    response.assert_status(axum::http::StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["code"], "illegal_payment_transition");

    let detail = server
        .get(&format!("/api/registrations/{}", reg_id))
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    let detail: Value = detail.json();
    assert_eq!(detail["registration"]["status"], "CANCELED");
    assert_eq!(detail["payments"][0]["status"], "canceled");
}

#[tokio::test]
async fn test_unknown_payment_callback_is_not_found() {
    let (server, _state) = setup().await;

    let response = send_webhook(&server, "no-such-payment", "succeeded").await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn test_succeeded_callback_for_waitlisted_seat_is_inconsistent() {
    let (server, state) = setup().await;
    let (admin_token, _) = create_admin(&server, &state, "admin").await;
    let tournament_id = create_tournament(&server, &admin_token, 2000, 0.0, 7.0, 2).await;

    let (t1, _) = register_user(&server, "player1", 3.0).await;
    let (t2, _) = register_user(&server, "player2", 3.0).await;
    let (t3, _) = register_user(&server, "player3", 3.0).await;

    register_for(&server, &t1, &tournament_id).await;
    register_for(&server, &t2, &tournament_id).await;
    let r3 = register_for(&server, &t3, &tournament_id).await;
    let r3_id = r3["registration"]["id"].as_str().unwrap();

    // Waitlisted registrations never get payments; forge one to simulate
    // a gateway callback contradicting the roster.
    sqlx::query(
        "INSERT INTO payments (id, registration_id, external_id, amount, status, payment_link, confirmation_token, created_at)
         VALUES ('p-forged', ?, 'ext-forged', 2000, 'pending', '', '', ?)",
    )
    .bind(r3_id)
    .bind(Utc::now().to_rfc3339())
    .execute(&state.pool)
    .await
    .unwrap();

    let response = send_webhook(&server, "ext-forged", "succeeded").await;
    response.assert_status(axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["code"], "inconsistent_state");

    // The registration was not silently activated.
    let detail = server
        .get(&format!("/api/registrations/{}", r3_id))
        .add_header(AUTHORIZATION, bearer(&t3))
        .await;
    let detail: Value = detail.json();
    assert_eq!(detail["registration"]["status"], "PENDING");
    assert_eq!(detail["registration"]["seat_state"], "waitlisted");
}

// ============================================================================
// Free Tournament and Payment Retry Tests
// ============================================================================

#[tokio::test]
async fn test_free_tournament_activates_immediately() {
    let (server, state) = setup().await;
    let (admin_token, _) = create_admin(&server, &state, "admin").await;
    let tournament_id = create_tournament(&server, &admin_token, 0, 0.0, 7.0, 4).await;

    let (token, _) = register_user(&server, "player1", 3.0).await;
    let r = register_for(&server, &token, &tournament_id).await;

    assert_eq!(r["registration"]["status"], "ACTIVE");
    assert!(r["payment"].is_null());
}

#[tokio::test]
async fn test_duplicate_payment_conflicts_and_cancel_allows_reentry() {
    let (server, state) = setup().await;
    let (admin_token, _) = create_admin(&server, &state, "admin").await;
    let tournament_id = create_tournament(&server, &admin_token, 2000, 0.0, 7.0, 4).await;

    let (token, _) = register_user(&server, "player1", 3.0).await;
    let r = register_for(&server, &token, &tournament_id).await;
    let reg_id = r["registration"]["id"].as_str().unwrap();
    let first_payment = r["payment"]["external_id"].as_str().unwrap();

    // A second request while the first payment is open conflicts.
    let conflict = server
        .post(&format!("/api/registrations/{}/payment", reg_id))
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    conflict.assert_status(axum::http::StatusCode::CONFLICT);
    let body: Value = conflict.json();
    assert_eq!(body["code"], "payment_conflict");

    // The gateway cancels the attempt (timeout, user abandoned the
    // flow, ...): the registration is canceled with it, and the user can
    // register again with a fresh row and a fresh payment.
    send_webhook(&server, first_payment, "canceled").await.assert_status_ok();

    let r = register_for(&server, &token, &tournament_id).await;
    let reg_id = r["registration"]["id"].as_str().unwrap();
    assert_eq!(r["registration"]["seat_state"], "confirmed");
    assert!(r["payment"]["external_id"].as_str().is_some());

    let detail = server
        .get(&format!("/api/registrations/{}", reg_id))
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    let detail: Value = detail.json();
    assert_eq!(detail["payments"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_loyalty_discount_reduces_payment_amount() {
    let (server, state) = setup().await;
    let (admin_token, _) = create_admin(&server, &state, "admin").await;
    let tournament_id = create_tournament(&server, &admin_token, 2000, 0.0, 7.0, 4).await;

    let (token, user_id) = register_user(&server, "goldmember", 3.0).await;
    // Gold level is seeded with a 10% discount.
    sqlx::query("UPDATE users SET loyalty_id = 3 WHERE id = ?")
        .bind(&user_id)
        .execute(&state.pool)
        .await
        .unwrap();

    let r = register_for(&server, &token, &tournament_id).await;
    assert_eq!(r["payment"]["amount"], 1800);
}

#[tokio::test]
async fn test_waitlisted_registration_cannot_request_payment() {
    let (server, state) = setup().await;
    let (admin_token, _) = create_admin(&server, &state, "admin").await;
    let tournament_id = create_tournament(&server, &admin_token, 2000, 0.0, 7.0, 2).await;

    let (t1, _) = register_user(&server, "player1", 3.0).await;
    let (t2, _) = register_user(&server, "player2", 3.0).await;
    let (t3, _) = register_user(&server, "player3", 3.0).await;

    register_for(&server, &t1, &tournament_id).await;
    register_for(&server, &t2, &tournament_id).await;
    let r3 = register_for(&server, &t3, &tournament_id).await;
    let r3_id = r3["registration"]["id"].as_str().unwrap();

    let response = server
        .post(&format!("/api/registrations/{}/payment", r3_id))
        .add_header(AUTHORIZATION, bearer(&t3))
        .await;
    response.assert_status(axum::http::StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["code"], "not_confirmed");
}
