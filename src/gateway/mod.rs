//! Payment gateway seam.
//!
//! The real provider lives outside this service and is reached through
//! `PaymentGateway`; its asynchronous status callbacks come back in via
//! the webhook route. The offline implementation below issues local
//! charge identifiers so development and tests run without network
//! access.

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// A charge to be created with the external provider.
#[derive(Debug, Clone)]
pub struct ChargeRequest {
    /// Amount in the smallest currency unit, after discounts.
    pub amount: i64,
    pub description: String,
    /// Where the payer lands after completing the flow.
    pub return_url: String,
    /// Key used to dedupe retried creations on the provider side.
    pub idempotency_key: String,
}

/// Provider-assigned handles for a created charge.
#[derive(Debug, Clone)]
pub struct Charge {
    pub external_id: String,
    pub payment_link: String,
    pub confirmation_token: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_charge(&self, req: ChargeRequest) -> Result<Charge>;
}

/// Offline gateway used in development and tests. Charges are accepted
/// unconditionally; status transitions are driven entirely through the
/// webhook route.
pub struct DevGateway;

#[async_trait]
impl PaymentGateway for DevGateway {
    async fn create_charge(&self, req: ChargeRequest) -> Result<Charge> {
        let external_id = Uuid::new_v4().to_string();

        tracing::debug!(
            "DevGateway charge {} created for {} ({})",
            external_id,
            req.amount,
            req.description
        );

        Ok(Charge {
            payment_link: format!("https://pay.dev.local/checkout/{}", external_id),
            confirmation_token: format!("ct-{}", external_id),
            external_id,
        })
    }
}
