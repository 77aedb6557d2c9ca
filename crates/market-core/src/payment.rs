//! # Payment Intent Provider Trait
//!
//! Seam for the external payment API.
//! Implementations: Stripe (`market-stripe`).
//!
//! The marketplace never charges cards itself. It asks the provider for a
//! payment intent and hands the intent's client secret to the browser, which
//! completes the payment directly with the provider.

use crate::error::MarketResult;
use crate::money::Currency;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A payment intent created by a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    /// Provider's intent ID
    pub id: String,

    /// Secret the client uses to confirm the payment
    pub client_secret: String,

    /// Amount in the smallest currency unit
    pub amount: i64,

    pub currency: Currency,

    /// Provider status (e.g. "requires_payment_method")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Core trait for payment providers.
#[async_trait]
pub trait PaymentIntentProvider: Send + Sync {
    /// Create a payment intent for `amount` minor units of `currency`.
    async fn create_payment_intent(
        &self,
        amount: i64,
        currency: Currency,
    ) -> MarketResult<PaymentIntent>;

    /// Get the provider name (for logging).
    fn provider_name(&self) -> &'static str;
}

/// Type alias for a shared payment provider (dynamic dispatch)
pub type BoxedPaymentProvider = Arc<dyn PaymentIntentProvider>;
