//! # market-stripe
//!
//! Stripe payment intents for the tools marketplace.
//!
//! **StripePaymentIntents** creates a Payment Intent for an amount in minor
//! units and returns its client secret. The browser completes the payment
//! with Stripe.js; the order is then marked paid through the orders API.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use market_stripe::StripePaymentIntents;
//! use market_core::{Currency, PaymentIntentProvider};
//!
//! // Create provider from environment
//! let stripe = StripePaymentIntents::from_env()?;
//!
//! let amount = Currency::USD.to_smallest_unit(24.99)?;
//! let intent = stripe.create_payment_intent(amount, Currency::USD).await?;
//!
//! // Hand intent.client_secret to the browser
//! ```

pub mod config;
pub mod intents;

// Re-exports
pub use config::StripeConfig;
pub use intents::StripePaymentIntents;
