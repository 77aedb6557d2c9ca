//! # Order Types
//!
//! Orders placed by buyers and the payment records appended when an order
//! is paid.

use crate::error::{MarketError, MarketResult};
use crate::loose;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Shipping state of an order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingStatus {
    /// Placed, not yet shipped
    #[default]
    Pending,
    /// Shipped by an admin
    Shipped,
}

impl ShippingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShippingStatus::Pending => "pending",
            ShippingStatus::Shipped => "shipped",
        }
    }
}

/// A stored order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Owning buyer's email
    pub email: String,

    /// Buyer's display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Referenced tool id (copied, not enforced)
    pub tool_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,

    #[serde(deserialize_with = "loose::integer")]
    pub quantity: i64,

    #[serde(deserialize_with = "loose::number")]
    pub total_price: f64,

    #[serde(default)]
    pub status: ShippingStatus,

    #[serde(default)]
    pub paid: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// Order as submitted by a buyer
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    /// Defaults to the authenticated caller's email
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub tool_id: String,
    #[serde(default)]
    pub tool_name: Option<String>,
    #[serde(deserialize_with = "loose::integer")]
    pub quantity: i64,
    #[serde(deserialize_with = "loose::number")]
    pub total_price: f64,
}

impl NewOrder {
    /// Build the stored order; `caller_email` fills a missing owner
    pub fn into_order(self, caller_email: &str) -> MarketResult<Order> {
        if self.tool_id.trim().is_empty() {
            return Err(MarketError::InvalidRequest("toolId is required".to_string()));
        }
        if self.quantity <= 0 {
            return Err(MarketError::InvalidRequest(format!(
                "quantity must be positive, got {}",
                self.quantity
            )));
        }
        if !self.total_price.is_finite() || self.total_price < 0.0 {
            return Err(MarketError::InvalidRequest(format!(
                "invalid totalPrice: {}",
                self.total_price
            )));
        }

        Ok(Order {
            id: None,
            email: self.email.unwrap_or_else(|| caller_email.to_string()),
            name: self.name,
            tool_id: self.tool_id,
            tool_name: self.tool_name,
            quantity: self.quantity,
            total_price: self.total_price,
            status: ShippingStatus::Pending,
            paid: false,
            transaction_id: None,
            created_at: Utc::now(),
        })
    }
}

/// Body of a payment confirmation
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfirmation {
    pub transaction_id: String,
    #[serde(default, deserialize_with = "loose::optional_number")]
    pub amount: Option<f64>,
}

/// Transaction record appended when an order is paid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub order_id: String,
    pub transaction_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(
        default,
        deserialize_with = "loose::optional_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub amount: Option<f64>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl PaymentConfirmation {
    /// Build the payment record for `order_id`, paid by `payer`
    pub fn into_payment(self, order_id: &str, payer: &str) -> MarketResult<Payment> {
        if self.transaction_id.trim().is_empty() {
            return Err(MarketError::InvalidRequest(
                "transactionId is required".to_string(),
            ));
        }
        Ok(Payment {
            id: None,
            order_id: order_id.to_string(),
            transaction_id: self.transaction_id,
            email: Some(payer.to_string()),
            amount: self.amount,
            created_at: Utc::now(),
        })
    }
}
