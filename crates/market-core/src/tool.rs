//! # Tools
//!
//! Catalog records. Tools are loosely structured: besides the known fields,
//! any extra fields the client sends are kept and returned as-is.

use crate::error::{MarketError, MarketResult};
use crate::loose;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A tool in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    /// Generated document id
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Display name
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Unit price (decimal, USD)
    #[serde(deserialize_with = "loose::number")]
    pub price: f64,

    /// Units available
    #[serde(default, deserialize_with = "loose::integer")]
    pub quantity: i64,

    /// Smallest quantity a buyer may order
    #[serde(
        default,
        deserialize_with = "loose::optional_integer",
        skip_serializing_if = "Option::is_none"
    )]
    pub minimum_order: Option<i64>,

    /// Supplier name or contact
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,

    /// Free-form fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Tool {
    pub fn new(name: impl Into<String>, price: f64, quantity: i64) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: String::new(),
            image: None,
            price,
            quantity,
            minimum_order: None,
            supplier: None,
            extra: Map::new(),
        }
    }

    /// Builder: set supplier
    pub fn with_supplier(mut self, supplier: impl Into<String>) -> Self {
        self.supplier = Some(supplier.into());
        self
    }

    /// Check the fields a catalog entry cannot do without
    pub fn validate(&self) -> MarketResult<()> {
        if self.name.trim().is_empty() {
            return Err(MarketError::InvalidRequest("tool name is required".to_string()));
        }
        validate_price(self.price)?;
        validate_quantity(self.quantity)?;
        if let Some(min) = self.minimum_order {
            validate_quantity(min)?;
        }
        Ok(())
    }
}

/// Partial update applied with `$set` semantics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(
        default,
        deserialize_with = "loose::optional_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<f64>,
    #[serde(
        default,
        deserialize_with = "loose::optional_integer",
        skip_serializing_if = "Option::is_none"
    )]
    pub quantity: Option<i64>,
    #[serde(
        default,
        deserialize_with = "loose::optional_integer",
        skip_serializing_if = "Option::is_none"
    )]
    pub minimum_order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ToolUpdate {
    /// Drop fields a client must not overwrite and check the rest
    pub fn sanitized(mut self) -> MarketResult<Self> {
        self.extra.remove("_id");
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(MarketError::InvalidRequest("tool name cannot be empty".to_string()));
            }
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        if let Some(quantity) = self.quantity {
            validate_quantity(quantity)?;
        }
        if let Some(min) = self.minimum_order {
            validate_quantity(min)?;
        }
        if self.is_empty() {
            return Err(MarketError::InvalidRequest("no fields to update".to_string()));
        }
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.image.is_none()
            && self.price.is_none()
            && self.quantity.is_none()
            && self.minimum_order.is_none()
            && self.supplier.is_none()
            && self.extra.is_empty()
    }
}

fn validate_price(price: f64) -> MarketResult<()> {
    if !price.is_finite() || price < 0.0 {
        return Err(MarketError::InvalidRequest(format!("invalid price: {}", price)));
    }
    Ok(())
}

fn validate_quantity(quantity: i64) -> MarketResult<()> {
    if quantity < 0 {
        return Err(MarketError::InvalidRequest(format!(
            "quantity cannot be negative: {}",
            quantity
        )));
    }
    Ok(())
}
