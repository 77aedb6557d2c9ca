//! # Document Store Trait
//!
//! Storage seam for the marketplace collections.
//! Implementations: MongoDB (`market-mongo`) and the in-memory store.
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │              MarketStore (trait)              │
//! │  tools · orders · reviews · users · payments  │
//! └───────────────────────────────────────────────┘
//!                        ▲
//!              ┌─────────┴─────────┐
//!      ┌───────┴──────┐    ┌───────┴──────┐
//!      │  MongoStore  │    │ MemoryStore  │
//!      └──────────────┘    └──────────────┘
//! ```
//!
//! Every method maps to a single collection operation, except
//! [`MarketStore::confirm_payment`] which appends to `payments` and then
//! updates `orders`. Write methods return the driver-shaped outcome that the
//! HTTP layer hands back to clients unchanged.

use crate::error::MarketResult;
use crate::order::{Order, Payment, ShippingStatus};
use crate::review::Review;
use crate::tool::{Tool, ToolUpdate};
use crate::user::{Role, User, UserProfile};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Collection names shared by all backends
pub mod collections {
    pub const TOOLS: &str = "tools";
    pub const ORDERS: &str = "orders";
    pub const REVIEWS: &str = "reviews";
    pub const USERS: &str = "users";
    pub const PAYMENTS: &str = "payments";
}

/// Result of a single-document insert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertOutcome {
    pub acknowledged: bool,
    pub inserted_id: String,
}

impl InsertOutcome {
    pub fn new(inserted_id: impl Into<String>) -> Self {
        Self {
            acknowledged: true,
            inserted_id: inserted_id.into(),
        }
    }
}

/// Result of a single-document update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_id: Option<String>,
}

impl UpdateOutcome {
    pub fn new(matched_count: u64, modified_count: u64) -> Self {
        Self {
            acknowledged: true,
            matched_count,
            modified_count,
            upserted_id: None,
        }
    }

    pub fn upserted(id: impl Into<String>) -> Self {
        Self {
            acknowledged: true,
            matched_count: 0,
            modified_count: 0,
            upserted_id: Some(id.into()),
        }
    }
}

/// Result of a single-document delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

impl DeleteOutcome {
    pub fn new(deleted_count: u64) -> Self {
        Self {
            acknowledged: true,
            deleted_count,
        }
    }
}

/// Outcome of registering a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    Created(InsertOutcome),
    AlreadyExists,
}

/// Storage operations over the marketplace collections.
///
/// Lists come back in storage order; callers wanting newest-first use
/// [`newest_first`].
#[async_trait]
pub trait MarketStore: Send + Sync {
    /// Backend name for logging
    fn backend_name(&self) -> &'static str;

    // --- tools ---
    async fn list_tools(&self) -> MarketResult<Vec<Tool>>;
    async fn find_tool(&self, id: &str) -> MarketResult<Option<Tool>>;
    async fn insert_tool(&self, tool: Tool) -> MarketResult<InsertOutcome>;
    async fn update_tool(&self, id: &str, update: ToolUpdate) -> MarketResult<UpdateOutcome>;
    async fn delete_tool(&self, id: &str) -> MarketResult<DeleteOutcome>;

    // --- orders ---
    async fn list_orders(&self) -> MarketResult<Vec<Order>>;
    async fn orders_for(&self, email: &str) -> MarketResult<Vec<Order>>;
    async fn find_order(&self, id: &str) -> MarketResult<Option<Order>>;
    async fn insert_order(&self, order: Order) -> MarketResult<InsertOutcome>;
    async fn set_order_status(
        &self,
        id: &str,
        status: ShippingStatus,
    ) -> MarketResult<UpdateOutcome>;
    /// Append `payment` and mark its order paid with the transaction id
    async fn confirm_payment(&self, order_id: &str, payment: Payment)
        -> MarketResult<UpdateOutcome>;
    async fn delete_order(&self, id: &str) -> MarketResult<DeleteOutcome>;

    // --- reviews ---
    async fn list_reviews(&self) -> MarketResult<Vec<Review>>;
    async fn insert_review(&self, review: Review) -> MarketResult<InsertOutcome>;

    // --- users ---
    async fn list_users(&self) -> MarketResult<Vec<User>>;
    async fn find_user(&self, email: &str) -> MarketResult<Option<User>>;
    async fn insert_user(&self, user: User) -> MarketResult<InsertOutcome>;
    /// Set profile fields, creating the user when absent
    async fn upsert_profile(&self, email: &str, profile: UserProfile)
        -> MarketResult<UpdateOutcome>;
    async fn set_role(&self, email: &str, role: Role) -> MarketResult<UpdateOutcome>;

    /// Insert `user` unless a user with the same email already exists.
    ///
    /// The check and the insert are separate operations; two concurrent
    /// registrations of the same email can both succeed.
    async fn register_user(&self, user: User) -> MarketResult<Registration> {
        if self.find_user(&user.email).await?.is_some() {
            return Ok(Registration::AlreadyExists);
        }
        Ok(Registration::Created(self.insert_user(user).await?))
    }

    /// Whether `email` belongs to a stored admin
    async fn is_admin(&self, email: &str) -> MarketResult<bool> {
        Ok(self
            .find_user(email)
            .await?
            .map(|user| user.is_admin())
            .unwrap_or(false))
    }
}

/// Shared store handle (dynamic dispatch)
pub type SharedStore = Arc<dyn MarketStore>;

/// Reverse storage order so the newest record comes first, then keep at most
/// `limit` records. `None` or `Some(0)` keeps everything.
pub fn newest_first<T>(mut items: Vec<T>, limit: Option<usize>) -> Vec<T> {
    items.reverse();
    if let Some(limit) = limit.filter(|l| *l > 0) {
        items.truncate(limit);
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newest_first() {
        assert_eq!(newest_first(vec![1, 2, 3, 4], None), vec![4, 3, 2, 1]);
        assert_eq!(newest_first(vec![1, 2, 3, 4], Some(2)), vec![4, 3]);
        assert_eq!(newest_first(vec![1, 2], Some(0)), vec![2, 1]);
        assert_eq!(newest_first(vec![1, 2], Some(10)), vec![2, 1]);
    }

    #[test]
    fn test_outcome_wire_format() {
        let value = serde_json::to_value(UpdateOutcome::new(1, 0)).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "acknowledged": true,
                "matchedCount": 1,
                "modifiedCount": 0,
                "upsertedId": null
            })
        );

        let value = serde_json::to_value(InsertOutcome::new("abc")).unwrap();
        assert_eq!(value["insertedId"], "abc");
    }
}
