//! # market-core
//!
//! Core types and traits for the tools marketplace backend.
//!
//! This crate provides:
//! - `Tool`, `Order`, `Review`, `User` and `Payment` records
//! - `MarketStore` trait for document storage backends, plus `MemoryStore`
//! - `PaymentIntentProvider` trait for payment APIs
//! - `Currency` for decimal to minor-unit conversion
//! - `MarketError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use market_core::{MarketStore, MemoryStore, Tool, newest_first};
//!
//! let store = MemoryStore::new();
//! let inserted = store.insert_tool(Tool::new("Torque Wrench", 49.5, 12)).await?;
//! let latest = newest_first(store.list_tools().await?, Some(6));
//! ```

pub mod error;
pub mod loose;
pub mod memory;
pub mod money;
pub mod order;
pub mod payment;
pub mod review;
pub mod store;
pub mod tool;
pub mod user;

// Re-exports for convenience
pub use error::{MarketError, MarketResult};
pub use memory::MemoryStore;
pub use money::Currency;
pub use order::{NewOrder, Order, Payment, PaymentConfirmation, ShippingStatus};
pub use payment::{BoxedPaymentProvider, PaymentIntent, PaymentIntentProvider};
pub use review::Review;
pub use store::{
    collections, newest_first, DeleteOutcome, InsertOutcome, MarketStore, Registration,
    SharedStore, UpdateOutcome,
};
pub use tool::{Tool, ToolUpdate};
pub use user::{normalize_email, NewUser, Role, User, UserProfile};
