//! # market-mongo
//!
//! MongoDB document store for the tools marketplace.
//!
//! Collections: `tools`, `orders`, `reviews`, `users`, `payments`.
//!
//! ```rust,ignore
//! use market_mongo::MongoStore;
//!
//! let store = MongoStore::connect(&uri, "toolsMarketplace").await?;
//! let tools = store.list_tools().await?;
//! ```

pub mod convert;
pub mod store;

pub use store::MongoStore;
