//! # market-api
//!
//! HTTP API layer for the tools marketplace.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - Bearer token issuing and the auth/admin extractors
//! - REST endpoints for tools, orders, reviews, users and payments
//!
//! ## Endpoints
//!
//! | Method | Path | Guard | Description |
//! |--------|------|-------|-------------|
//! | GET | `/` | | Greeting |
//! | GET | `/health` | | Health check |
//! | POST | `/login` | | Issue access token |
//! | GET | `/tools` | | List tools, newest first (`?limit=`) |
//! | POST | `/tools` | admin | Add tool |
//! | GET | `/tools/{id}` | | Get tool |
//! | PUT | `/tools/{id}` | admin | Update tool |
//! | DELETE | `/tools/{id}` | admin | Delete tool |
//! | GET | `/orders` | owner | Caller's orders (`?email=`) |
//! | POST | `/orders` | bearer | Place order |
//! | GET | `/orders/{id}` | bearer | Get order |
//! | PATCH | `/orders/{id}` | bearer | Confirm payment |
//! | DELETE | `/orders/{id}` | bearer | Cancel order |
//! | GET | `/admin/orders` | admin | All orders |
//! | PATCH | `/admin/orders/{id}/ship` | admin | Mark shipped |
//! | GET | `/admin/{email}` | bearer | Admin status |
//! | GET | `/review` | | List reviews, newest first (`?limit=`) |
//! | POST | `/review` | bearer | Add review |
//! | POST | `/users` | | Register |
//! | GET | `/users` | admin | List users |
//! | GET | `/users/{email}` | bearer | Get user |
//! | PUT | `/users/{email}` | owner | Upsert own profile |
//! | PUT | `/users/admin/{email}` | admin | Promote to admin |
//! | POST | `/create-payment-intent` | bearer | Stripe client secret |

pub mod auth;
pub mod handlers;
pub mod routes;
pub mod state;

pub use auth::{AdminUser, AuthUser, Claims, TokenIssuer};
pub use routes::create_router;
pub use state::{AppConfig, AppState};
