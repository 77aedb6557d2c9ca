//! # Routes
//!
//! Axum router configuration for the marketplace API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, patch, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - Public:
///   - GET  /, /health
///   - POST /login - Issue access token
///   - GET  /tools, /tools/{id}, /review
///   - POST /users - Register
///
/// - Bearer token:
///   - GET/POST /orders, GET/PATCH/DELETE /orders/{id}
///   - POST /review
///   - GET/PUT /users/{email}, GET /admin/{email}
///   - POST /create-payment-intent
///
/// - Admin role:
///   - POST /tools, PUT/DELETE /tools/{id}
///   - GET /admin/orders, PATCH /admin/orders/{id}/ship
///   - GET /users, PUT /users/admin/{email}
pub fn create_router(state: AppState) -> Router {
    // Browser clients live on another origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let tool_routes = Router::new()
        .route("/", get(handlers::list_tools).post(handlers::add_tool))
        .route(
            "/{id}",
            get(handlers::get_tool)
                .put(handlers::update_tool)
                .delete(handlers::delete_tool),
        );

    let order_routes = Router::new()
        .route("/", get(handlers::list_orders).post(handlers::place_order))
        .route(
            "/{id}",
            get(handlers::get_order)
                .patch(handlers::confirm_payment)
                .delete(handlers::cancel_order),
        );

    let user_routes = Router::new()
        .route("/", get(handlers::list_users).post(handlers::register_user))
        .route("/admin/{email}", put(handlers::make_admin))
        .route(
            "/{email}",
            get(handlers::get_user).put(handlers::update_profile),
        );

    let admin_routes = Router::new()
        .route("/orders", get(handlers::all_orders))
        .route("/orders/{id}/ship", patch(handlers::ship_order))
        .route("/{email}", get(handlers::admin_status));

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/login", post(handlers::login))
        .route(
            "/review",
            get(handlers::list_reviews).post(handlers::add_review),
        )
        .route(
            "/create-payment-intent",
            post(handlers::create_payment_intent),
        )
        .nest("/tools", tool_routes)
        .nest("/orders", order_routes)
        .nest("/users", user_routes)
        .nest("/admin", admin_routes)
        // Middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        // State
        .with_state(state)
}
