//! # Request Handlers
//!
//! Axum request handlers for the marketplace API.
//! Each handler performs one store operation and returns its result as JSON;
//! write endpoints return the driver-shaped outcome unchanged.

use crate::auth::{AdminUser, AuthUser};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use market_core::{
    newest_first, normalize_email, Currency, DeleteOutcome, InsertOutcome, MarketError,
    NewOrder, NewUser, Order, PaymentConfirmation, Registration, Review, Role, ShippingStatus,
    Tool, ToolUpdate, UpdateOutcome, User, UserProfile,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Optional result-count limit for list endpoints
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct RegistrationResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<InsertOutcome>,
}

#[derive(Debug, Serialize)]
pub struct AdminStatusResponse {
    pub admin: bool,
}

#[derive(Debug, Deserialize)]
pub struct PaymentIntentRequest {
    #[serde(deserialize_with = "market_core::loose::number")]
    pub price: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentResponse {
    pub client_secret: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
        }
    }
}

/// Handler error: a `MarketError` rendered as an `ErrorResponse`
#[derive(Debug)]
pub struct ApiError(pub MarketError);

impl From<MarketError> for ApiError {
    fn from(err: MarketError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.status_code();
        if code >= 500 {
            error!("Request failed: {}", self.0);
        }
        let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ErrorResponse::new(self.0.to_string(), code))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Reject callers acting on another user's email
fn ensure_owner(caller: &str, email: &str) -> Result<(), ApiError> {
    if caller != email {
        return Err(MarketError::forbidden().into());
    }
    Ok(())
}

// =============================================================================
// Handlers
// =============================================================================

/// Greeting at the root path
pub async fn root() -> &'static str {
    "Hello World!"
}

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "tools-market",
        "store": state.store.backend_name(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Issue an access token
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<TokenResponse> {
    let email = normalize_email(&request.email)?;
    let access_token = state.tokens.issue(&email)?;
    info!("Issued access token for {}", email);
    Ok(Json(TokenResponse { access_token }))
}

// --- tools ---

/// List tools, newest first
pub async fn list_tools(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<Tool>> {
    let tools = state.store.list_tools().await?;
    Ok(Json(newest_first(tools, query.limit)))
}

/// Get single tool
pub async fn get_tool(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Tool> {
    let tool = state
        .store
        .find_tool(&id)
        .await?
        .ok_or_else(|| MarketError::not_found("tools", &id))?;
    Ok(Json(tool))
}

#[instrument(skip_all, fields(admin = %admin.email(), tool = %tool.name))]
pub async fn add_tool(
    State(state): State<AppState>,
    admin: AdminUser,
    Json(mut tool): Json<Tool>,
) -> ApiResult<InsertOutcome> {
    tool.validate()?;
    tool.id = None;
    let outcome = state.store.insert_tool(tool).await?;
    info!("Added tool {}", outcome.inserted_id);
    Ok(Json(outcome))
}

#[instrument(skip_all, fields(admin = %admin.email(), id = %id))]
pub async fn update_tool(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<String>,
    Json(update): Json<ToolUpdate>,
) -> ApiResult<UpdateOutcome> {
    let update = update.sanitized()?;
    Ok(Json(state.store.update_tool(&id, update).await?))
}

#[instrument(skip_all, fields(admin = %admin.email(), id = %id))]
pub async fn delete_tool(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<String>,
) -> ApiResult<DeleteOutcome> {
    Ok(Json(state.store.delete_tool(&id).await?))
}

// --- orders ---

/// Orders of the caller. An `email` query naming someone else is forbidden.
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrdersQuery>,
) -> ApiResult<Vec<Order>> {
    let email = match query.email {
        Some(email) => normalize_email(&email)?,
        None => user.email().to_string(),
    };
    ensure_owner(user.email(), &email)?;
    Ok(Json(state.store.orders_for(&email).await?))
}

/// Load an order the caller owns; someone else's order is forbidden
async fn owned_order(state: &AppState, user: &AuthUser, id: &str) -> Result<Order, ApiError> {
    let order = state
        .store
        .find_order(id)
        .await?
        .ok_or_else(|| MarketError::not_found("orders", id))?;
    if ensure_owner(user.email(), &order.email).is_err() {
        warn!("{} attempted to access order {} of another buyer", user.email(), id);
        return Err(MarketError::forbidden().into());
    }
    Ok(order)
}

pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Order> {
    Ok(Json(owned_order(&state, &user, &id).await?))
}

#[instrument(skip_all, fields(buyer = %user.email()))]
pub async fn place_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<NewOrder>,
) -> ApiResult<InsertOutcome> {
    let mut order = request.into_order(user.email())?;
    order.email = normalize_email(&order.email)?;
    ensure_owner(user.email(), &order.email)?;

    let outcome = state.store.insert_order(order).await?;
    info!("Placed order {}", outcome.inserted_id);
    Ok(Json(outcome))
}

/// Record a completed payment against an order
#[instrument(skip_all, fields(payer = %user.email(), order_id = %id))]
pub async fn confirm_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(confirmation): Json<PaymentConfirmation>,
) -> ApiResult<UpdateOutcome> {
    let payment = confirmation.into_payment(&id, user.email())?;
    owned_order(&state, &user, &id).await?;
    let outcome = state.store.confirm_payment(&id, payment).await?;
    info!("Payment recorded, matched={}", outcome.matched_count);
    Ok(Json(outcome))
}

#[instrument(skip_all, fields(caller = %user.email(), order_id = %id))]
pub async fn cancel_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<DeleteOutcome> {
    owned_order(&state, &user, &id).await?;
    Ok(Json(state.store.delete_order(&id).await?))
}

pub async fn all_orders(State(state): State<AppState>, _admin: AdminUser) -> ApiResult<Vec<Order>> {
    Ok(Json(state.store.list_orders().await?))
}

#[instrument(skip_all, fields(admin = %admin.email(), order_id = %id))]
pub async fn ship_order(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<String>,
) -> ApiResult<UpdateOutcome> {
    Ok(Json(
        state
            .store
            .set_order_status(&id, ShippingStatus::Shipped)
            .await?,
    ))
}

// --- reviews ---

/// List reviews, newest first
pub async fn list_reviews(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<Review>> {
    let reviews = state.store.list_reviews().await?;
    Ok(Json(newest_first(reviews, query.limit)))
}

#[instrument(skip_all, fields(author = %user.email()))]
pub async fn add_review(
    State(state): State<AppState>,
    user: AuthUser,
    Json(mut review): Json<Review>,
) -> ApiResult<InsertOutcome> {
    review.validate()?;
    review.id = None;
    review.email = Some(user.email().to_string());
    Ok(Json(state.store.insert_review(review).await?))
}

// --- users ---

/// Register a user unless the email is already taken
#[instrument(skip_all)]
pub async fn register_user(
    State(state): State<AppState>,
    Json(request): Json<NewUser>,
) -> ApiResult<RegistrationResponse> {
    let user = request.into_user()?;
    let email = user.email.clone();

    let response = match state.store.register_user(user).await? {
        Registration::Created(outcome) => {
            info!("Registered user {}", email);
            RegistrationResponse {
                success: true,
                message: None,
                result: Some(outcome),
            }
        }
        Registration::AlreadyExists => RegistrationResponse {
            success: false,
            message: Some("User already exists".to_string()),
            result: None,
        },
    };
    Ok(Json(response))
}

pub async fn list_users(State(state): State<AppState>, _admin: AdminUser) -> ApiResult<Vec<User>> {
    Ok(Json(state.store.list_users().await?))
}

pub async fn get_user(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(email): Path<String>,
) -> ApiResult<User> {
    let email = normalize_email(&email)?;
    let user = state
        .store
        .find_user(&email)
        .await?
        .ok_or_else(|| MarketError::not_found("users", &email))?;
    Ok(Json(user))
}

/// Set the caller's own profile fields
#[instrument(skip_all, fields(caller = %user.email()))]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Path(email): Path<String>,
    Json(profile): Json<UserProfile>,
) -> ApiResult<UpdateOutcome> {
    let email = normalize_email(&email)?;
    ensure_owner(user.email(), &email)?;
    let profile = profile.sanitized()?;
    Ok(Json(state.store.upsert_profile(&email, profile).await?))
}

/// Promote a user to admin
#[instrument(skip_all, fields(admin = %admin.email()))]
pub async fn make_admin(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(email): Path<String>,
) -> ApiResult<UpdateOutcome> {
    let email = normalize_email(&email)?;
    let outcome = state.store.set_role(&email, Role::Admin).await?;
    info!("Promoted {} to admin, matched={}", email, outcome.matched_count);
    Ok(Json(outcome))
}

pub async fn admin_status(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(email): Path<String>,
) -> ApiResult<AdminStatusResponse> {
    let email = normalize_email(&email)?;
    let admin = state.store.is_admin(&email).await?;
    Ok(Json(AdminStatusResponse { admin }))
}

// --- payments ---

/// Create a payment intent for `price` dollars
#[instrument(skip_all, fields(caller = %user.email(), price = request.price))]
pub async fn create_payment_intent(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<PaymentIntentRequest>,
) -> ApiResult<PaymentIntentResponse> {
    let amount = Currency::USD.to_smallest_unit(request.price)?;

    let intent = state
        .payments
        .create_payment_intent(amount, Currency::USD)
        .await
        .map_err(|e| {
            error!("Failed to create payment intent: {}", e);
            e
        })?;

    info!(
        "Created payment intent {} via {}",
        intent.id,
        state.payments.provider_name()
    );

    Ok(Json(PaymentIntentResponse {
        client_secret: intent.client_secret,
    }))
}
