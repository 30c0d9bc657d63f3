//! HTTP route handlers for storefront.
//!
//! All endpoints speak JSON. Errors are `{"error": "..."}` with the matching
//! status code.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                                   - Liveness
//! GET    /health/ready                             - Database reachable
//!
//! # Auth (stricter rate limit)
//! POST   /api/auth/register                        - Create account, sign in
//! POST   /api/auth/login                           - Sign in
//! POST   /api/auth/logout                          - Sign out
//! GET    /api/auth/me                              - Current user
//!
//! # Catalog
//! GET    /api/categories                           - Category list
//! GET    /api/categories/{category}/products/{product} - Product detail
//! GET    /api/products                             - Product listing
//! POST   /api/products                             - Create product (admin)
//!
//! # Cart (requires auth)
//! GET    /api/cart                                 - Cart with priced items
//! GET    /api/cart/summary                         - Cart with totals
//! POST   /api/cart                                 - Add item
//! PUT    /api/cart/items/{id}                      - Change quantity (0 removes)
//! DELETE /api/cart/items/{id}                      - Remove item
//!
//! # Checkout and orders (requires auth)
//! POST   /api/checkout                             - Place order from cart
//! GET    /api/orders                               - Own order history
//! GET    /api/orders/{id}                          - Order detail
//! ```

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod health;
pub mod orders;

use axum::{
    Router,
    http::Request,
    middleware::from_fn,
    routing::{get, post, put},
};
use tower_http::trace::TraceLayer;

use crate::middleware::{
    api_rate_limiter, auth_rate_limiter, create_session_layer, request_id_middleware,
    security_headers_middleware,
};
use crate::state::AppState;

/// The complete storefront application: health probes, the API, sessions,
/// request IDs, tracing and Sentry.
pub fn app(state: AppState) -> Router {
    let sessions = create_session_layer(state.pool(), state.config());

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(routes())
        .layer(sessions)
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .with_state(state)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// `request_id` is recorded later by the request ID middleware.
fn request_span<B>(request: &Request<B>) -> tracing::Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = tracing::field::Empty,
    )
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(catalog::categories))
        .route(
            "/categories/{category}/products/{product}",
            get(catalog::product),
        )
        .route(
            "/products",
            get(catalog::products).post(catalog::create_product),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).post(cart::add))
        .route("/summary", get(cart::summary))
        .route("/items/{id}", put(cart::update).delete(cart::remove))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    let auth = Router::new()
        .nest("/auth", auth_routes())
        .layer(auth_rate_limiter());

    let api = Router::new()
        .merge(catalog_routes())
        .nest("/cart", cart_routes())
        .route("/checkout", post(checkout::checkout))
        .nest("/orders", order_routes())
        .layer(api_rate_limiter());

    Router::new().nest("/api", auth.merge(api))
}
