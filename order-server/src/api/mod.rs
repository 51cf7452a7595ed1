//! HTTP API
//!
//! Public ordering routes live under `/api`; staff routes under `/api/admin`
//! sit behind [`require_admin`].

pub mod admin;
pub mod auth;
pub mod cart;
pub mod extract;
pub mod health;
pub mod menu;
pub mod orders;
pub mod payments;
pub mod tables;

use axum::http::{HeaderName, HeaderValue};
use axum::routing::{get, patch, post};
use axum::{Json, Router, middleware};
use shared::error::AppError;
use tower_cookies::CookieManagerLayer;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::auth::require_admin;
use crate::middleware::{REQUEST_ID_HEADER, logging_middleware};
use crate::state::AppState;

pub type ApiResult<T> = Result<Json<T>, AppError>;

#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// All routes, no middleware and no state
pub fn build_router(state: &AppState) -> Router<AppState> {
    let admin = admin::router().route_layer(middleware::from_fn_with_state(
        state.clone(),
        require_admin,
    ));

    let api = Router::new()
        .route("/categories", get(menu::list_categories))
        .route("/menu-items", get(menu::list_menu_items))
        .route("/menu-items/{id}", get(menu::get_menu_item))
        .route("/cart", get(cart::get_cart).delete(cart::clear_cart))
        .route("/cart/items", post(cart::add_item))
        .route(
            "/cart/items/{id}",
            patch(cart::update_item).delete(cart::remove_item),
        )
        .route("/orders", post(orders::create_order))
        .route("/orders/{id}", get(orders::get_order))
        .route("/payments", post(payments::process_payment))
        .route("/tables/{id}", get(tables::get_table))
        .nest("/auth", auth::router())
        .nest("/admin", admin);

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api)
}

/// Fully layered application, used by the server binary and by tests
pub fn build_app(state: AppState) -> Router {
    build_router(&state)
        .layer(CookieManagerLayer::new())
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static(REQUEST_ID_HEADER),
            XRequestId,
        ))
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            REQUEST_ID_HEADER,
        )))
        .with_state(state)
}
