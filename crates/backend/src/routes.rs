use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::api::handlers;
use crate::state::AppState;
use crate::system;

/// All application routes
pub fn configure_routes(state: AppState) -> Router {
    // ========================================
    // PROTECTED ROUTES (bearer token)
    // ========================================
    let protected = Router::new()
        .route(
            "/api/system/auth/me",
            get(system::handlers::auth::current_session),
        )
        // D402 Realtime sales dashboard
        .route(
            "/api/d402/realtime_sales",
            get(handlers::d402_realtime_sales::get_realtime_sales),
        )
        .route(
            "/api/d402/refresh",
            post(handlers::d402_realtime_sales::refresh),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            system::auth::middleware::require_auth,
        ));

    // ========================================
    // PUBLIC ROUTES
    // ========================================
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route(
            "/api/system/auth/login",
            post(system::handlers::auth::login),
        )
        .merge(protected)
        .with_state(state)
}
