use axum::{
    extract::{Json, State},
    http::StatusCode,
};
use contracts::shared::error::ErrorResponse;
use contracts::system::auth::{LoginRequest, LoginResponse, TokenClaims};

use crate::state::AppState;
use crate::system::auth::extractor::CurrentSession;

const PASSWORD_INCORRECT: &str = "Password incorrect";

/// Login handler: exchanges the shared password for a bearer token
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.auth.login(&request.password) {
        Ok(Some(response)) => {
            tracing::info!("Dashboard session opened");
            Ok(Json(response))
        }
        Ok(None) => {
            tracing::warn!("Dashboard login rejected: wrong password");
            Err((
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new(PASSWORD_INCORRECT)),
            ))
        }
        Err(e) => {
            tracing::error!("Failed to issue session token: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Cannot open session")),
            ))
        }
    }
}

/// Current session handler (protected by middleware)
pub async fn current_session(CurrentSession(claims): CurrentSession) -> Json<TokenClaims> {
    Json(claims)
}
