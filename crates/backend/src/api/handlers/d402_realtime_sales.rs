use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use contracts::dashboards::d402_realtime_sales::{
    RealtimeSalesRequest, RealtimeSalesResponse, RefreshResponse,
};
use contracts::shared::error::ErrorResponse;

use crate::dashboards::d402_realtime_sales::ReportError;
use crate::state::AppState;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn report_error(e: ReportError) -> ApiError {
    let status = match e {
        ReportError::Period(_) => StatusCode::BAD_REQUEST,
        ReportError::Warehouse(_) => StatusCode::BAD_GATEWAY,
    };
    (status, Json(ErrorResponse::new(e.to_string())))
}

/// GET /api/d402/realtime_sales?date_from=2024-01-01&date_to=2024-01-07
pub async fn get_realtime_sales(
    State(state): State<AppState>,
    query: Result<Query<RealtimeSalesRequest>, QueryRejection>,
) -> Result<Json<RealtimeSalesResponse>, ApiError> {
    let Query(request) = query.map_err(|rejection| {
        tracing::warn!("D402 Dashboard: Bad query: {}", rejection.body_text());
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(rejection.body_text())),
        )
    })?;

    tracing::info!(
        "D402 Dashboard: Getting realtime sales for {:?}..{:?}",
        request.date_from,
        request.date_to
    );

    let today = Utc::now().date_naive();
    match state.realtime_sales.get_realtime_sales(request, today).await {
        Ok(response) => {
            tracing::info!(
                "D402 Dashboard: Returning {} hours, {} countries, {} products",
                response.hourly_sales.len(),
                response.shipping_countries.len(),
                response.top_products.len()
            );
            Ok(Json(response))
        }
        Err(e) => {
            match &e {
                ReportError::Period(_) => tracing::warn!("D402 Dashboard: Bad date range: {}", e),
                ReportError::Warehouse(_) => {
                    tracing::error!("D402 Dashboard: Failed to get realtime sales: {}", e)
                }
            }
            Err(report_error(e))
        }
    }
}

/// POST /api/d402/refresh
pub async fn refresh(State(state): State<AppState>) -> Json<RefreshResponse> {
    let invalidated = state.realtime_sales.refresh();
    Json(RefreshResponse { invalidated })
}
