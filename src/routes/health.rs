use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{response::ApiResponse, state::AppState};

#[derive(Serialize, ToSchema)]
pub struct HealthData {
    pub status: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "OK", body = ApiResponse<HealthData>),
    ),
    tag = "Health"
)]
pub async fn health_check() -> Json<ApiResponse<HealthData>> {
    let data = HealthData {
        status: "ok".to_string(),
    };

    Json(ApiResponse::success("Health check", data))
}

/// Ready once the database answers.
#[utoipa::path(
    get,
    path = "/health/ready",
    responses(
        (status = 200, description = "Database reachable", body = ApiResponse<HealthData>),
        (status = 503, description = "Database unreachable", body = ApiResponse<HealthData>),
    ),
    tag = "Health"
)]
pub async fn readiness(
    State(state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<HealthData>>) {
    let probe = tokio::time::timeout(
        state.db_timeout,
        sqlx::query("SELECT 1").execute(&state.pool),
    )
    .await;

    match probe {
        Ok(Ok(_)) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                "Ready",
                HealthData {
                    status: "ready".to_string(),
                },
            )),
        ),
        Ok(Err(err)) => {
            tracing::warn!(error = %err, "readiness probe failed");
            unavailable()
        }
        Err(_) => {
            tracing::warn!("readiness probe timed out");
            unavailable()
        }
    }
}

fn unavailable() -> (StatusCode, Json<ApiResponse<HealthData>>) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ApiResponse::failure(
            "Not ready",
            HealthData {
                status: "unavailable".to_string(),
            },
        )),
    )
}
