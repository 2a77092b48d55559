use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    response::{ApiResponse, Meta},
    state::AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthData {
    pub status: String,
    pub database: String,
}

/// 200 while Postgres answers, 503 otherwise.
pub fn health_report(database_up: bool) -> (StatusCode, HealthData) {
    if database_up {
        (
            StatusCode::OK,
            HealthData {
                status: "ok".to_string(),
                database: "up".to_string(),
            },
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            HealthData {
                status: "degraded".to_string(),
                database: "down".to_string(),
            },
        )
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service and database are up", body = ApiResponse<HealthData>),
        (status = 503, description = "Database unreachable", body = ApiResponse<HealthData>),
    ),
    tag = "Health"
)]
pub async fn health_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<HealthData>>) {
    let database_up = match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => true,
        Err(err) => {
            tracing::warn!(error = %err, "health check could not reach the database");
            false
        }
    };
    let (status, data) = health_report(database_up);

    (
        status,
        Json(ApiResponse::success(
            "Health check",
            data,
            Some(Meta::empty()),
        )),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_database_degrades_health() {
        let (status, data) = health_report(true);
        assert_eq!(status, StatusCode::OK);
        assert_eq!(data.status, "ok");

        let (status, data) = health_report(false);
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(data.status, "degraded");
        assert_eq!(data.database, "down");
    }
}
