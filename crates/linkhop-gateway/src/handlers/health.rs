use crate::model::{DeepHealthResponse, HealthResponse, ServiceHealth};
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

fn up_or_down(up: bool) -> &'static str {
    if up {
        "ok"
    } else {
        "down"
    }
}

/// Checks the durable store and the shared cache tier.
pub async fn deep_health_handler(
    State(state): State<AppState>,
) -> (StatusCode, Json<DeepHealthResponse>) {
    let health = state.resolver().health().await;
    let (status, label) = if health.is_healthy() {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status,
        Json(DeepHealthResponse {
            status: label,
            services: ServiceHealth {
                database: up_or_down(health.store),
                cache: up_or_down(health.distributed),
            },
        }),
    )
}
