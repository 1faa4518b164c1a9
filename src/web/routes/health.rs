use axum::{Json, Router, http::StatusCode, response::IntoResponse, routing::get};
use serde::Serialize;

use crate::web::AppState;

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    status: String,
    version: String,
}

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(health_handler))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/v1/health",
    description = "Availability probe used by clients to pick online or offline mode",
    responses(
        (status = 200, description = "Server is up", body = HealthResponse),
    ),
    tag = "health"
)]
async fn health_handler() -> impl IntoResponse {
    let res = HealthResponse {
        status: String::from("ok"),
        version: String::from(env!("CARGO_PKG_VERSION")),
    };
    (StatusCode::OK, Json(res))
}
