use axum::{
    Json, Router, extract::State, http::StatusCode, middleware, response::IntoResponse,
    routing::get,
};

use crate::{
    dashboard::Dashboard,
    model::{
        CrudRepository, ResourceTyped,
        entity::{Course, UserEntity},
    },
    web::{
        AppState, RequestContext, WebError, WebResult, dto::dashboard::DashboardResponse,
        error::ErrorResponse, middlewares,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(dashboard_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    description = "Dashboard of the signed in user, shaped by their role",
    responses(
        (status = 200, description = "Dashboard", body = DashboardResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "dashboard",
    security(
        ("cookie" = [])
    )
)]
async fn dashboard_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let (found, courses, users) = tokio::try_join!(
        UserEntity::find_by_id(state.mm(), user.user_id()),
        Course::all(state.mm()),
        UserEntity::all(state.mm()),
    )
    .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;
    let found = found.ok_or_else(WebError::auth_required)?;

    let dashboard = Dashboard::for_user(&found, &courses, &users);
    Ok((StatusCode::OK, Json(DashboardResponse::from(&dashboard))))
}
