use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use tower_cookies::{Cookie, Cookies, cookie::SameSite};

use crate::{
    Config,
    auth::{self, UserClaims, verify_password},
    model::{CrudRepository, ResourceTyped, entity::UserEntity},
    web::{
        AppState, RequestContext, WebError, WebResult,
        dto::users::{LoginBody, UserResponse},
        error::ErrorResponse,
        middlewares::{self, AUTH_TOKEN},
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    let protected = Router::new()
        .route("/me", get(me_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ));

    Router::new()
        .route("/login", post(login_handler))
        .merge(protected)
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    description = "Authorizes user and sets the session cookie",
    request_body = LoginBody,
    responses(
        (status = 200, description = "User signed in", body = UserResponse),
        (status = 401, description = "Credentials invalid", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "auth",
)]
async fn login_handler(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<LoginBody>,
) -> WebResult<impl IntoResponse> {
    let found = UserEntity::find_by_email(state.mm(), &payload.email)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?
        .ok_or_else(WebError::auth_invalid_credentials)?;

    // seeded demo users may come without a password
    if found.hash().is_empty() {
        return Err(WebError::auth_invalid_credentials());
    }

    let is_verified = verify_password(found.hash(), &payload.password)
        .map_err(WebError::server_crypt_error)?;

    if !is_verified {
        return Err(WebError::auth_invalid_credentials());
    }

    let jwt_token = Config::get_or_init(false).await.app().jwt();
    let token = auth::generate_token(&UserClaims::session(found.id()), jwt_token)
        .map_err(|e| WebError::server_crypt_error(e.into()))?;

    let mut cookie = Cookie::new(AUTH_TOKEN, token);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_http_only(true);
    cookie.set_path("/");
    cookies.add(cookie);

    tracing::debug!(user_id = found.id(), "user signed in");
    Ok((StatusCode::OK, Json(UserResponse::from(found))))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    description = "Returns the signed in user",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "auth",
    security(
        ("cookie" = [])
    )
)]
async fn me_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let found = UserEntity::find_by_id(state.mm(), user.user_id())
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?
        .ok_or_else(WebError::auth_required)?;

    Ok((StatusCode::OK, Json(UserResponse::from(found))))
}
