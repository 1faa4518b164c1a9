use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, put},
};

use crate::{
    model::{
        CrudRepository, PaginatableRepository, ResourceType, ResourceTyped,
        entity::{Course, CourseProgress, UserEntity},
    },
    progress::reconcile,
    web::{
        AppState, RequestContext, WebError, WebResult,
        dto::{
            progress::{CourseProgressResponse, ProgressUpdateBody},
            users::UserResponse,
        },
        error::ErrorResponse,
        middlewares,
        routes::PaginationQuery,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    let protected = Router::new()
        .route("/{id}/progress", get(progress_list_handler))
        .route("/{id}/progress/{course_id}", put(progress_update_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ));

    Router::new()
        .route("/", get(users_list_handler))
        .route("/page", get(users_page_handler))
        .merge(protected)
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    description = "Lists every user",
    responses(
        (status = 200, description = "All users", body = Vec<UserResponse>),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "users"
)]
async fn users_list_handler(State(state): State<AppState>) -> WebResult<impl IntoResponse> {
    let users: Vec<UserResponse> = UserEntity::all(state.mm())
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?
        .into_iter()
        .map(UserResponse::from)
        .collect();

    Ok((StatusCode::OK, Json(users)))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/page",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Returns requested page", body = crate::model::Page<UserResponse>),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "users"
)]
async fn users_page_handler(
    Query(page): Query<PaginationQuery>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let users = UserEntity::page(state.mm(), page.limit, page.offset)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?
        .map(UserResponse::from);

    Ok((StatusCode::OK, Json(users)))
}

async fn find_user(state: &AppState, ctx: &RequestContext, id: &str) -> WebResult<UserEntity> {
    let user = ctx.user()?;
    if !user.can_act_on(id) {
        return Err(WebError::resource_forbidden(ResourceType::UserProgress));
    }

    UserEntity::find_by_id(state.mm(), id)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(UserEntity::get_resource_type()))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/progress",
    description = "Stored and reconciled progress for every course the user is enrolled in or has progress for",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Progress per course", body = Vec<CourseProgressResponse>),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Progress of another user", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "users",
    security(
        ("cookie" = [])
    )
)]
async fn progress_list_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> WebResult<impl IntoResponse> {
    let user = find_user(&state, &ctx, &id).await?;
    let courses = Course::all(state.mm())
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;
    let course = |course_id: &str| courses.iter().find(|c| c.id() == course_id);

    let mut res: Vec<CourseProgressResponse> = user
        .progress()
        .iter()
        .map(|(course_id, recorded)| {
            CourseProgressResponse::new(course_id, course(course_id), recorded)
        })
        .collect();

    // enrolled without anything recorded yet
    let empty = CourseProgress::default();
    for course_id in user.enrolled_courses() {
        if user.progress().course(course_id).is_none() {
            res.push(CourseProgressResponse::new(course_id, course(course_id.as_str()), &empty));
        }
    }

    Ok((StatusCode::OK, Json(res)))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/{id}/progress/{course_id}",
    description = "Replaces the completed modules of a course; unknown module ids are dropped",
    params(
        ("id" = String, Path, description = "User id"),
        ("course_id" = String, Path, description = "Course id"),
    ),
    request_body = ProgressUpdateBody,
    responses(
        (status = 200, description = "Progress stored", body = CourseProgressResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Progress of another user", body = ErrorResponse),
        (status = 404, description = "User or course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "users",
    security(
        ("cookie" = [])
    )
)]
async fn progress_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path((id, course_id)): Path<(String, String)>,
    Json(payload): Json<ProgressUpdateBody>,
) -> WebResult<impl IntoResponse> {
    let user = find_user(&state, &ctx, &id).await?;
    let course = Course::find_by_id(state.mm(), &course_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Course::get_resource_type()))?;

    let mut recorded = CourseProgress::new(payload.completed_modules);
    let report = reconcile(&course, &mut recorded);
    if !report.stale_modules.is_empty() {
        tracing::debug!(user_id = %id, course_id = %course_id, stale = ?report.stale_modules, "dropping unknown modules");
    }

    let res = CourseProgressResponse {
        course_id: course_id.clone(),
        completed_modules: recorded.completed_modules.clone(),
        stored_percentage: recorded.percentage,
        percentage: recorded.percentage,
        stale_modules: report.stale_modules,
    };

    user.set_course_progress(state.mm(), &course_id, recorded)
        .await
        .map_err(|e| WebError::resource_fetch_error(ResourceType::UserProgress, e))?;

    Ok((StatusCode::OK, Json(res)))
}
