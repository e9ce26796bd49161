//! User and notification endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::db;
use crate::error::ApiResult;
use crate::models::{NewUser, Notification, User};
use crate::AppState;

/// POST /users
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<NewUser>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = request.into_user()?;
    db::users::insert_user(&state.db, &user).await?;
    tracing::info!(user_id = %user.id, role = %user.role, "User created");
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /users/:user_id
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<User>> {
    Ok(Json(db::users::require_user(&state.db, user_id).await?))
}

/// GET /workers
pub async fn list_workers(State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(db::users::list_active_workers(&state.db, None).await?))
}

/// GET /users/:user_id/notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Notification>>> {
    db::users::require_user(&state.db, user_id).await?;
    Ok(Json(db::notifications::list_for_user(&state.db, user_id).await?))
}

/// POST /users/:user_id/notifications/:notification_id/read
pub async fn mark_notification_read(
    State(state): State<AppState>,
    Path((user_id, notification_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    db::notifications::mark_read(&state.db, user_id, notification_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user))
        .route("/users/:user_id", get(get_user))
        .route("/users/:user_id/notifications", get(list_notifications))
        .route(
            "/users/:user_id/notifications/:notification_id/read",
            post(mark_notification_read),
        )
        .route("/workers", get(list_workers))
}
