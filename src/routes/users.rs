use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::users::{
        CreateUserRequest, LoginHistoryList, UpdateUserRequest, UserList, UserSearchList,
        UserStatus,
    },
    error::AppResult,
    middleware::{auth::AuthUser, client::ClientInfo},
    models::User,
    response::ApiResponse,
    routes::params::{UserListQuery, UserSearchQuery},
    services::user_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/search", get(search_users))
        .route("/{id}", get(get_user).put(update_user).delete(delete_user))
        .route("/{id}/toggle-status", post(toggle_status))
        .route("/{id}/login-history", get(login_history))
}

#[utoipa::path(
    get,
    path = "/api/users",
    params(UserListQuery),
    responses(
        (status = 200, description = "Paginated users (admin only)", body = ApiResponse<UserList>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<UserListQuery>,
) -> AppResult<Json<ApiResponse<UserList>>> {
    let resp = user_service::list_users(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = ApiResponse<User>),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Email already registered"),
        (status = 422, description = "Validation error")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    user: AuthUser,
    client: ClientInfo,
    Json(payload): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<User>>)> {
    let resp = user_service::create_user(&state, &user, payload, &client).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/users/search",
    params(UserSearchQuery),
    responses(
        (status = 200, description = "Up to ten matching users", body = ApiResponse<UserSearchList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn search_users(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<UserSearchQuery>,
) -> AppResult<Json<ApiResponse<UserSearchList>>> {
    let resp = user_service::search_users(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User detail", body = ApiResponse<User>),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = user_service::get_user(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = ApiResponse<User>),
        (status = 400, description = "Cannot demote or deactivate yourself"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Email already registered")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    user: AuthUser,
    client: ClientInfo,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = user_service::update_user(&state, &user, id, payload, &client).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User deleted"),
        (status = 400, description = "Cannot delete your own account"),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    user: AuthUser,
    client: ClientInfo,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = user_service::delete_user(&state, &user, id, &client).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/users/{id}/toggle-status",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "New active flag", body = ApiResponse<UserStatus>),
        (status = 400, description = "Cannot deactivate your own account"),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn toggle_status(
    State(state): State<AppState>,
    user: AuthUser,
    client: ClientInfo,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<UserStatus>>> {
    let resp = user_service::toggle_user_status(&state, &user, id, &client).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}/login-history",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "Last 50 login records", body = ApiResponse<LoginHistoryList>),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn login_history(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<LoginHistoryList>>> {
    let resp = user_service::user_login_history(&state, &user, id).await?;
    Ok(Json(resp))
}
