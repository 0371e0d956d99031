use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};

use crate::{
    dto::settings::{CreateSettingRequest, SaveSettingRequest, SettingList},
    error::AppResult,
    middleware::{auth::AuthUser, client::ClientInfo},
    models::SystemSetting,
    response::ApiResponse,
    services::settings_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_settings).post(create_setting))
        .route(
            "/{key}",
            get(get_setting).put(save_setting).delete(delete_setting),
        )
}

#[utoipa::path(
    get,
    path = "/api/settings",
    responses(
        (status = 200, description = "Active settings ordered by key", body = ApiResponse<SettingList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn list_settings(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<SettingList>>> {
    let resp = settings_service::list_settings(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/settings",
    request_body = CreateSettingRequest,
    responses(
        (status = 201, description = "Setting created", body = ApiResponse<SystemSetting>),
        (status = 409, description = "Key already exists"),
        (status = 422, description = "Validation error")
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn create_setting(
    State(state): State<AppState>,
    user: AuthUser,
    client: ClientInfo,
    Json(payload): Json<CreateSettingRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<SystemSetting>>)> {
    let resp = settings_service::create_setting(&state, &user, payload, &client).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/settings/{key}",
    params(("key" = String, Path, description = "Setting key")),
    responses(
        (status = 200, description = "Setting", body = ApiResponse<SystemSetting>),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn get_setting(
    State(state): State<AppState>,
    user: AuthUser,
    Path(key): Path<String>,
) -> AppResult<Json<ApiResponse<SystemSetting>>> {
    let resp = settings_service::get_setting(&state, &user, &key).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/settings/{key}",
    params(("key" = String, Path, description = "Setting key")),
    request_body = SaveSettingRequest,
    responses(
        (status = 200, description = "Setting created or updated", body = ApiResponse<SystemSetting>),
        (status = 422, description = "Validation error")
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn save_setting(
    State(state): State<AppState>,
    user: AuthUser,
    client: ClientInfo,
    Path(key): Path<String>,
    Json(payload): Json<SaveSettingRequest>,
) -> AppResult<Json<ApiResponse<SystemSetting>>> {
    let resp = settings_service::save_setting(&state, &user, &key, payload, &client).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/settings/{key}",
    params(("key" = String, Path, description = "Setting key")),
    responses(
        (status = 200, description = "Setting deleted"),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn delete_setting(
    State(state): State<AppState>,
    user: AuthUser,
    client: ClientInfo,
    Path(key): Path<String>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = settings_service::delete_setting(&state, &user, &key, &client).await?;
    Ok(Json(resp))
}
