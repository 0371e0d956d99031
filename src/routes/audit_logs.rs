use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::audit::AuditLogList,
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::AuditLogQuery,
    services::audit_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_audit_logs))
}

#[utoipa::path(
    get,
    path = "/api/audit-logs",
    params(AuditLogQuery),
    responses(
        (status = 200, description = "Audit trail, newest first, 50 per page", body = ApiResponse<AuditLogList>),
        (status = 400, description = "Unknown action or bad date range"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Audit"
)]
pub async fn list_audit_logs(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<AuditLogQuery>,
) -> AppResult<Json<ApiResponse<AuditLogList>>> {
    let resp = audit_service::list_audit_logs(&state, &user, query).await?;
    Ok(Json(resp))
}
