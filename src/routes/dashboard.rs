use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::dashboard::{AdminDashboard, DashboardStats, RoleDashboard, UserAnalytics},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Role,
    response::ApiResponse,
    services::dashboard_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin", get(admin_dashboard))
        .route("/admin/stats", get(dashboard_stats))
        .route("/admin/analytics", get(user_analytics))
        .route("/campaign", get(campaign_dashboard))
        .route("/donation", get(donation_dashboard))
        .route("/volunteer", get(volunteer_dashboard))
}

#[utoipa::path(
    get,
    path = "/api/dashboard/admin",
    responses(
        (status = 200, description = "Admin overview", body = ApiResponse<AdminDashboard>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn admin_dashboard(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<AdminDashboard>>> {
    let resp = dashboard_service::admin_dashboard(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/dashboard/admin/stats",
    responses(
        (status = 200, description = "Live counters for polling", body = ApiResponse<DashboardStats>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn dashboard_stats(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<DashboardStats>>> {
    let resp = dashboard_service::dashboard_stats(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/dashboard/admin/analytics",
    responses(
        (status = 200, description = "Registration trend and breakdowns", body = ApiResponse<UserAnalytics>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn user_analytics(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<UserAnalytics>>> {
    let resp = dashboard_service::user_analytics(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/dashboard/campaign",
    responses(
        (status = 200, description = "Campaign manager dashboard", body = ApiResponse<RoleDashboard>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn campaign_dashboard(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<RoleDashboard>>> {
    let resp = dashboard_service::role_dashboard(&state, &user, Role::Campaign).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/dashboard/donation",
    responses(
        (status = 200, description = "Donation manager dashboard", body = ApiResponse<RoleDashboard>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn donation_dashboard(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<RoleDashboard>>> {
    let resp = dashboard_service::role_dashboard(&state, &user, Role::Donation).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/dashboard/volunteer",
    responses(
        (status = 200, description = "Volunteer dashboard", body = ApiResponse<RoleDashboard>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn volunteer_dashboard(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<RoleDashboard>>> {
    let resp = dashboard_service::role_dashboard(&state, &user, Role::Volunteer).await?;
    Ok(Json(resp))
}
