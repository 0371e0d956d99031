use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        audit::AuditLogList,
        auth::{LoginRequest, LoginResponse, MeResponse, UpdateProfileRequest},
        dashboard::{
            AdminDashboard, DailyCount, DashboardStats, DepartmentCount, RoleCount,
            RoleDashboard, UserAnalytics,
        },
        notifications::{CreateNotificationRequest, NotificationList},
        settings::{CreateSettingRequest, SaveSettingRequest, SettingList},
        users::{
            CreateUserRequest, LoginHistoryList, UpdateUserRequest, UserList, UserSearchList,
            UserSearchResult, UserStatus,
        },
    },
    models::{
        AuditAction, AuditLogEntry, Choice, LoginRecord, Notification, Priority, Role,
        SystemSetting, User,
    },
    response::{ApiResponse, Meta},
    routes::{audit_logs, auth, dashboard, health, notifications, params, settings, users},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::logout,
        auth::me,
        auth::update_me,
        users::list_users,
        users::create_user,
        users::search_users,
        users::get_user,
        users::update_user,
        users::delete_user,
        users::toggle_status,
        users::login_history,
        dashboard::admin_dashboard,
        dashboard::dashboard_stats,
        dashboard::user_analytics,
        dashboard::campaign_dashboard,
        dashboard::donation_dashboard,
        dashboard::volunteer_dashboard,
        settings::list_settings,
        settings::create_setting,
        settings::get_setting,
        settings::save_setting,
        settings::delete_setting,
        notifications::list_notifications,
        notifications::create_notification,
        notifications::mark_read,
        notifications::mark_unread,
        audit_logs::list_audit_logs
    ),
    components(
        schemas(
            User,
            Role,
            Priority,
            AuditAction,
            Choice,
            SystemSetting,
            Notification,
            AuditLogEntry,
            LoginRecord,
            LoginRequest,
            LoginResponse,
            MeResponse,
            UpdateProfileRequest,
            CreateUserRequest,
            UpdateUserRequest,
            UserList,
            UserSearchResult,
            UserSearchList,
            UserStatus,
            LoginHistoryList,
            RoleCount,
            AdminDashboard,
            DashboardStats,
            DailyCount,
            DepartmentCount,
            UserAnalytics,
            RoleDashboard,
            CreateSettingRequest,
            SaveSettingRequest,
            SettingList,
            CreateNotificationRequest,
            NotificationList,
            AuditLogList,
            params::Pagination,
            params::UserListQuery,
            params::UserSearchQuery,
            params::AuditLogQuery,
            Meta,
            ApiResponse<User>,
            ApiResponse<UserList>,
            ApiResponse<AdminDashboard>,
            ApiResponse<SettingList>,
            ApiResponse<NotificationList>,
            ApiResponse<AuditLogList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Login, logout and own profile"),
        (name = "Users", description = "User management (admin only)"),
        (name = "Dashboard", description = "Admin statistics and role dashboards"),
        (name = "Settings", description = "System settings (admin only)"),
        (name = "Notifications", description = "Admin notifications"),
        (name = "Audit", description = "Audit trail (admin only)"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
