use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{AuditLogEntry, Notification, Role, User};

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
pub struct RoleCount {
    pub role: Role,
    pub label: String,
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminDashboard {
    pub total_users: i64,
    pub active_users: i64,
    pub inactive_users: i64,
    pub new_users_today: i64,
    pub admin_count: i64,
    pub campaign_manager_count: i64,
    pub donation_manager_count: i64,
    pub volunteer_count: i64,
    pub role_distribution: Vec<RoleCount>,
    pub recent_users: Vec<User>,
    pub recent_notifications: Vec<Notification>,
    pub recent_activities: Vec<AuditLogEntry>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardStats {
    pub total_users: i64,
    pub active_users: i64,
    pub online_users: i64,
    pub recent_activities: i64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
pub struct DailyCount {
    pub day: NaiveDate,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
pub struct DepartmentCount {
    pub department: String,
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserAnalytics {
    pub registration_trend: Vec<DailyCount>,
    pub active_by_role: Vec<RoleCount>,
    pub department_stats: Vec<DepartmentCount>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RoleDashboard {
    pub user: User,
    pub role_display: String,
    pub permissions: Vec<String>,
    pub unread_notifications: i64,
}
