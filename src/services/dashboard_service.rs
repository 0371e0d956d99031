use chrono::{DateTime, Duration, NaiveDate, Utc};
use sea_orm::{
    ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};

use crate::{
    dto::dashboard::{
        AdminDashboard, DailyCount, DashboardStats, DepartmentCount, RoleCount, RoleDashboard,
        UserAnalytics,
    },
    entity::{
        admin_notifications::{Column as NotifCol, Entity as AdminNotifications},
        audit_logs::{Column as AuditCol, Entity as AuditLogs},
        users::{Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin, ensure_role},
    models::{AuditLogEntry, Notification, Role, User},
    permissions::permissions_for,
    response::{ApiResponse, Meta},
    state::AppState,
};

const RECENT_USERS: u64 = 10;
const RECENT_NOTIFICATIONS: u64 = 5;
const RECENT_ACTIVITIES: u64 = 10;
const ONLINE_WINDOW_MINUTES: i64 = 15;
const ACTIVITY_WINDOW_HOURS: i64 = 1;
const TREND_DAYS: i64 = 30;
const TOP_DEPARTMENTS: i64 = 10;

/// One entry per role, in `Role::ALL` order, zero-filled for roles with no users.
pub fn role_counts(rows: &[(String, i64)]) -> Vec<RoleCount> {
    Role::ALL
        .iter()
        .map(|role| RoleCount {
            role: *role,
            label: role.display_name().to_string(),
            count: rows
                .iter()
                .filter(|(r, _)| r == role.as_str())
                .map(|(_, c)| *c)
                .sum(),
        })
        .collect()
}

fn count_for(counts: &[RoleCount], role: Role) -> i64 {
    counts
        .iter()
        .find(|c| c.role == role)
        .map(|c| c.count)
        .unwrap_or(0)
}

pub fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .unwrap_or(now)
}

async fn grouped_role_counts(state: &AppState, active_only: bool) -> AppResult<Vec<RoleCount>> {
    let mut finder = Users::find()
        .select_only()
        .column(UserCol::Role)
        .column_as(UserCol::Id.count(), "count")
        .group_by(UserCol::Role);
    if active_only {
        finder = finder.filter(UserCol::IsActive.eq(true));
    }
    let rows: Vec<(String, i64)> = finder.into_tuple().all(&state.orm).await?;
    Ok(role_counts(&rows))
}

pub async fn admin_dashboard(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<AdminDashboard>> {
    ensure_admin(user)?;
    let now = Utc::now();

    let total_users = Users::find().count(&state.orm).await? as i64;
    let active_users = Users::find()
        .filter(UserCol::IsActive.eq(true))
        .count(&state.orm)
        .await? as i64;
    let new_users_today = Users::find()
        .filter(UserCol::CreatedAt.gte(start_of_day(now)))
        .count(&state.orm)
        .await? as i64;

    let role_distribution = grouped_role_counts(state, false).await?;

    let recent_users = Users::find()
        .order_by_desc(UserCol::CreatedAt)
        .limit(RECENT_USERS)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(User::from)
        .collect();

    let recent_notifications = AdminNotifications::find()
        .filter(NotifCol::RecipientId.eq(user.user_id))
        .filter(NotifCol::IsRead.eq(false))
        .order_by_desc(NotifCol::CreatedAt)
        .limit(RECENT_NOTIFICATIONS)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Notification::from)
        .collect();

    let recent_activities = AuditLogs::find()
        .find_also_related(Users)
        .order_by_desc(AuditCol::Timestamp)
        .limit(RECENT_ACTIVITIES)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|(log, actor)| AuditLogEntry::from_entity(log, actor))
        .collect();

    let data = AdminDashboard {
        total_users,
        active_users,
        inactive_users: total_users - active_users,
        new_users_today,
        admin_count: count_for(&role_distribution, Role::Admin),
        campaign_manager_count: count_for(&role_distribution, Role::Campaign),
        donation_manager_count: count_for(&role_distribution, Role::Donation),
        volunteer_count: count_for(&role_distribution, Role::Volunteer),
        role_distribution,
        recent_users,
        recent_notifications,
        recent_activities,
    };
    Ok(ApiResponse::success("Admin dashboard", data, Some(Meta::empty())))
}

pub async fn dashboard_stats(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<DashboardStats>> {
    ensure_admin(user)?;
    let now = Utc::now();

    let total_users = Users::find().count(&state.orm).await? as i64;
    let active_users = Users::find()
        .filter(UserCol::IsActive.eq(true))
        .count(&state.orm)
        .await? as i64;
    let online_users = Users::find()
        .filter(UserCol::LastLogin.gte(now - Duration::minutes(ONLINE_WINDOW_MINUTES)))
        .count(&state.orm)
        .await? as i64;
    let recent_activities = AuditLogs::find()
        .filter(AuditCol::Timestamp.gte(now - Duration::hours(ACTIVITY_WINDOW_HOURS)))
        .count(&state.orm)
        .await? as i64;

    let data = DashboardStats {
        total_users,
        active_users,
        online_users,
        recent_activities,
        timestamp: now,
    };
    Ok(ApiResponse::success("Dashboard stats", data, Some(Meta::empty())))
}

pub async fn user_analytics(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<UserAnalytics>> {
    ensure_admin(user)?;
    let since = Utc::now() - Duration::days(TREND_DAYS);

    let trend: Vec<(NaiveDate, i64)> = sqlx::query_as(
        r#"
        SELECT (created_at AT TIME ZONE 'UTC')::date AS day, COUNT(*) AS count
        FROM users
        WHERE created_at >= $1
        GROUP BY day
        ORDER BY day
        "#,
    )
    .bind(since)
    .fetch_all(&state.pool)
    .await?;

    let departments: Vec<(String, i64)> = sqlx::query_as(
        r#"
        SELECT department, COUNT(*) AS count
        FROM users
        WHERE department <> ''
        GROUP BY department
        ORDER BY count DESC, department ASC
        LIMIT $1
        "#,
    )
    .bind(TOP_DEPARTMENTS)
    .fetch_all(&state.pool)
    .await?;

    let data = UserAnalytics {
        registration_trend: trend
            .into_iter()
            .map(|(day, count)| DailyCount { day, count })
            .collect(),
        active_by_role: grouped_role_counts(state, true).await?,
        department_stats: departments
            .into_iter()
            .map(|(department, count)| DepartmentCount { department, count })
            .collect(),
    };
    Ok(ApiResponse::success("User analytics", data, Some(Meta::empty())))
}

pub async fn role_dashboard(
    state: &AppState,
    user: &AuthUser,
    role: Role,
) -> AppResult<ApiResponse<RoleDashboard>> {
    ensure_role(user, role).map_err(|_| {
        AppError::Forbidden(format!(
            "You do not have access to the {} dashboard.",
            role.as_str()
        ))
    })?;

    let model = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let unread_notifications = AdminNotifications::find()
        .filter(NotifCol::RecipientId.eq(user.user_id))
        .filter(NotifCol::IsRead.eq(false))
        .count(&state.orm)
        .await? as i64;

    let data = RoleDashboard {
        user: User::from(model),
        role_display: role.display_name().to_string(),
        permissions: permissions_for(role).iter().map(|p| p.to_string()).collect(),
        unread_notifications,
    };
    Ok(ApiResponse::success(
        format!("{} dashboard", role.display_name()),
        data,
        Some(Meta::empty()),
    ))
}
