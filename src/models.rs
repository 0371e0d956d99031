use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entity::{admin_notifications, audit_logs, login_history, system_settings, users},
    error::AppError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    #[default]
    Volunteer,
    Campaign,
    Donation,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Volunteer, Role::Campaign, Role::Donation];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Volunteer => "volunteer",
            Role::Campaign => "campaign",
            Role::Donation => "donation",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Volunteer => "Volunteer",
            Role::Campaign => "Campaign Manager",
            Role::Donation => "Donation Manager",
        }
    }

    pub fn dashboard_url(&self) -> &'static str {
        match self {
            Role::Admin => "/dashboard/admin/",
            Role::Volunteer => "/dashboard/volunteer/",
            Role::Campaign => "/dashboard/campaign/",
            Role::Donation => "/dashboard/donation/",
        }
    }

    pub fn badge(&self) -> &'static str {
        match self {
            Role::Admin => "bg-danger",
            Role::Volunteer => "bg-success",
            Role::Campaign => "bg-primary",
            Role::Donation => "bg-warning",
        }
    }

    /// Roles stored before the check constraint existed fall back to the default.
    pub fn from_db(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| AppError::BadRequest(format!("Invalid role: {s}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Urgent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

    pub fn badge(&self) -> &'static str {
        match self {
            Priority::Low => "bg-secondary",
            Priority::Medium => "bg-info",
            Priority::High => "bg-warning",
            Priority::Urgent => "bg-danger",
        }
    }
}

impl FromStr for Priority {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Priority::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| AppError::BadRequest(format!("Invalid priority: {s}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Login,
    Logout,
    View,
    Export,
    Import,
}

impl AuditAction {
    pub const ALL: [AuditAction; 8] = [
        AuditAction::Create,
        AuditAction::Update,
        AuditAction::Delete,
        AuditAction::Login,
        AuditAction::Logout,
        AuditAction::View,
        AuditAction::Export,
        AuditAction::Import,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "create",
            AuditAction::Update => "update",
            AuditAction::Delete => "delete",
            AuditAction::Login => "login",
            AuditAction::Logout => "logout",
            AuditAction::View => "view",
            AuditAction::Export => "export",
            AuditAction::Import => "import",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AuditAction::Create => "Create",
            AuditAction::Update => "Update",
            AuditAction::Delete => "Delete",
            AuditAction::Login => "Login",
            AuditAction::Logout => "Logout",
            AuditAction::View => "View",
            AuditAction::Export => "Export",
            AuditAction::Import => "Import",
        }
    }
}

impl FromStr for AuditAction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AuditAction::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| AppError::BadRequest(format!("Invalid action: {s}")))
    }
}

/// A `(value, label)` pair for filter dropdowns.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

impl Choice {
    pub fn roles() -> Vec<Choice> {
        Role::ALL
            .iter()
            .map(|r| Choice {
                value: r.as_str().into(),
                label: r.display_name().into(),
            })
            .collect()
    }

    pub fn audit_actions() -> Vec<Choice> {
        AuditAction::ALL
            .iter()
            .map(|a| Choice {
                value: a.as_str().into(),
                label: a.label().into(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub role: Role,
    pub role_display: String,
    pub role_badge: String,
    pub phone_number: Option<String>,
    pub department: String,
    pub is_active: bool,
    pub email_verified: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub fn full_name(first_name: &str, last_name: &str) -> String {
    format!("{first_name} {last_name}").trim().to_string()
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        let role = Role::from_db(&model.role);
        User {
            id: model.id,
            full_name: full_name(&model.first_name, &model.last_name),
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            role,
            role_display: role.display_name().into(),
            role_badge: role.badge().into(),
            phone_number: model.phone_number,
            department: model.department,
            is_active: model.is_active,
            email_verified: model.email_verified,
            last_login: model.last_login.map(|dt| dt.with_timezone(&Utc)),
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SystemSetting {
    pub id: Uuid,
    pub key: String,
    pub value: String,
    pub description: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
}

impl From<system_settings::Model> for SystemSetting {
    fn from(model: system_settings::Model) -> Self {
        SystemSetting {
            id: model.id,
            key: model.key,
            value: model.value,
            description: model.description,
            is_active: model.is_active,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
            updated_by: model.updated_by,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Notification {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    pub priority: Priority,
    pub badge: String,
    pub is_read: bool,
    pub recipient_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

impl From<admin_notifications::Model> for Notification {
    fn from(model: admin_notifications::Model) -> Self {
        let priority: Priority = model.priority.parse().unwrap_or_default();
        Notification {
            id: model.id,
            title: model.title,
            message: model.message,
            priority,
            badge: priority.badge().into(),
            is_read: model.is_read,
            recipient_id: model.recipient_id,
            created_at: model.created_at.with_timezone(&Utc),
            read_at: model.read_at.map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub user_email: Option<String>,
    pub action: String,
    pub model_name: String,
    pub object_id: String,
    pub object_repr: String,
    #[schema(value_type = Option<Object>)]
    pub changes: Option<Value>,
    pub ip_address: String,
    pub user_agent: String,
    pub timestamp: DateTime<Utc>,
}

impl AuditLogEntry {
    pub fn from_entity(model: audit_logs::Model, user: Option<users::Model>) -> Self {
        AuditLogEntry {
            id: model.id,
            user_id: model.user_id,
            user_email: user.map(|u| u.email),
            action: model.action,
            model_name: model.model_name,
            object_id: model.object_id,
            object_repr: model.object_repr,
            changes: model.changes,
            ip_address: model.ip_address,
            user_agent: model.user_agent,
            timestamp: model.timestamp.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoginRecord {
    pub id: Uuid,
    pub ip_address: String,
    pub user_agent: String,
    pub login_time: DateTime<Utc>,
    pub logout_time: Option<DateTime<Utc>>,
    pub login_successful: bool,
    pub failure_reason: String,
}

impl From<login_history::Model> for LoginRecord {
    fn from(model: login_history::Model) -> Self {
        LoginRecord {
            id: model.id,
            ip_address: model.ip_address,
            user_agent: model.user_agent,
            login_time: model.login_time.with_timezone(&Utc),
            logout_time: model.logout_time.map(|dt| dt.with_timezone(&Utc)),
            login_successful: model.login_successful,
            failure_reason: model.failure_reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_str() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("superuser".parse::<Role>().is_err());
        assert_eq!(Role::from_db("garbage"), Role::Volunteer);
    }

    #[test]
    fn dashboard_urls_follow_role() {
        assert_eq!(Role::Admin.dashboard_url(), "/dashboard/admin/");
        assert_eq!(Role::Campaign.dashboard_url(), "/dashboard/campaign/");
        assert_eq!(Role::Donation.dashboard_url(), "/dashboard/donation/");
        assert_eq!(Role::Volunteer.dashboard_url(), "/dashboard/volunteer/");
    }

    #[test]
    fn priority_defaults_to_medium_with_info_badge() {
        let p = Priority::default();
        assert_eq!(p, Priority::Medium);
        assert_eq!(p.badge(), "bg-info");
        assert_eq!(Priority::Urgent.badge(), "bg-danger");
    }

    #[test]
    fn full_name_trims_missing_parts() {
        assert_eq!(full_name("Ada", "Lovelace"), "Ada Lovelace");
        assert_eq!(full_name("Ada", ""), "Ada");
        assert_eq!(full_name("", ""), "");
    }

    #[test]
    fn audit_action_choices_cover_every_action() {
        let choices = Choice::audit_actions();
        assert_eq!(choices.len(), 8);
        assert_eq!(choices[0].value, "create");
        assert_eq!(choices[7].label, "Import");
    }
}
