use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub phone_number: Option<String>,
    pub department: String,
    pub is_active: bool,
    pub email_verified: bool,
    pub failed_login_attempts: i32,
    pub account_locked_until: Option<DateTimeWithTimeZone>,
    pub last_login: Option<DateTimeWithTimeZone>,
    pub last_login_ip: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::admin_notifications::Entity")]
    AdminNotifications,
    #[sea_orm(has_many = "super::audit_logs::Entity")]
    AuditLogs,
    #[sea_orm(has_many = "super::login_history::Entity")]
    LoginHistory,
    #[sea_orm(has_many = "super::system_settings::Entity")]
    SystemSettings,
}

impl Related<super::admin_notifications::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AdminNotifications.def()
    }
}

impl Related<super::audit_logs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AuditLogs.def()
    }
}

impl Related<super::login_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LoginHistory.def()
    }
}

impl Related<super::system_settings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SystemSettings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
