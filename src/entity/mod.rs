pub mod admin_notifications;
pub mod audit_logs;
pub mod login_history;
pub mod system_settings;
pub mod users;

pub use admin_notifications::Entity as AdminNotifications;
pub use audit_logs::Entity as AuditLogs;
pub use login_history::Entity as LoginHistory;
pub use system_settings::Entity as SystemSettings;
pub use users::Entity as Users;
