pub mod audit_service;
pub mod auth_service;
pub mod dashboard_service;
pub mod notification_service;
pub mod settings_service;
pub mod user_service;
