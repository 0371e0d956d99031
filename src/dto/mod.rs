pub mod audit;
pub mod auth;
pub mod dashboard;
pub mod notifications;
pub mod settings;
pub mod users;
