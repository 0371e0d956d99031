use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{Notification, Priority};

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateNotificationRequest {
    pub recipient_id: Uuid,
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters."))]
    pub title: String,
    #[validate(length(min = 1, message = "Message is required."))]
    pub message: String,
    #[serde(default)]
    pub priority: Priority,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationList {
    pub items: Vec<Notification>,
    pub unread_count: i64,
}
