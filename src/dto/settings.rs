use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::SystemSetting;

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateSettingRequest {
    #[validate(length(min = 1, max = 100, message = "Key must be 1-100 characters."))]
    pub key: String,
    #[validate(length(min = 1, message = "Value is required."))]
    pub value: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SaveSettingRequest {
    #[validate(length(min = 1, message = "Value is required."))]
    pub value: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SettingList {
    pub items: Vec<SystemSetting>,
}
