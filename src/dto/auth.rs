use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::dto::users::{trim_in_place, validate_phone};
use crate::models::User;
use crate::services::auth_service::normalize_email;

#[derive(Deserialize, Debug, ToSchema, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,
}

impl LoginRequest {
    pub fn normalize(&mut self) {
        self.email = normalize_email(&self.email);
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: i64,
    pub user: User,
    pub dashboard_url: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub user: User,
    pub dashboard_url: String,
    pub permissions: Vec<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 30, message = "First name must be 1-30 characters."))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 30, message = "Last name must be 1-30 characters."))]
    pub last_name: Option<String>,
    #[validate(custom(function = "validate_phone"))]
    pub phone_number: Option<String>,
    #[validate(length(max = 100, message = "Department must be at most 100 characters."))]
    pub department: Option<String>,
}

impl UpdateProfileRequest {
    pub fn normalize(&mut self) {
        for field in [
            &mut self.first_name,
            &mut self.last_name,
            &mut self.phone_number,
            &mut self.department,
        ] {
            if let Some(value) = field.as_mut() {
                trim_in_place(value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_email_is_trimmed_before_validation() {
        let mut req = LoginRequest {
            email: "  DONOR@example.org ".into(),
            password: "secret".into(),
        };
        assert!(req.validate().is_err());
        req.normalize();
        assert_eq!(req.email, "donor@example.org");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn profile_phone_can_be_cleared() {
        let mut req = UpdateProfileRequest {
            phone_number: Some("  ".into()),
            last_name: Some(" Lovelace ".into()),
            ..Default::default()
        };
        req.normalize();
        assert!(req.validate().is_ok());
        assert_eq!(req.phone_number.as_deref(), Some(""));
        assert_eq!(req.last_name.as_deref(), Some("Lovelace"));
    }
}
