use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    models::{Choice, LoginRecord, Role, User},
    services::auth_service::normalize_email,
};

lazy_static::lazy_static! {
    pub static ref PHONE_REGEX: regex::Regex = regex::Regex::new(r"^\+?1?\d{9,15}$").unwrap();
}

/// Empty clears the number; anything else must match `PHONE_REGEX`.
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if phone.is_empty() || PHONE_REGEX.is_match(phone) {
        return Ok(());
    }
    let mut err = ValidationError::new("phone_format");
    err.message = Some(
        "Phone number must be entered in the format: \"+999999999\". Up to 15 digits allowed."
            .into(),
    );
    Err(err)
}

pub(crate) fn trim_in_place(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[validate(schema(function = "validate_password_confirmation"))]
pub struct CreateUserRequest {
    #[validate(
        email(message = "Enter a valid email address."),
        length(max = 254, message = "Email must be at most 254 characters.")
    )]
    pub email: String,
    #[validate(length(min = 1, max = 30, message = "First name must be 1-30 characters."))]
    pub first_name: String,
    #[validate(length(min = 1, max = 30, message = "Last name must be 1-30 characters."))]
    pub last_name: String,
    #[serde(default)]
    pub role: Role,
    #[validate(custom(function = "validate_phone"))]
    pub phone_number: Option<String>,
    #[validate(length(max = 100, message = "Department must be at most 100 characters."))]
    #[serde(default)]
    pub department: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters."))]
    pub password: String,
    pub password_confirm: String,
}

impl CreateUserRequest {
    /// Canonical form checked by `validate` and stored on insert.
    pub fn normalize(&mut self) {
        self.email = normalize_email(&self.email);
        trim_in_place(&mut self.first_name);
        trim_in_place(&mut self.last_name);
        trim_in_place(&mut self.department);
        if let Some(phone) = self.phone_number.as_mut() {
            trim_in_place(phone);
        }
    }
}

fn validate_password_confirmation(req: &CreateUserRequest) -> Result<(), ValidationError> {
    if req.password != req.password_confirm {
        let mut err = ValidationError::new("password_mismatch");
        err.message = Some("The two password fields didn't match.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateUserRequest {
    #[validate(
        email(message = "Enter a valid email address."),
        length(max = 254, message = "Email must be at most 254 characters.")
    )]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 30, message = "First name must be 1-30 characters."))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 30, message = "Last name must be 1-30 characters."))]
    pub last_name: Option<String>,
    pub role: Option<Role>,
    #[validate(custom(function = "validate_phone"))]
    pub phone_number: Option<String>,
    #[validate(length(max = 100, message = "Department must be at most 100 characters."))]
    pub department: Option<String>,
    pub is_active: Option<bool>,
    #[validate(length(min = 8, message = "Password must be at least 8 characters."))]
    pub password: Option<String>,
}

impl UpdateUserRequest {
    pub fn normalize(&mut self) {
        if let Some(email) = self.email.as_mut() {
            *email = normalize_email(email);
        }
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

#[derive(Debug, Serialize, ToSchema)]
pub struct UserList {
    pub items: Vec<User>,
    pub role_choices: Vec<Choice>,
    pub search_query: String,
    pub selected_role: Option<Role>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserSearchResult {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserSearchList {
    pub results: Vec<UserSearchResult>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserStatus {
    pub id: Uuid,
    pub is_active: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginHistoryList {
    pub target_user: User,
    pub items: Vec<LoginRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateUserRequest {
        CreateUserRequest {
            email: "grace@example.org".into(),
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            role: Role::Campaign,
            phone_number: Some("+15551234567".into()),
            department: "Outreach".into(),
            password: "s3cure-pass".into(),
            password_confirm: "s3cure-pass".into(),
        }
    }

    #[test]
    fn valid_request_passes() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn mismatched_passwords_are_rejected() {
        let mut req = request();
        req.password_confirm = "other-pass".into();
        assert!(req.validate().is_err());
    }

    #[test]
    fn short_password_and_bad_phone_are_rejected() {
        let mut req = request();
        req.password = "short".into();
        req.password_confirm = "short".into();
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));

        let mut req = request();
        req.phone_number = Some("12-34".into());
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("phone_number"));
    }

    #[test]
    fn phone_pattern_matches_international_numbers() {
        assert!(PHONE_REGEX.is_match("+999999999"));
        assert!(PHONE_REGEX.is_match("123456789012345"));
        assert!(!PHONE_REGEX.is_match("12345678"));
        assert!(!PHONE_REGEX.is_match("+1 555 123"));
    }

    #[test]
    fn padded_email_is_valid_once_normalized() {
        let mut req = request();
        req.email = "  Grace@Example.ORG ".into();
        req.first_name = " Grace ".into();
        req.normalize();
        assert!(req.validate().is_ok());
        assert_eq!(req.email, "grace@example.org");
        assert_eq!(req.first_name, "Grace");
    }

    #[test]
    fn blank_names_fail_after_trimming() {
        let mut req = UpdateUserRequest {
            first_name: Some("   ".into()),
            department: Some(" Outreach ".into()),
            ..Default::default()
        };
        req.normalize();
        assert_eq!(req.department.as_deref(), Some("Outreach"));
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("first_name"));
    }

    #[test]
    fn empty_phone_clears_instead_of_failing() {
        let mut req = request();
        req.phone_number = Some(String::new());
        assert!(req.validate().is_ok());

        let update = UpdateUserRequest {
            phone_number: Some(String::new()),
            ..Default::default()
        };
        assert!(update.validate().is_ok());

        let update = UpdateUserRequest {
            phone_number: Some("12-34".into()),
            ..Default::default()
        };
        assert!(update.validate().unwrap_err().field_errors().contains_key("phone_number"));
    }

    #[test]
    fn update_rejects_overlong_email() {
        let local = "a".repeat(64);
        let domain = format!("{}.{}.{}.org", "b".repeat(63), "c".repeat(63), "d".repeat(63));
        let email = format!("{local}@{domain}");
        assert!(email.len() > 254);
        let update = UpdateUserRequest {
            email: Some(email),
            ..Default::default()
        };
        assert!(update.validate().unwrap_err().field_errors().contains_key("email"));
    }

    #[test]
    fn missing_role_defaults_to_volunteer() {
        let req: CreateUserRequest = serde_json::from_value(serde_json::json!({
            "email": "v@example.org",
            "first_name": "Val",
            "last_name": "Unteer",
            "password": "password1",
            "password_confirm": "password1"
        }))
        .unwrap();
        assert_eq!(req.role, Role::Volunteer);
        assert_eq!(req.department, "");
    }
}
