use axum::{extract::FromRequestParts, http::header, http::request::Parts};
use jsonwebtoken::{DecodingKey, Validation, decode};
use sea_orm::EntityTrait;
use uuid::Uuid;

use crate::{
    dto::auth::Claims,
    entity::users::Entity as Users,
    error::AppError,
    models::Role,
    state::AppState,
};

/// Authenticated caller, re-read from the database on every request so that
/// deactivation and role changes take effect before the token expires.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

pub fn ensure_role(user: &AuthUser, role: Role) -> Result<(), AppError> {
    if user.role != role {
        tracing::warn!(
            user_id = %user.user_id,
            role = %user.role,
            required = %role,
            "role check failed"
        );
        return Err(AppError::forbidden());
    }
    Ok(())
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, Role::Admin)
}

pub fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let auth_header = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;

    auth_str
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Invalid Authorization scheme".into()))
}

pub fn decode_claims(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = decode_claims(token, &state.auth.jwt_secret)?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Unauthorized("Invalid user id in token".into()))?;

        let user = Users::find_by_id(user_id)
            .one(&state.orm)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| AppError::Unauthorized("Account is not active".into()))?;

        Ok(AuthUser {
            user_id,
            email: user.email,
            role: Role::from_db(&user.role),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(header_value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(v) = header_value {
            builder = builder.header(header::AUTHORIZATION, v);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn bearer_token_requires_scheme() {
        assert!(matches!(
            bearer_token(&parts_with(None)),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            bearer_token(&parts_with(Some("Basic abc"))),
            Err(AppError::Unauthorized(_))
        ));
        assert_eq!(bearer_token(&parts_with(Some("Bearer abc"))).unwrap(), "abc");
    }

    #[test]
    fn ensure_role_rejects_other_roles() {
        let user = AuthUser {
            user_id: Uuid::new_v4(),
            email: "v@example.org".into(),
            role: Role::Volunteer,
        };
        assert!(ensure_role(&user, Role::Volunteer).is_ok());
        assert!(matches!(ensure_admin(&user), Err(AppError::Forbidden(_))));
    }

    #[test]
    fn garbage_token_is_unauthorized() {
        assert!(matches!(
            decode_claims("not-a-jwt", "secret"),
            Err(AppError::Unauthorized(_))
        ));
    }
}
