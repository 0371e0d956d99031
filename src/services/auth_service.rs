use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    ActiveValue::NotSet,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit::{self, AuditEntry, ChangeSet},
    config::AuthConfig,
    dto::auth::{Claims, LoginRequest, LoginResponse, MeResponse, UpdateProfileRequest},
    entity::{
        login_history::{self, Column as HistoryCol, Entity as LoginHistory},
        users::{self, Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::{auth::AuthUser, client::ClientInfo},
    models::{AuditAction, Role, User},
    permissions::permissions_for,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub const MAX_FAILED_ATTEMPTS: i32 = 5;
pub const LOCKOUT_MINUTES: i64 = 30;

const INVALID_CREDENTIALS: &str = "Invalid email or password.";

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn is_locked(locked_until: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    locked_until.is_some_and(|until| now < until)
}

/// Counts one more failed attempt; the account locks once the count reaches
/// `MAX_FAILED_ATTEMPTS`.
pub fn register_failure(
    attempts: i32,
    locked_until: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> (i32, Option<DateTime<Utc>>) {
    let attempts = attempts.saturating_add(1);
    if attempts >= MAX_FAILED_ATTEMPTS {
        (attempts, Some(now + Duration::minutes(LOCKOUT_MINUTES)))
    } else {
        (attempts, locked_until)
    }
}

pub fn issue_token(auth: &AuthConfig, user_id: Uuid, role: Role) -> AppResult<(String, i64)> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(auth.token_ttl_hours))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user_id.to_string(),
        role: role.as_str().to_string(),
        exp: expiration.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(auth.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;

    Ok((token, expiration.timestamp()))
}

pub async fn login_user(
    state: &AppState,
    mut payload: LoginRequest,
    client: &ClientInfo,
) -> AppResult<ApiResponse<LoginResponse>> {
    payload.normalize();
    payload.validate()?;
    let email = payload.email;

    let user = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;
    let user = match user {
        Some(u) => u,
        None => {
            tracing::warn!(email = %email, ip = %client.ip_address, "failed login for unknown email");
            return Err(AppError::BadRequest(INVALID_CREDENTIALS.into()));
        }
    };

    if !user.is_active {
        return Err(AppError::Forbidden(
            "This account has been deactivated.".into(),
        ));
    }

    let now = Utc::now();
    let locked_until = user.account_locked_until.map(|dt| dt.with_timezone(&Utc));
    if is_locked(locked_until, now) {
        return Err(AppError::Forbidden(
            "Account is temporarily locked. Please try again later.".into(),
        ));
    }

    if !verify_password(&payload.password, &user.password_hash)? {
        let (attempts, lock) = register_failure(user.failed_login_attempts, locked_until, now);
        let user_id = user.id;
        let mut active: users::ActiveModel = user.into();
        active.failed_login_attempts = Set(attempts);
        active.account_locked_until = Set(lock.map(Into::into));
        active.update(&state.orm).await?;

        record_login(state, user_id, client, false, "Invalid credentials").await?;
        tracing::warn!(
            email = %email,
            ip = %client.ip_address,
            attempts,
            locked = lock.is_some(),
            "failed login attempt"
        );
        return Err(AppError::BadRequest(INVALID_CREDENTIALS.into()));
    }

    let mut active: users::ActiveModel = user.into();
    active.failed_login_attempts = Set(0);
    active.account_locked_until = Set(None);
    active.last_login = Set(Some(now.into()));
    active.last_login_ip = Set(Some(client.ip_address.clone()));
    let user = active.update(&state.orm).await?;

    record_login(state, user.id, client, true, "").await?;

    let role = Role::from_db(&user.role);
    let (token, expires_at) = issue_token(&state.auth, user.id, role)?;

    audit::record(
        &state.pool,
        AuditEntry::new(Some(user.id), AuditAction::Login, "User", client)
            .object(user.id, user.email.clone()),
    )
    .await;
    tracing::info!(user_id = %user.id, ip = %client.ip_address, "successful login");

    let user = User::from(user);
    let resp = LoginResponse {
        token: format!("Bearer {}", token),
        expires_at,
        dashboard_url: role.dashboard_url().to_string(),
        user,
    };

    Ok(ApiResponse::success(
        format!("Welcome back, {}!", resp.user.full_name),
        resp,
        Some(Meta::empty()),
    ))
}

async fn record_login(
    state: &AppState,
    user_id: Uuid,
    client: &ClientInfo,
    successful: bool,
    failure_reason: &str,
) -> AppResult<()> {
    login_history::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        ip_address: Set(client.ip_address.clone()),
        user_agent: Set(client.user_agent.clone()),
        login_time: NotSet,
        logout_time: Set(None),
        login_successful: Set(successful),
        failure_reason: Set(failure_reason.to_string()),
    }
    .insert(&state.orm)
    .await?;
    Ok(())
}

pub async fn logout_user(
    state: &AppState,
    user: &AuthUser,
    client: &ClientInfo,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let open_session = LoginHistory::find()
        .filter(HistoryCol::UserId.eq(user.user_id))
        .filter(HistoryCol::LoginSuccessful.eq(true))
        .filter(HistoryCol::LogoutTime.is_null())
        .order_by_desc(HistoryCol::LoginTime)
        .one(&state.orm)
        .await?;

    if let Some(session) = open_session {
        let mut active: login_history::ActiveModel = session.into();
        active.logout_time = Set(Some(Utc::now().into()));
        active.update(&state.orm).await?;
    }

    audit::record(
        &state.pool,
        AuditEntry::new(Some(user.user_id), AuditAction::Logout, "User", client)
            .object(user.user_id, user.email.clone()),
    )
    .await;
    tracing::info!(user_id = %user.user_id, ip = %client.ip_address, "user logged out");

    Ok(ApiResponse::success(
        "You have been successfully logged out.",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn me(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<MeResponse>> {
    let model = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(ApiResponse::success("Profile", me_response(model), Some(Meta::empty())))
}

fn me_response(model: users::Model) -> MeResponse {
    let user = User::from(model);
    MeResponse {
        dashboard_url: user.role.dashboard_url().to_string(),
        permissions: permissions_for(user.role)
            .iter()
            .map(|p| p.to_string())
            .collect(),
        user,
    }
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    mut payload: UpdateProfileRequest,
    client: &ClientInfo,
) -> AppResult<ApiResponse<MeResponse>> {
    payload.normalize();
    payload.validate()?;

    let existing = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut changes = ChangeSet::new();
    let mut active: users::ActiveModel = existing.clone().into();
    if let Some(first_name) = payload.first_name {
        changes.track("first_name", &existing.first_name, &first_name);
        active.first_name = Set(first_name);
    }
    if let Some(last_name) = payload.last_name {
        changes.track("last_name", &existing.last_name, &last_name);
        active.last_name = Set(last_name);
    }
    if let Some(phone_number) = payload.phone_number {
        let phone_number = Some(phone_number).filter(|p| !p.is_empty());
        changes.track("phone_number", &existing.phone_number, &phone_number);
        active.phone_number = Set(phone_number);
    }
    if let Some(department) = payload.department {
        changes.track("department", &existing.department, &department);
        active.department = Set(department);
    }

    if changes.is_empty() {
        return Ok(ApiResponse::success(
            "Profile unchanged",
            me_response(existing),
            Some(Meta::empty()),
        ));
    }

    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        AuditEntry::new(Some(user.user_id), AuditAction::Update, "User", client)
            .object(updated.id, updated.email.clone())
            .changes(changes.into_value()),
    )
    .await;

    Ok(ApiResponse::success(
        "Your profile has been updated successfully!",
        me_response(updated),
        Some(Meta::empty()),
    ))
}
