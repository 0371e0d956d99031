use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
    ActiveValue::NotSet,
};
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit::{self, AuditEntry, ChangeSet},
    dto::users::{
        CreateUserRequest, LoginHistoryList, UpdateUserRequest, UserList, UserSearchList,
        UserSearchResult, UserStatus,
    },
    entity::{
        login_history::{Column as HistoryCol, Entity as LoginHistory},
        users::{self, ActiveModel, Column, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::{
        auth::{AuthUser, ensure_admin},
        client::ClientInfo,
    },
    models::{AuditAction, Choice, LoginRecord, Role, User, full_name},
    response::{ApiResponse, Meta},
    routes::params::{UserListQuery, UserSearchQuery},
    services::auth_service::hash_password,
    state::AppState,
};

const SEARCH_LIMIT: u64 = 10;
const LOGIN_HISTORY_LIMIT: u64 = 50;
const DUPLICATE_EMAIL: &str = "A user with this email already exists.";

/// Substring pattern for ILIKE; `\`, `%` and `_` in the term match literally.
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.trim().chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Case-insensitive match on email, names and department.
pub fn search_condition(search: &str, include_department: bool) -> Condition {
    let pattern = like_pattern(search);
    let mut any = Condition::any()
        .add(Expr::col(Column::Email).ilike(pattern.clone()))
        .add(Expr::col(Column::FirstName).ilike(pattern.clone()))
        .add(Expr::col(Column::LastName).ilike(pattern.clone()));
    if include_department {
        any = any.add(Expr::col(Column::Department).ilike(pattern));
    }
    any
}

pub async fn list_users(
    state: &AppState,
    user: &AuthUser,
    query: UserListQuery,
) -> AppResult<ApiResponse<UserList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let search = query
        .search
        .as_deref()
        .map(str::trim)
        .unwrap_or_default()
        .to_string();

    let mut condition = Condition::all();
    if !search.is_empty() {
        condition = condition.add(search_condition(&search, true));
    }
    if let Some(role) = query.role {
        condition = condition.add(Column::Role.eq(role.as_str()));
    }

    let finder = Users::find()
        .filter(condition)
        .order_by_desc(Column::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(User::from)
        .collect();

    let data = UserList {
        items,
        role_choices: Choice::roles(),
        search_query: search,
        selected_role: query.role,
    };
    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Users", data, Some(meta)))
}

pub async fn get_user(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<User>> {
    ensure_admin(user)?;
    let found = find_user(state, id).await?;
    Ok(ApiResponse::success("User", User::from(found), Some(Meta::empty())))
}

async fn find_user(state: &AppState, id: Uuid) -> AppResult<users::Model> {
    Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)
}

async fn email_taken(state: &AppState, email: &str, except: Option<Uuid>) -> AppResult<bool> {
    let mut finder = Users::find().filter(Column::Email.eq(email));
    if let Some(id) = except {
        finder = finder.filter(Column::Id.ne(id));
    }
    Ok(finder.count(&state.orm).await? > 0)
}

pub async fn create_user(
    state: &AppState,
    user: &AuthUser,
    mut payload: CreateUserRequest,
    client: &ClientInfo,
) -> AppResult<ApiResponse<User>> {
    ensure_admin(user)?;
    payload.normalize();
    payload.validate()?;

    let email = payload.email;
    if email_taken(state, &email, None).await? {
        return Err(AppError::Conflict(DUPLICATE_EMAIL.into()));
    }

    let password_hash = hash_password(&payload.password)?;
    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email),
        password_hash: Set(password_hash),
        first_name: Set(payload.first_name),
        last_name: Set(payload.last_name),
        role: Set(payload.role.as_str().to_string()),
        phone_number: Set(payload.phone_number.filter(|p| !p.is_empty())),
        department: Set(payload.department),
        is_active: Set(true),
        email_verified: Set(false),
        failed_login_attempts: Set(0),
        account_locked_until: Set(None),
        last_login: Set(None),
        last_login_ip: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    };
    let created = active.insert(&state.orm).await.map_err(|err| match AppError::from(err) {
        AppError::Conflict(_) => AppError::Conflict(DUPLICATE_EMAIL.into()),
        other => other,
    })?;

    audit::record(
        &state.pool,
        AuditEntry::new(Some(user.user_id), AuditAction::Create, "User", client)
            .object(created.id, created.email.clone())
            .changes(serde_json::json!({
                "email": created.email,
                "role": created.role,
            })),
    )
    .await;
    tracing::info!(user_id = %created.id, admin = %user.email, "user created");

    let created = User::from(created);
    Ok(ApiResponse::success(
        format!("User {} created successfully!", created.full_name),
        created,
        Some(Meta::empty()),
    ))
}

pub async fn update_user(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    mut payload: UpdateUserRequest,
    client: &ClientInfo,
) -> AppResult<ApiResponse<User>> {
    ensure_admin(user)?;
    payload.normalize();
    payload.validate()?;

    let existing = find_user(state, id).await?;
    let mut changes = ChangeSet::new();
    let mut active: ActiveModel = existing.clone().into();

    if let Some(email) = payload.email {
        if email != existing.email && email_taken(state, &email, Some(id)).await? {
            return Err(AppError::Conflict(DUPLICATE_EMAIL.into()));
        }
        changes.track("email", &existing.email, &email);
        active.email = Set(email);
    }
    if let Some(first_name) = payload.first_name {
        changes.track("first_name", &existing.first_name, &first_name);
        active.first_name = Set(first_name);
    }
    if let Some(last_name) = payload.last_name {
        changes.track("last_name", &existing.last_name, &last_name);
        active.last_name = Set(last_name);
    }
    if let Some(role) = payload.role {
        if id == user.user_id && role != Role::Admin {
            return Err(AppError::BadRequest(
                "You cannot remove your own admin role!".into(),
            ));
        }
        let role = role.as_str().to_string();
        changes.track("role", &existing.role, &role);
        active.role = Set(role);
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
    if let Some(is_active) = payload.is_active {
        if id == user.user_id && !is_active {
            return Err(AppError::BadRequest(
                "Cannot deactivate your own account".into(),
            ));
        }
        changes.track("is_active", &existing.is_active, &is_active);
        active.is_active = Set(is_active);
    }
    if let Some(password) = payload.password {
        active.password_hash = Set(hash_password(&password)?);
        active.failed_login_attempts = Set(0);
        active.account_locked_until = Set(None);
        changes.redacted("password");
    }

    if changes.is_empty() {
        return Ok(ApiResponse::success(
            "No changes",
            User::from(existing),
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
    tracing::info!(user_id = %updated.id, admin = %user.email, "user updated");

    let updated = User::from(updated);
    Ok(ApiResponse::success(
        format!("User {} updated successfully!", updated.full_name),
        updated,
        Some(Meta::empty()),
    ))
}

/// Notifications and login history go with the user; audit rows and settings
/// keep their data with the user reference cleared.
pub async fn delete_user(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    client: &ClientInfo,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    if id == user.user_id {
        return Err(AppError::BadRequest(
            "You cannot delete your own account!".into(),
        ));
    }

    let existing = find_user(state, id).await?;
    let result = Users::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    let name = full_name(&existing.first_name, &existing.last_name);
    audit::record(
        &state.pool,
        AuditEntry::new(Some(user.user_id), AuditAction::Delete, "User", client)
            .object(existing.id, existing.email.clone()),
    )
    .await;
    tracing::info!(user_id = %id, admin = %user.email, "user deleted");

    Ok(ApiResponse::success(
        format!("User {name} deleted successfully!"),
        serde_json::json!({ "id": id }),
        Some(Meta::empty()),
    ))
}

pub async fn toggle_user_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    client: &ClientInfo,
) -> AppResult<ApiResponse<UserStatus>> {
    ensure_admin(user)?;
    if id == user.user_id {
        return Err(AppError::BadRequest(
            "Cannot deactivate your own account".into(),
        ));
    }

    let existing = find_user(state, id).await?;
    let is_active = !existing.is_active;

    let mut active: ActiveModel = existing.into();
    active.is_active = Set(is_active);
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        AuditEntry::new(Some(user.user_id), AuditAction::Update, "User", client)
            .object(updated.id, updated.email.clone())
            .changes(serde_json::json!({
                "is_active": { "old": !is_active, "new": is_active }
            })),
    )
    .await;

    let verb = if is_active { "activated" } else { "deactivated" };
    tracing::info!(user_id = %id, admin = %user.email, verb, "user status toggled");

    Ok(ApiResponse::success(
        format!("User {verb} successfully"),
        UserStatus { id, is_active },
        Some(Meta::empty()),
    ))
}

pub async fn user_login_history(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<LoginHistoryList>> {
    ensure_admin(user)?;
    let target = find_user(state, id).await?;

    let items = LoginHistory::find()
        .filter(HistoryCol::UserId.eq(id))
        .order_by_desc(HistoryCol::LoginTime)
        .limit(LOGIN_HISTORY_LIMIT)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(LoginRecord::from)
        .collect();

    let data = LoginHistoryList {
        target_user: User::from(target),
        items,
    };
    Ok(ApiResponse::success("Login history", data, Some(Meta::empty())))
}

pub async fn search_users(
    state: &AppState,
    user: &AuthUser,
    query: UserSearchQuery,
) -> AppResult<ApiResponse<UserSearchList>> {
    ensure_admin(user)?;
    let q = query.q.unwrap_or_default();

    let results = Users::find()
        .filter(search_condition(&q, false))
        .order_by_desc(Column::CreatedAt)
        .limit(SEARCH_LIMIT)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|u| UserSearchResult {
            id: u.id,
            name: full_name(&u.first_name, &u.last_name),
            role: Role::from_db(&u.role).display_name().to_string(),
            email: u.email,
        })
        .collect();

    Ok(ApiResponse::success(
        "Search results",
        UserSearchList { results },
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern(" grace "), "%grace%");
        assert_eq!(like_pattern("%"), "%\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
        assert_eq!(like_pattern(r"c:\x"), r"%c:\\x%");
    }
}
