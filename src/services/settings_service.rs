use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    ActiveValue::NotSet,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit::{self, AuditEntry, ChangeSet},
    dto::settings::{CreateSettingRequest, SaveSettingRequest, SettingList},
    entity::system_settings::{self, ActiveModel, Column, Entity as SystemSettings},
    error::{AppError, AppResult},
    middleware::{
        auth::{AuthUser, ensure_admin},
        client::ClientInfo,
    },
    models::{AuditAction, SystemSetting},
    response::{ApiResponse, Meta},
    state::AppState,
};

const MODEL_NAME: &str = "SystemSettings";

async fn find_by_key(state: &AppState, key: &str) -> AppResult<Option<system_settings::Model>> {
    Ok(SystemSettings::find()
        .filter(Column::Key.eq(key))
        .one(&state.orm)
        .await?)
}

pub async fn list_settings(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<SettingList>> {
    ensure_admin(user)?;
    let items = SystemSettings::find()
        .filter(Column::IsActive.eq(true))
        .order_by_asc(Column::Key)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(SystemSetting::from)
        .collect();

    Ok(ApiResponse::success(
        "Settings",
        SettingList { items },
        Some(Meta::empty()),
    ))
}

pub async fn get_setting(
    state: &AppState,
    user: &AuthUser,
    key: &str,
) -> AppResult<ApiResponse<SystemSetting>> {
    ensure_admin(user)?;
    let setting = find_by_key(state, key).await?.ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success(
        "Setting",
        SystemSetting::from(setting),
        Some(Meta::empty()),
    ))
}

/// Inserts a new key. The unique index on `key` rejects duplicates.
pub async fn create_setting(
    state: &AppState,
    user: &AuthUser,
    payload: CreateSettingRequest,
    client: &ClientInfo,
) -> AppResult<ApiResponse<SystemSetting>> {
    ensure_admin(user)?;
    payload.validate()?;

    let key = payload.key.trim().to_string();
    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        key: Set(key.clone()),
        value: Set(payload.value),
        description: Set(payload.description),
        is_active: Set(true),
        created_at: NotSet,
        updated_at: NotSet,
        updated_by: Set(Some(user.user_id)),
    };
    let created = active.insert(&state.orm).await.map_err(|err| match AppError::from(err) {
        AppError::Conflict(_) => {
            AppError::Conflict(format!("Setting with key '{key}' already exists"))
        }
        other => other,
    })?;

    audit::record(
        &state.pool,
        AuditEntry::new(Some(user.user_id), AuditAction::Create, MODEL_NAME, client)
            .object(created.id, created.key.clone())
            .changes(serde_json::json!({ "value": created.value })),
    )
    .await;

    Ok(ApiResponse::success(
        "Setting created successfully",
        SystemSetting::from(created),
        Some(Meta::empty()),
    ))
}

/// Get-or-create by key, then overwrite value, description and editor.
pub async fn save_setting(
    state: &AppState,
    user: &AuthUser,
    key: &str,
    payload: SaveSettingRequest,
    client: &ClientInfo,
) -> AppResult<ApiResponse<SystemSetting>> {
    ensure_admin(user)?;
    payload.validate()?;
    let key = key.trim();
    if key.is_empty() || key.chars().count() > 100 {
        return Err(AppError::Validation("Key must be 1-100 characters.".into()));
    }

    let (saved, action, changes) = match find_by_key(state, key).await? {
        Some(existing) => {
            let mut changes = ChangeSet::new();
            changes.track("value", &existing.value, &payload.value);
            changes.track("description", &existing.description, &payload.description);

            let mut active: ActiveModel = existing.into();
            active.value = Set(payload.value);
            active.description = Set(payload.description);
            active.updated_by = Set(Some(user.user_id));
            active.updated_at = Set(Utc::now().into());
            let saved = active.update(&state.orm).await?;
            (saved, AuditAction::Update, changes.into_value())
        }
        None => {
            let active = ActiveModel {
                id: Set(Uuid::new_v4()),
                key: Set(key.to_string()),
                value: Set(payload.value),
                description: Set(payload.description),
                is_active: Set(true),
                created_at: NotSet,
                updated_at: NotSet,
                updated_by: Set(Some(user.user_id)),
            };
            let saved = active.insert(&state.orm).await?;
            let changes = serde_json::json!({ "value": saved.value });
            (saved, AuditAction::Create, changes)
        }
    };

    audit::record(
        &state.pool,
        AuditEntry::new(Some(user.user_id), action, MODEL_NAME, client)
            .object(saved.id, saved.key.clone())
            .changes(changes),
    )
    .await;
    tracing::info!(key = %saved.key, admin = %user.email, "setting saved");

    Ok(ApiResponse::success(
        "Setting saved successfully",
        SystemSetting::from(saved),
        Some(Meta::empty()),
    ))
}

pub async fn delete_setting(
    state: &AppState,
    user: &AuthUser,
    key: &str,
    client: &ClientInfo,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let existing = find_by_key(state, key).await?.ok_or(AppError::NotFound)?;

    let result = SystemSettings::delete_by_id(existing.id)
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        AuditEntry::new(Some(user.user_id), AuditAction::Delete, MODEL_NAME, client)
            .object(existing.id, existing.key.clone()),
    )
    .await;

    Ok(ApiResponse::success(
        "Setting deleted",
        serde_json::json!({ "key": existing.key }),
        Some(Meta::empty()),
    ))
}
