use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
    ActiveValue::NotSet,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit::{self, AuditEntry},
    dto::notifications::{CreateNotificationRequest, NotificationList},
    entity::{
        admin_notifications::{self, ActiveModel, Column, Entity as AdminNotifications},
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::{
        auth::{AuthUser, ensure_admin},
        client::ClientInfo,
    },
    models::{AuditAction, Notification},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

pub async fn list_notifications(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<NotificationList>> {
    let (page, limit, offset) = pagination.normalize();

    let finder = AdminNotifications::find()
        .filter(Column::RecipientId.eq(user.user_id))
        .order_by_desc(Column::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let unread_count = finder
        .clone()
        .filter(Column::IsRead.eq(false))
        .count(&state.orm)
        .await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Notification::from)
        .collect();

    let data = NotificationList {
        items,
        unread_count,
    };
    Ok(ApiResponse::success(
        "Notifications",
        data,
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn create_notification(
    state: &AppState,
    user: &AuthUser,
    payload: CreateNotificationRequest,
    client: &ClientInfo,
) -> AppResult<ApiResponse<Notification>> {
    ensure_admin(user)?;
    payload.validate()?;

    let recipient = Users::find_by_id(payload.recipient_id)
        .one(&state.orm)
        .await?;
    if recipient.is_none() {
        return Err(AppError::BadRequest("Recipient not found".into()));
    }

    let created = ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(payload.title),
        message: Set(payload.message),
        priority: Set(payload.priority.as_str().to_string()),
        is_read: Set(false),
        recipient_id: Set(payload.recipient_id),
        created_at: NotSet,
        read_at: Set(None),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        AuditEntry::new(Some(user.user_id), AuditAction::Create, "AdminNotification", client)
            .object(created.id, created.title.clone())
            .changes(serde_json::json!({
                "recipient_id": created.recipient_id,
                "priority": created.priority,
            })),
    )
    .await;

    Ok(ApiResponse::success(
        "Notification sent",
        Notification::from(created),
        Some(Meta::empty()),
    ))
}

/// Flips the read flag. Only the recipient may do so; anyone else sees 404.
pub async fn set_read(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    read: bool,
) -> AppResult<ApiResponse<Notification>> {
    let existing = AdminNotifications::find_by_id(id)
        .filter(Column::RecipientId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if existing.is_read == read {
        return Ok(ApiResponse::success(
            "Notification unchanged",
            Notification::from(existing),
            Some(Meta::empty()),
        ));
    }

    let mut active: admin_notifications::ActiveModel = existing.into();
    active.is_read = Set(read);
    active.read_at = Set(read.then(|| Utc::now().into()));
    let updated = active.update(&state.orm).await?;

    let message = if read {
        "Notification marked as read"
    } else {
        "Notification marked as unread"
    };
    Ok(ApiResponse::success(
        message,
        Notification::from(updated),
        Some(Meta::empty()),
    ))
}
