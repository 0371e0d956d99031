use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};

use crate::{
    dto::audit::AuditLogList,
    entity::{
        audit_logs::{Column, Entity as AuditLogs},
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{AuditAction, AuditLogEntry, Choice},
    response::{ApiResponse, Meta},
    routes::params::{AUDIT_PER_PAGE, AuditLogQuery},
    state::AppState,
};

/// `[date_from 00:00, date_to + 1 day 00:00)` in UTC.
pub fn date_bounds(
    date_from: Option<NaiveDate>,
    date_to: Option<NaiveDate>,
) -> AppResult<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)> {
    if let (Some(from), Some(to)) = (date_from, date_to) {
        if from > to {
            return Err(AppError::BadRequest(
                "date_from must not be after date_to".into(),
            ));
        }
    }
    let start = date_from
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc());
    let end = date_to
        .and_then(|d| d.succ_opt())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc());
    Ok((start, end))
}

pub async fn list_audit_logs(
    state: &AppState,
    user: &AuthUser,
    query: AuditLogQuery,
) -> AppResult<ApiResponse<AuditLogList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize_with(AUDIT_PER_PAGE);

    let mut condition = Condition::all();
    if let Some(user_id) = query.user_id {
        condition = condition.add(Column::UserId.eq(user_id));
    }
    if let Some(action) = query.action.as_deref().filter(|a| !a.is_empty()) {
        let action = AuditAction::from_str(action)?;
        condition = condition.add(Column::Action.eq(action.as_str()));
    }
    let (start, end) = date_bounds(query.date_from, query.date_to)?;
    if let Some(start) = start {
        condition = condition.add(Column::Timestamp.gte(start));
    }
    if let Some(end) = end {
        condition = condition.add(Column::Timestamp.lt(end));
    }

    let finder = AuditLogs::find()
        .filter(condition)
        .order_by_desc(Column::Timestamp);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .find_also_related(Users)
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|(log, actor)| AuditLogEntry::from_entity(log, actor))
        .collect();

    let data = AuditLogList {
        items,
        action_choices: Choice::audit_actions(),
    };
    Ok(ApiResponse::success(
        "Audit logs",
        data,
        Some(Meta::new(page, limit, total)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn date_bounds_are_inclusive_of_the_last_day() {
        let from = NaiveDate::from_ymd_opt(2026, 1, 1);
        let to = NaiveDate::from_ymd_opt(2026, 1, 31);
        let (start, end) = date_bounds(from, to).unwrap();
        assert_eq!(start, Some(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()));
        assert_eq!(end, Some(Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap()));
    }

    #[test]
    fn reversed_range_is_rejected() {
        let from = NaiveDate::from_ymd_opt(2026, 2, 1);
        let to = NaiveDate::from_ymd_opt(2026, 1, 1);
        assert!(matches!(date_bounds(from, to), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn open_ended_bounds() {
        assert_eq!(date_bounds(None, None).unwrap(), (None, None));
    }
}
