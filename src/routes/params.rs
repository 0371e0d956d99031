use std::{fmt::Display, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, de};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::models::Role;

pub const DEFAULT_PER_PAGE: i64 = 20;
pub const AUDIT_PER_PAGE: i64 = 50;
const MAX_PER_PAGE: i64 = 100;

/// Treats a blank query value (`?role=`) like a missing one.
fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => {
            raw.trim().parse().map(Some).map_err(de::Error::custom)
        }
        _ => Ok(None),
    }
}

#[derive(Debug, Default, Clone, Copy, Deserialize, ToSchema, IntoParams)]
pub struct Pagination {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn new(page: Option<i64>, per_page: Option<i64>) -> Self {
        Self { page, per_page }
    }

    /// Returns `(page, per_page, offset)` with the default page size.
    pub fn normalize(&self) -> (i64, i64, i64) {
        self.normalize_with(DEFAULT_PER_PAGE)
    }

    pub fn normalize_with(&self, default_per_page: i64) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self
            .per_page
            .unwrap_or(default_per_page)
            .clamp(1, MAX_PER_PAGE);
        let offset = (page - 1).saturating_mul(per_page);
        (page, per_page, offset)
    }
}

// Query structs repeat the paging fields instead of using `#[serde(flatten)]`:
// urlencoded values inside a flattened struct only deserialize as strings.

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
pub struct UserListQuery {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub per_page: Option<i64>,
    /// Matches email, first name, last name or department.
    pub search: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub role: Option<Role>,
}

impl UserListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.per_page)
    }
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
pub struct UserSearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
pub struct AuditLogQuery {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub per_page: Option<i64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub user_id: Option<Uuid>,
    pub action: Option<String>,
    /// Inclusive, `YYYY-MM-DD`.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub date_from: Option<NaiveDate>,
    /// Inclusive, `YYYY-MM-DD`.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub date_to: Option<NaiveDate>,
}

impl AuditLogQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.per_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_defaults_and_clamps() {
        assert_eq!(Pagination::default().normalize(), (1, 20, 0));
        assert_eq!(Pagination::new(Some(0), Some(0)).normalize(), (1, 1, 0));
        assert_eq!(Pagination::new(Some(3), Some(500)).normalize(), (3, 100, 200));
        assert_eq!(Pagination::new(Some(-4), None).normalize(), (1, 20, 0));
    }

    #[test]
    fn huge_page_saturates_offset() {
        let (page, per_page, offset) = Pagination::new(Some(i64::MAX), Some(100)).normalize();
        assert_eq!((page, per_page), (i64::MAX, 100));
        assert_eq!(offset, i64::MAX);
    }

    fn query<T: serde::de::DeserializeOwned>(uri: &str) -> T {
        let uri: axum::http::Uri = uri.parse().unwrap();
        axum::extract::Query::<T>::try_from_uri(&uri).unwrap().0
    }

    #[test]
    fn blank_filters_mean_no_filter() {
        let q: UserListQuery = query("/api/users?search=&role=&page=");
        assert_eq!(q.search.as_deref(), Some(""));
        assert!(q.role.is_none());
        assert!(q.page.is_none());

        let q: AuditLogQuery = query("/api/audit-logs?user_id=&action=&date_from=&date_to=");
        assert!(q.user_id.is_none());
        assert!(q.date_from.is_none());
        assert!(q.date_to.is_none());
    }

    #[test]
    fn filled_filters_still_parse() {
        let q: UserListQuery = query("/api/users?role=admin&per_page=5");
        assert_eq!(q.role, Some(Role::Admin));
        assert_eq!(q.per_page, Some(5));

        let q: AuditLogQuery = query("/api/audit-logs?date_from=2024-03-01");
        assert_eq!(q.date_from, NaiveDate::from_ymd_opt(2024, 3, 1));

        let uri: axum::http::Uri = "/api/users?role=wizard".parse().unwrap();
        assert!(axum::extract::Query::<UserListQuery>::try_from_uri(&uri).is_err());
    }

    #[test]
    fn audit_pages_default_to_fifty() {
        assert_eq!(
            Pagination::new(Some(2), None).normalize_with(AUDIT_PER_PAGE),
            (2, 50, 50)
        );
    }
}
