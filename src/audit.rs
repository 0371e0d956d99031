use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppResult,
    middleware::client::ClientInfo,
    models::AuditAction,
};

/// One row to append to `audit_logs`. Rows are never updated afterwards.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub user_id: Option<Uuid>,
    pub action: AuditAction,
    pub model_name: &'static str,
    pub object_id: String,
    pub object_repr: String,
    pub changes: Option<Value>,
    pub client: ClientInfo,
}

impl AuditEntry {
    pub fn new(
        user_id: Option<Uuid>,
        action: AuditAction,
        model_name: &'static str,
        client: &ClientInfo,
    ) -> Self {
        Self {
            user_id,
            action,
            model_name,
            object_id: String::new(),
            object_repr: String::new(),
            changes: None,
            client: client.clone(),
        }
    }

    pub fn object(mut self, id: impl ToString, repr: impl Into<String>) -> Self {
        self.object_id = id.to_string();
        let repr: String = repr.into();
        // object_repr is VARCHAR(200)
        self.object_repr = repr.chars().take(200).collect();
        self
    }

    pub fn changes(mut self, changes: Value) -> Self {
        self.changes = Some(changes);
        self
    }
}

pub async fn log_audit(pool: &DbPool, entry: AuditEntry) -> AppResult<()> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO audit_logs
            (id, user_id, action, model_name, object_id, object_repr, changes, ip_address, user_agent)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(id)
    .bind(entry.user_id)
    .bind(entry.action.as_str())
    .bind(entry.model_name)
    .bind(entry.object_id)
    .bind(entry.object_repr)
    .bind(entry.changes)
    .bind(entry.client.ip_address)
    .bind(entry.client.user_agent)
    .execute(pool)
    .await?;

    Ok(())
}

/// Audit failures are logged and never fail the request that triggered them.
pub async fn record(pool: &DbPool, entry: AuditEntry) {
    let action = entry.action.as_str();
    let model_name = entry.model_name;
    if let Err(err) = log_audit(pool, entry).await {
        tracing::warn!(error = %err, action, model_name, "audit log failed");
    }
}

/// Collects `{"field": {"old": .., "new": ..}}` pairs for fields that changed.
#[derive(Debug, Default)]
pub struct ChangeSet {
    fields: Map<String, Value>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track<T>(&mut self, field: &str, old: &T, new: &T)
    where
        T: PartialEq + serde::Serialize,
    {
        if old != new {
            self.fields.insert(
                field.to_string(),
                serde_json::json!({ "old": old, "new": new }),
            );
        }
    }

    /// Records that a field changed without exposing its value.
    pub fn redacted(&mut self, field: &str) {
        self.fields
            .insert(field.to_string(), serde_json::json!({ "changed": true }));
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_set_only_keeps_differences() {
        let mut changes = ChangeSet::new();
        changes.track("first_name", &"Ada".to_string(), &"Ada".to_string());
        changes.track("role", &"volunteer".to_string(), &"admin".to_string());
        changes.redacted("password");

        let value = changes.into_value();
        assert!(value.get("first_name").is_none());
        assert_eq!(value["role"]["old"], "volunteer");
        assert_eq!(value["role"]["new"], "admin");
        assert_eq!(value["password"]["changed"], true);
    }

    #[test]
    fn object_repr_is_truncated() {
        let entry = AuditEntry::new(None, AuditAction::View, "User", &ClientInfo::internal())
            .object(Uuid::nil(), "x".repeat(300));
        assert_eq!(entry.object_repr.len(), 200);
        assert_eq!(entry.object_id, Uuid::nil().to_string());
    }
}
