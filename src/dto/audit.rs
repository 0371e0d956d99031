use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{AuditLogEntry, Choice};

#[derive(Debug, Serialize, ToSchema)]
pub struct AuditLogList {
    pub items: Vec<AuditLogEntry>,
    pub action_choices: Vec<Choice>,
}
