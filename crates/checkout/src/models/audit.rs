//! Audit trail domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use driftwood_core::AuditAction;

use super::RequestContext;

/// An immutable record of a sensitive mutation.
///
/// Append-only: no update or delete API exists for this entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Globally unique entry ID.
    pub id: Uuid,
    /// Table the mutation touched.
    pub table_name: String,
    /// Identifier of the affected record.
    pub record_id: String,
    /// Kind of mutation.
    pub action: AuditAction,
    /// Structured snapshot before the mutation, if any.
    pub before: Option<serde_json::Value>,
    /// Structured snapshot after the mutation, if any.
    pub after: Option<serde_json::Value>,
    /// Who performed the mutation ("system" for pipeline-initiated work).
    pub actor: String,
    /// Caller IP, if known.
    pub caller_ip: Option<String>,
    /// Caller user agent, if known.
    pub user_agent: Option<String>,
    /// When the entry was recorded.
    pub created_at: DateTime<Utc>,
}

/// Input for appending an audit entry.
#[derive(Debug, Clone)]
pub struct RecordAuditInput {
    /// Table the mutation touched.
    pub table_name: String,
    /// Identifier of the affected record.
    pub record_id: String,
    /// Kind of mutation.
    pub action: AuditAction,
    /// Structured snapshot before the mutation, if any.
    pub before: Option<serde_json::Value>,
    /// Structured snapshot after the mutation, if any.
    pub after: Option<serde_json::Value>,
    /// Who performed the mutation.
    pub actor: String,
    /// Request context captured at the boundary.
    pub context: RequestContext,
}
