//! Database operations for the append-only audit log.
//!
//! Every call produces exactly one immutable entry. There is deliberately
//! no update or delete function in this module.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use super::RepositoryError;
use crate::models::{AuditEntry, RecordAuditInput};

/// Internal row type for audit entry queries.
#[derive(Debug, sqlx::FromRow)]
struct AuditEntryRow {
    id: Uuid,
    table_name: String,
    record_id: String,
    action: String,
    before: Option<serde_json::Value>,
    after: Option<serde_json::Value>,
    actor: String,
    caller_ip: Option<String>,
    user_agent: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<AuditEntryRow> for AuditEntry {
    type Error = RepositoryError;

    fn try_from(row: AuditEntryRow) -> Result<Self, Self::Error> {
        let action = row
            .action
            .parse()
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid action: {e}")))?;

        Ok(Self {
            id: row.id,
            table_name: row.table_name,
            record_id: row.record_id,
            action,
            before: row.before,
            after: row.after,
            actor: row.actor,
            caller_ip: row.caller_ip,
            user_agent: row.user_agent,
            created_at: row.created_at,
        })
    }
}

/// Append one audit entry with a fresh unique identifier.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn record(
    conn: &mut PgConnection,
    input: &RecordAuditInput,
) -> Result<AuditEntry, RepositoryError> {
    let row = sqlx::query_as::<_, AuditEntryRow>(
        "INSERT INTO audit_entries ( \
             id, table_name, record_id, action, before, after, \
             actor, caller_ip, user_agent \
         ) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING id, table_name, record_id, action, before, after, \
                   actor, caller_ip, user_agent, created_at",
    )
    .bind(Uuid::new_v4())
    .bind(&input.table_name)
    .bind(&input.record_id)
    .bind(input.action.to_string())
    .bind(&input.before)
    .bind(&input.after)
    .bind(&input.actor)
    .bind(&input.context.caller_ip)
    .bind(&input.context.user_agent)
    .fetch_one(conn)
    .await?;

    row.try_into()
}
