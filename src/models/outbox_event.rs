//! # OutboxEvent Model
//!
//! Maps one row of the outbox table. The relay reads five columns and flips
//! exactly one flag: `processed` goes false to true only inside a
//! transaction whose batch of publishes was fully confirmed by the broker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnection;
use sqlx::FromRow;
use uuid::Uuid;

/// One event row awaiting (or past) delivery.
///
/// `event_type` maps the `type` column and doubles as the broker routing
/// key. `payload` is opaque to the relay; it is forwarded byte-for-byte.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct OutboxEvent {
    pub id: Uuid,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub event_type: String,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub processed: bool,
}

impl OutboxEvent {
    /// Lock and fetch up to `limit` unprocessed events in delivery order.
    ///
    /// `FOR UPDATE SKIP LOCKED` keeps concurrent relay instances disjoint:
    /// rows locked by another in-flight transaction are excluded instead of
    /// blocking the reader. Must run inside the batch transaction so the
    /// locks live until commit or rollback.
    pub async fn lock_unprocessed(
        conn: &mut PgConnection,
        table: &str,
        limit: i64,
    ) -> Result<Vec<OutboxEvent>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT id, type, payload, created_at, processed
            FROM {table}
            WHERE processed = false
            ORDER BY created_at ASC
            LIMIT $1
            FOR UPDATE SKIP LOCKED
            "#
        );

        sqlx::query_as::<_, OutboxEvent>(&sql)
            .bind(limit)
            .fetch_all(conn)
            .await
    }

    /// Mark a set of events processed in one statement.
    ///
    /// Only called after every publish in the batch was confirmed; runs in
    /// the same transaction as the locking select.
    pub async fn mark_processed(
        conn: &mut PgConnection,
        table: &str,
        ids: &[Uuid],
    ) -> Result<u64, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE {table}
            SET processed = true
            WHERE id = ANY($1)
            "#
        );

        let result = sqlx::query(&sql).bind(ids).execute(conn).await?;
        Ok(result.rows_affected())
    }

    /// Serialize the payload for publishing.
    ///
    /// A JSON string payload passes through as its raw text bytes; any
    /// other JSON value is rendered to canonical JSON text. Matches the
    /// "pass through if already text, else canonicalize" contract.
    pub fn payload_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        match &self.payload {
            serde_json::Value::String(text) => Ok(text.clone().into_bytes()),
            other => serde_json::to_vec(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_with_payload(payload: serde_json::Value) -> OutboxEvent {
        OutboxEvent {
            id: Uuid::new_v4(),
            event_type: "user.created".to_string(),
            payload,
            created_at: Utc::now(),
            processed: false,
        }
    }

    #[test]
    fn test_string_payload_passes_through() {
        let event = event_with_payload(serde_json::Value::String(
            r#"{"already":"serialized"}"#.to_string(),
        ));
        let bytes = event.payload_bytes().unwrap();
        assert_eq!(bytes, br#"{"already":"serialized"}"#);
    }

    #[test]
    fn test_object_payload_canonicalized() {
        let event = event_with_payload(serde_json::json!({"user_id": 42, "email": "a@b.c"}));
        let bytes = event.payload_bytes().unwrap();
        let roundtrip: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(roundtrip["user_id"], 42);
        assert_eq!(roundtrip["email"], "a@b.c");
    }

    #[test]
    fn test_scalar_payload_canonicalized() {
        let event = event_with_payload(serde_json::json!(7));
        assert_eq!(event.payload_bytes().unwrap(), b"7");
    }

    #[test]
    fn test_serde_rename_for_type_column() {
        let event = event_with_payload(serde_json::json!({}));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "user.created");
        assert!(json.get("event_type").is_none());
    }
}
