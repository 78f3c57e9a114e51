//! # Batch Transaction Executor
//!
//! One bounded unit of work: lock a batch of unprocessed events inside a
//! database transaction, publish each to the exchange, await the broker's
//! confirmation for all of them, then mark the whole set processed and
//! commit. Any failure rolls the transaction back in full; an event is
//! never marked processed unless its publish was confirmed in the same
//! committed batch.

use lapin::options::BasicPublishOptions;
use lapin::publisher_confirm::Confirmation;
use lapin::BasicProperties;
use sqlx::PgPool;
use tracing::debug;

use crate::broker::BrokerManager;
use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::models::OutboxEvent;

/// Result of one executed batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// No unprocessed events were available; the caller should idle-sleep.
    Idle,
    /// This many events were published, confirmed, and marked processed.
    Delivered(usize),
}

/// Run one batch cycle against the outbox table.
///
/// Publishes happen in ascending `created_at` order with routing key equal
/// to the event type. The channel cache is re-read immediately before each
/// publish: an asynchronous invalidation mid-batch aborts the remainder.
/// Confirmations are awaited only after the last publish is queued, so the
/// batch is all-or-nothing against batch-scoped confirmation.
///
/// Errors map to the loop's taxonomy: publish or confirmation failures
/// become [`RelayError::ConnectionLost`], database failures stay
/// [`RelayError::Database`]. On any error the transaction rolls back on
/// drop and no `processed` flag changes survive.
pub async fn run_batch(
    pool: &PgPool,
    broker: &BrokerManager,
    config: &RelayConfig,
) -> Result<BatchOutcome, RelayError> {
    let mut tx = pool.begin().await?;

    let events =
        OutboxEvent::lock_unprocessed(&mut *tx, &config.outbox_table, config.batch_size).await?;

    if events.is_empty() {
        tx.commit().await?;
        return Ok(BatchOutcome::Idle);
    }

    let mut confirms = Vec::with_capacity(events.len());
    let mut published_ids = Vec::with_capacity(events.len());

    for event in &events {
        // Check validity per publish, not once per batch: the error
        // callback may clear the cache at any await point.
        let channel = broker
            .channel()
            .ok_or_else(|| RelayError::connection_lost("channel invalidated mid-batch"))?;

        let bytes = event.payload_bytes()?;

        let confirm = channel
            .basic_publish(
                &config.exchange,
                &event.event_type,
                BasicPublishOptions::default(),
                &bytes,
                BasicProperties::default()
                    .with_delivery_mode(2) // Persistent
                    .with_content_type("application/json".into()),
            )
            .await
            .map_err(|e| {
                RelayError::connection_lost(format!("publish failed for event {}: {e}", event.id))
            })?;

        debug!(
            event_id = %event.id,
            event_type = %event.event_type,
            "queued event for publish"
        );

        confirms.push((event.id, confirm));
        published_ids.push(event.id);
    }

    for (event_id, confirm) in confirms {
        let confirmation = confirm.await.map_err(|e| {
            RelayError::connection_lost(format!("confirmation failed for event {event_id}: {e}"))
        })?;
        if !confirmation_accepted(&confirmation) {
            return Err(RelayError::connection_lost(format!(
                "broker rejected event {event_id}"
            )));
        }
    }

    OutboxEvent::mark_processed(&mut *tx, &config.outbox_table, &published_ids).await?;
    tx.commit().await?;

    Ok(BatchOutcome::Delivered(published_ids.len()))
}

/// Whether the broker durably accepted a publish. Anything other than an
/// explicit ack (a nack, or a confirmation that was never requested)
/// aborts the batch.
fn confirmation_accepted(confirmation: &Confirmation) -> bool {
    matches!(confirmation, Confirmation::Ack(_))
}
