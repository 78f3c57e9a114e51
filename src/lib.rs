//! # Outbox Relay
//!
//! A transactional-outbox relay: drains rows from a durable `outbox_events`
//! table in PostgreSQL and republishes them, in order, onto a durable topic
//! exchange on RabbitMQ. A row is marked `processed` only inside a
//! transaction that also committed a broker-confirmed publish of that row's
//! payload, which gives atomic "write to my database and emit an event"
//! semantics without a distributed transaction.
//!
//! ## Architecture
//!
//! - [`broker`] - RabbitMQ connection lifecycle: confirm channel, retry
//!   with exponential backoff, asynchronous invalidation
//! - [`relay`] - the orchestrator loop and the per-batch transaction
//!   executor (`SELECT ... FOR UPDATE SKIP LOCKED`, publish, confirm,
//!   `UPDATE ... processed = true`, commit)
//! - [`shutdown`] - signal handling and ordered teardown
//! - [`models`] - the outbox row model and its query surface
//! - [`config`] - environment-driven configuration
//! - [`error`] - the relay's failure taxonomy
//!
//! ## Delivery guarantees
//!
//! Batches are all-or-nothing: a negative confirmation or a lost channel
//! rolls the whole transaction back and nothing is marked processed.
//! Multiple relay instances may run concurrently; skip-locked selection
//! keeps their in-flight batches disjoint. Delivery is at-least-once: a
//! crash between broker confirmation and commit redelivers the batch, so
//! consumers are expected to deduplicate by event id.

pub mod broker;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod relay;
pub mod shutdown;

pub use broker::{BrokerManager, ConnectionState};
pub use config::RelayConfig;
pub use error::{RelayError, RelayResult};
pub use models::OutboxEvent;
pub use relay::{run_batch, BatchOutcome, RelayLoop};
