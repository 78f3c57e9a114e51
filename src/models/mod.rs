//! # Data Layer
//!
//! Row models and their query surface. The relay consumes the outbox table
//! but does not own its schema; queries are runtime-checked so the crate
//! builds without a live database.

pub mod outbox_event;

pub use outbox_event::OutboxEvent;
