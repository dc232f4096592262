//! # Messaging Layer
//!
//! The wire contract between the dispatcher and the delivery worker: one
//! tagged message union ([`QueueMessage`]) covering campaign sends, manual
//! sends, and legacy agent-response events, plus the [`MessageQueue`]
//! enqueue trait and the consumer-side delivery/report types.
//!
//! The queue itself is external (at-least-once, batched enqueue of at most
//! ten messages, per-item failure redelivery, dead-letter after the
//! configured attempts); this module only defines the contract and an
//! in-memory double for tests and local development.

pub mod errors;
pub mod message;
pub mod queue;

pub use errors::{MessagingError, MessagingResult};
pub use message::{AgentResponsePayload, QueueMessage};
pub use queue::{
    BatchConsumeReport, ConsumeItemOutcome, InMemoryQueue, MessageQueue, QueueDelivery,
};
