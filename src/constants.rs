//! # System Constants
//!
//! Core constants that define the operational boundaries of the campaign
//! dispatch pipeline. Batch and chunk sizes mirror the limits of the
//! external queue and contact store; everything here can be overridden
//! through [`crate::config::PipelineConfig`].

/// Maximum number of messages accepted by a single batched queue enqueue.
///
/// This is the queue provider's hard limit, so the dispatcher also uses it
/// as the send-batch size.
pub const MAX_QUEUE_BATCH_SIZE: usize = 10;

/// Default number of contacts dispatched per send batch.
pub const DEFAULT_SEND_BATCH_SIZE: usize = MAX_QUEUE_BATCH_SIZE;

/// Default number of customer records resolved per lookup chunk.
///
/// Bounds the fan-out of concurrent reads against the contact store when a
/// campaign has many thousands of enrollments.
pub const DEFAULT_LOOKUP_CHUNK_SIZE: usize = 1000;

/// Default delay between send batches, in milliseconds. Acts as a crude
/// outbound rate limiter.
pub const DEFAULT_INTER_BATCH_DELAY_MS: u64 = 50;

/// Delivery attempts before the queue moves a message to the dead-letter
/// queue. The redrive itself is queue policy; the constant is carried so
/// consumers and tests agree on the contract.
pub const DEFAULT_MAX_DELIVERY_ATTEMPTS: u32 = 3;

/// Default region used when normalizing bare national phone numbers.
pub const DEFAULT_PHONE_REGION: &str = "US";

/// Queue message type discriminators as they appear on the wire.
pub mod message_types {
    pub const CAMPAIGN: &str = "campaign";
    pub const MANUAL: &str = "manual";
    pub const AGENT_RESPONSE: &str = "agent_response";
}

/// Fallback substituted for an empty name field during personalization.
pub const PERSONALIZATION_FALLBACK_NAME: &str = "Customer";
