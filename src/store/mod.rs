//! # Contact Store Interfaces
//!
//! Repository traits for the customer/campaign/enrollment/chat-message
//! collections. The pipeline components receive these as injected trait
//! objects; nothing in the crate holds global connection state. Each trait
//! maps to single-key operations so a key-value or document store can back
//! it directly, and the two write paths that matter under concurrency are
//! modeled explicitly:
//!
//! - enrollment status changes go through [`EnrollmentStore::transition`],
//!   a conditional write validated by [`crate::state_machine`];
//! - campaign counters go through [`CampaignStore::apply_metrics`], one
//!   additive write per response event, never read-modify-write.
//!
//! [`memory`] provides DashMap-backed implementations used by tests and
//! local development.

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    Campaign, CampaignMetricsDelta, CampaignStatus, ChatMessage, Customer, CustomerUpdate,
    Enrollment, NewChatMessage,
};
use crate::state_machine::{EnrollmentEvent, EnrollmentStatus, StateMachineError};

pub use memory::{
    InMemoryCampaignStore, InMemoryChatMessageStore, InMemoryCustomerStore, InMemoryEnrollmentStore,
};

/// Errors surfaced by store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    #[error(transparent)]
    InvalidTransition(#[from] StateMachineError),

    #[error("Store backend error during {operation}: {message}")]
    Backend { operation: String, message: String },
}

impl StoreError {
    pub fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            key: key.into(),
        }
    }

    pub fn backend(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Customer records, keyed by E.164 phone number.
#[async_trait]
pub trait CustomerStore: Send + Sync {
    async fn find_by_phone(&self, phone_number: &str) -> StoreResult<Option<Customer>>;

    /// Insert or replace a customer record.
    async fn put(&self, customer: Customer) -> StoreResult<()>;

    /// Apply a partial update; fails with `NotFound` for unknown numbers.
    async fn update(&self, phone_number: &str, update: CustomerUpdate) -> StoreResult<Customer>;
}

/// Campaign records, keyed by campaign id.
#[async_trait]
pub trait CampaignStore: Send + Sync {
    async fn find_by_id(&self, campaign_id: &str) -> StoreResult<Option<Campaign>>;

    async fn insert(&self, campaign: Campaign) -> StoreResult<()>;

    async fn update_status(&self, campaign_id: &str, status: CampaignStatus) -> StoreResult<()>;

    /// Finalize a dispatch run: add the queued count to `sent_count`,
    /// mark the campaign sent, and stamp `sent_at`. Additive so a partial
    /// re-dispatch can never roll the count backward.
    async fn record_dispatch_completion(&self, campaign_id: &str, queued: u64) -> StoreResult<()>;

    /// Apply one coalesced additive counter update. Implementations must
    /// make this a single atomic increment-by write, not read-modify-write.
    async fn apply_metrics(
        &self,
        campaign_id: &str,
        delta: &CampaignMetricsDelta,
    ) -> StoreResult<()>;
}

/// Enrollment records, keyed by (campaign id, phone number).
#[async_trait]
pub trait EnrollmentStore: Send + Sync {
    async fn find(&self, campaign_id: &str, phone_number: &str)
        -> StoreResult<Option<Enrollment>>;

    /// All enrollments for a campaign, uncapped.
    async fn find_by_campaign(&self, campaign_id: &str) -> StoreResult<Vec<Enrollment>>;

    async fn insert(&self, enrollment: Enrollment) -> StoreResult<()>;

    /// Drive the enrollment state machine with a conditional write. The
    /// event is validated against the current stored status under the
    /// store's single-key atomicity, so concurrent writers cannot move a
    /// contact backward. Returns the resulting status.
    async fn transition(
        &self,
        campaign_id: &str,
        phone_number: &str,
        event: EnrollmentEvent,
    ) -> StoreResult<EnrollmentStatus>;
}

/// Append-only chat history.
#[async_trait]
pub trait ChatMessageStore: Send + Sync {
    /// Append one entry; the store assigns id and created timestamp.
    async fn append(&self, message: NewChatMessage) -> StoreResult<ChatMessage>;

    /// Chat history for a contact, oldest first.
    async fn find_by_phone(&self, phone_number: &str) -> StoreResult<Vec<ChatMessage>>;
}
