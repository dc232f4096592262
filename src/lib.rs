#![allow(clippy::doc_markdown)] // Allow technical terms like DashMap, camelCase in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Outreach Core
//!
//! Rust core for SMS campaign dispatch and response aggregation.
//!
//! ## Overview
//!
//! The crate implements the campaign pipeline behind an SMS outreach
//! platform: it expands a campaign into per-customer send jobs, enqueues
//! them in rate-limited batches with partial-failure isolation, drives a
//! forward-only per-contact status machine, and folds inbound
//! delivery/sentiment events back into aggregate campaign counters. The
//! surrounding API layer, upload handling, auth, and UI live elsewhere
//! and call into this crate through the component entry points.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   batches    ┌─────────┐   deliveries   ┌──────────────┐
//! │ Dispatch     │─────────────▶│ Message │───────────────▶│ Delivery     │
//! │ Orchestrator │              │ Queue   │                │ Worker       │
//! └──────┬───────┘              └─────────┘                └──────┬───────┘
//!        │ reads                                    writes │      │ sends
//!        ▼                                                 ▼      ▼
//! ┌──────────────────────────────────────────────┐   ┌─────────────┐
//! │ Contact Store (customers/campaigns/          │   │ SMS Gateway │
//! │ enrollments/chat history)                    │   └─────────────┘
//! └──────────────────▲───────────────────────────┘
//!                    │ counter deltas
//!             ┌──────┴──────────┐
//!             │ Response/Metrics│◀── agent response events
//!             │ Aggregator      │
//!             └─────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`models`] - customers, campaigns, enrollments, chat history
//! - [`state_machine`] - the per-contact enrollment status machine
//! - [`store`] - repository traits and in-memory reference backends
//! - [`messaging`] - queue message union and queue contract
//! - [`dispatch`] - campaign-to-queue expansion
//! - [`delivery`] - queue consumer and SMS gateway contract
//! - [`aggregator`] - response/handoff metrics aggregation
//! - [`personalization`] - template placeholder handling
//! - [`config`] - pipeline settings
//! - [`error`] - top-level error surface

pub mod aggregator;
pub mod config;
pub mod constants;
pub mod delivery;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod messaging;
pub mod models;
pub mod personalization;
pub mod state_machine;
pub mod store;
pub mod test_utils;
pub mod utils;

pub use aggregator::{AggregationError, AggregationOutcome, ResponseAggregator};
pub use config::{ConfigurationError, DeliverySettings, DispatchSettings, PipelineConfig};
pub use delivery::{DeliveryError, DeliveryOutcome, DeliveryWorker, SmsGateway, SmsSendResult};
pub use dispatch::{CampaignMode, DispatchError, DispatchOrchestrator, DispatchResult};
pub use error::{OutreachError, Result};
pub use messaging::{
    BatchConsumeReport, InMemoryQueue, MessageQueue, MessagingError, QueueDelivery, QueueMessage,
};
pub use models::{
    Campaign, CampaignMetrics, CampaignMetricsDelta, CampaignStatus, ChatMessage, Customer,
    CustomerStatus, Enrollment, Sentiment,
};
pub use state_machine::{EnrollmentEvent, EnrollmentStatus};
pub use store::{
    CampaignStore, ChatMessageStore, CustomerStore, EnrollmentStore, InMemoryCampaignStore,
    InMemoryChatMessageStore, InMemoryCustomerStore, InMemoryEnrollmentStore, StoreError,
};
