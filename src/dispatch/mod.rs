//! # Dispatch Orchestration
//!
//! Expands a campaign into per-contact send jobs and enqueues them in
//! rate-limited batches. See [`orchestrator::DispatchOrchestrator`].

pub mod orchestrator;

pub use orchestrator::{CampaignMode, DispatchError, DispatchOrchestrator, DispatchResult};
