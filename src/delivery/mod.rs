//! # Delivery Worker
//!
//! The queue-consumer side of the pipeline: performs the actual outbound
//! send via the [`gateway::SmsGateway`], records every attempt in chat
//! history, and advances per-contact enrollment status. See
//! [`worker::DeliveryWorker`].

pub mod gateway;
pub mod worker;

pub use gateway::{SmsGateway, SmsSendResult};
pub use worker::{DeliveryError, DeliveryOutcome, DeliveryWorker};
