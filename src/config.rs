//! # Pipeline Configuration
//!
//! Typed settings for the dispatch pipeline, loaded from an optional
//! `outreach.toml` file with an `OUTREACH_`-prefixed environment overlay
//! (`OUTREACH_DISPATCH__SEND_BATCH_SIZE=5` and friends). Every field has a
//! default, so a bare process starts with the documented limits; loading
//! always validates the result against the queue's hard batch limit.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::constants::{
    DEFAULT_INTER_BATCH_DELAY_MS, DEFAULT_LOOKUP_CHUNK_SIZE, DEFAULT_MAX_DELIVERY_ATTEMPTS,
    DEFAULT_PHONE_REGION, DEFAULT_SEND_BATCH_SIZE, MAX_QUEUE_BATCH_SIZE,
};

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {field}: {reason}")]
    Invalid { field: String, reason: String },
}

impl ConfigurationError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

pub type ConfigResult<T> = std::result::Result<T, ConfigurationError>;

/// Root configuration for the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PipelineConfig {
    /// Queue endpoint and naming
    #[serde(default)]
    pub queue: QueueConfig,

    /// Dispatch orchestrator tuning
    #[serde(default)]
    pub dispatch: DispatchSettings,

    /// Delivery worker tuning
    #[serde(default)]
    pub delivery: DeliverySettings,
}

/// Settings for the outbound message queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Queue name used for campaign/manual/agent-response messages
    pub name: String,
    /// Optional endpoint override for the queue provider
    pub endpoint: Option<String>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            name: "outbound_sms_queue".to_string(),
            endpoint: None,
        }
    }
}

/// Settings consumed by [`crate::dispatch::DispatchOrchestrator`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchSettings {
    /// Contacts per batched queue enqueue (hard max: the queue's batch limit)
    pub send_batch_size: usize,
    /// Customers resolved per concurrent lookup chunk
    pub lookup_chunk_size: usize,
    /// Fixed delay between send batches, in milliseconds
    pub inter_batch_delay_ms: u64,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            send_batch_size: DEFAULT_SEND_BATCH_SIZE,
            lookup_chunk_size: DEFAULT_LOOKUP_CHUNK_SIZE,
            inter_batch_delay_ms: DEFAULT_INTER_BATCH_DELAY_MS,
        }
    }
}

/// Settings consumed by [`crate::delivery::DeliveryWorker`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliverySettings {
    /// Delivery attempts before the queue dead-letters a message
    pub max_delivery_attempts: u32,
    /// Default region for normalizing bare national phone numbers
    pub phone_region: String,
}

impl Default for DeliverySettings {
    fn default() -> Self {
        Self {
            max_delivery_attempts: DEFAULT_MAX_DELIVERY_ATTEMPTS,
            phone_region: DEFAULT_PHONE_REGION.to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from `config/outreach.toml` (if present) merged
    /// with `OUTREACH_`-prefixed environment variables, then validate.
    pub fn load() -> ConfigResult<Self> {
        Self::load_from_file("config/outreach")
    }

    /// Load from an explicit file stem; used by tests to isolate sources.
    pub fn load_from_file(path: &str) -> ConfigResult<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("OUTREACH").separator("__"))
            .build()?;

        let loaded: PipelineConfig = settings.try_deserialize()?;
        loaded.validate()?;

        info!(
            queue = %loaded.queue.name,
            send_batch_size = loaded.dispatch.send_batch_size,
            lookup_chunk_size = loaded.dispatch.lookup_chunk_size,
            "Pipeline configuration loaded"
        );

        Ok(loaded)
    }

    /// Validate field ranges against the external contracts.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.dispatch.send_batch_size == 0 {
            return Err(ConfigurationError::invalid(
                "dispatch.send_batch_size",
                "must be at least 1",
            ));
        }
        if self.dispatch.send_batch_size > MAX_QUEUE_BATCH_SIZE {
            return Err(ConfigurationError::invalid(
                "dispatch.send_batch_size",
                format!("must not exceed the queue batch limit of {MAX_QUEUE_BATCH_SIZE}"),
            ));
        }
        if self.dispatch.lookup_chunk_size == 0 {
            return Err(ConfigurationError::invalid(
                "dispatch.lookup_chunk_size",
                "must be at least 1",
            ));
        }
        if self.delivery.max_delivery_attempts == 0 {
            return Err(ConfigurationError::invalid(
                "delivery.max_delivery_attempts",
                "must be at least 1",
            ));
        }
        if self.queue.name.is_empty() {
            return Err(ConfigurationError::invalid("queue.name", "must not be empty"));
        }
        Ok(())
    }
}
