use std::fmt;

use crate::aggregator::AggregationError;
use crate::config::ConfigurationError;
use crate::delivery::DeliveryError;
use crate::dispatch::DispatchError;
use crate::messaging::MessagingError;
use crate::store::StoreError;
use crate::utils::phone::PhoneNumberError;

/// Top-level error for callers that drive the whole pipeline.
///
/// Component modules define their own structured errors; this enum is the
/// single surface an embedding API layer has to match on.
#[derive(Debug)]
pub enum OutreachError {
    StoreError(StoreError),
    MessagingError(MessagingError),
    DispatchError(DispatchError),
    DeliveryError(DeliveryError),
    AggregationError(AggregationError),
    ConfigurationError(String),
    ValidationError(String),
}

impl fmt::Display for OutreachError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutreachError::StoreError(err) => write!(f, "Store error: {err}"),
            OutreachError::MessagingError(err) => write!(f, "Messaging error: {err}"),
            OutreachError::DispatchError(err) => write!(f, "Dispatch error: {err}"),
            OutreachError::DeliveryError(err) => write!(f, "Delivery error: {err}"),
            OutreachError::AggregationError(err) => write!(f, "Aggregation error: {err}"),
            OutreachError::ConfigurationError(msg) => write!(f, "Configuration error: {msg}"),
            OutreachError::ValidationError(msg) => write!(f, "Validation error: {msg}"),
        }
    }
}

impl std::error::Error for OutreachError {}

impl From<StoreError> for OutreachError {
    fn from(err: StoreError) -> Self {
        OutreachError::StoreError(err)
    }
}

impl From<MessagingError> for OutreachError {
    fn from(err: MessagingError) -> Self {
        OutreachError::MessagingError(err)
    }
}

impl From<DispatchError> for OutreachError {
    fn from(err: DispatchError) -> Self {
        OutreachError::DispatchError(err)
    }
}

impl From<DeliveryError> for OutreachError {
    fn from(err: DeliveryError) -> Self {
        OutreachError::DeliveryError(err)
    }
}

impl From<AggregationError> for OutreachError {
    fn from(err: AggregationError) -> Self {
        OutreachError::AggregationError(err)
    }
}

impl From<ConfigurationError> for OutreachError {
    fn from(err: ConfigurationError) -> Self {
        OutreachError::ConfigurationError(err.to_string())
    }
}

impl From<PhoneNumberError> for OutreachError {
    fn from(err: PhoneNumberError) -> Self {
        OutreachError::ValidationError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, OutreachError>;
