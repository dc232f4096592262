use thiserror::Error;

use crate::constants::MAX_QUEUE_BATCH_SIZE;

/// Structured error types for queue message handling.
#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("Unknown message type: {kind}")]
    UnknownMessageType { kind: String },

    #[error("Message has no messageType discriminator")]
    MissingMessageType,

    #[error("Message deserialization error: {message}")]
    Deserialization { message: String },

    #[error("Message serialization error: {message}")]
    Serialization { message: String },

    #[error("Queue operation failed: {queue_name}: {operation}: {message}")]
    QueueOperation {
        queue_name: String,
        operation: String,
        message: String,
    },

    #[error("Batch of {size} messages exceeds queue limit of {limit}")]
    BatchTooLarge { size: usize, limit: usize },
}

impl MessagingError {
    pub fn unknown_message_type(kind: impl Into<String>) -> Self {
        Self::UnknownMessageType { kind: kind.into() }
    }

    pub fn deserialization(message: impl Into<String>) -> Self {
        Self::Deserialization {
            message: message.into(),
        }
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    pub fn queue_operation(
        queue_name: impl Into<String>,
        operation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::QueueOperation {
            queue_name: queue_name.into(),
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn batch_too_large(size: usize) -> Self {
        Self::BatchTooLarge {
            size,
            limit: MAX_QUEUE_BATCH_SIZE,
        }
    }
}

pub type MessagingResult<T> = std::result::Result<T, MessagingError>;
