//! # SMS Gateway Contract
//!
//! The external provider that performs the actual outbound send. Provider
//! SDKs report transport failures in the response rather than as errors,
//! so the trait does the same: [`SmsSendResult`] carries success, the
//! provider's message id, and the failure text, and the caller decides how
//! to surface a failed send.

use async_trait::async_trait;

/// Gateway delivery status strings, as recorded on chat history entries.
pub mod statuses {
    pub const SENT: &str = "sent";
    pub const FAILED: &str = "failed";
}

/// Outcome of one gateway send attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsSendResult {
    pub success: bool,
    /// Provider-assigned message id, present on success
    pub message_id: Option<String>,
    /// Delivery status string (`sent` / `failed`)
    pub status: String,
    /// Failure text, present on failure
    pub error: Option<String>,
}

impl SmsSendResult {
    pub fn success(message_id: impl Into<String>) -> Self {
        Self {
            success: true,
            message_id: Some(message_id.into()),
            status: statuses::SENT.to_string(),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message_id: None,
            status: statuses::FAILED.to_string(),
            error: Some(error.into()),
        }
    }
}

/// External SMS delivery provider.
#[async_trait]
pub trait SmsGateway: Send + Sync {
    /// Attempt an outbound send to an E.164 number.
    async fn send_sms(&self, phone_number: &str, message: &str) -> SmsSendResult;
}
