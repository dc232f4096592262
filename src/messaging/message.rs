//! # Queue Message Formats
//!
//! The single tagged union for everything that travels through the
//! outbound SMS queue, discriminated by the `messageType` field. Two
//! generations of producers feed this queue: the dispatcher and API layer
//! emit camelCase `campaign`/`manual` bodies, while the upstream agent
//! still emits the legacy snake_case `agent_response` shape with a nested
//! payload. All three deserialize here; anything else is rejected as
//! [`MessagingError::UnknownMessageType`] before a consumer touches it.

use serde::{Deserialize, Serialize};

use super::errors::{MessagingError, MessagingResult};
use crate::constants::message_types;
use crate::models::Sentiment;

/// A message on the outbound SMS queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "messageType")]
pub enum QueueMessage {
    /// One per-contact send job produced by a campaign dispatch run.
    #[serde(rename = "campaign", rename_all = "camelCase")]
    Campaign {
        phone_number: String,
        message: String,
        campaign_id: String,
        customer_id: String,
    },

    /// A one-off send initiated by a human operator.
    #[serde(rename = "manual", rename_all = "camelCase")]
    Manual {
        phone_number: String,
        message: String,
        /// Chat-history record created upstream at enqueue time, if any
        #[serde(skip_serializing_if = "Option::is_none")]
        message_id: Option<String>,
    },

    /// Legacy agent-response event emitted by the upstream AI agent.
    #[serde(rename = "agent_response")]
    AgentResponse {
        phone_number: String,
        agent_response: AgentResponsePayload,
        #[serde(skip_serializing_if = "Option::is_none")]
        timestamp: Option<String>,
    },
}

/// Nested payload of a legacy `agent_response` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResponsePayload {
    pub response_text: String,
    pub should_handoff: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handoff_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_sentiment: Option<Sentiment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guardrails_intervened: Option<bool>,
    pub campaign_id: String,
}

impl QueueMessage {
    /// Build a campaign send job.
    pub fn campaign(
        phone_number: impl Into<String>,
        message: impl Into<String>,
        campaign_id: impl Into<String>,
        customer_id: impl Into<String>,
    ) -> Self {
        Self::Campaign {
            phone_number: phone_number.into(),
            message: message.into(),
            campaign_id: campaign_id.into(),
            customer_id: customer_id.into(),
        }
    }

    /// Build a manual send job.
    pub fn manual(
        phone_number: impl Into<String>,
        message: impl Into<String>,
        message_id: Option<String>,
    ) -> Self {
        Self::Manual {
            phone_number: phone_number.into(),
            message: message.into(),
            message_id,
        }
    }

    /// Wire discriminator for this message.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Campaign { .. } => message_types::CAMPAIGN,
            Self::Manual { .. } => message_types::MANUAL,
            Self::AgentResponse { .. } => message_types::AGENT_RESPONSE,
        }
    }

    /// Recipient phone number as it arrived on the wire (not yet
    /// normalized).
    pub fn phone_number(&self) -> &str {
        match self {
            Self::Campaign { phone_number, .. }
            | Self::Manual { phone_number, .. }
            | Self::AgentResponse { phone_number, .. } => phone_number,
        }
    }

    /// Parse a raw queue body, rejecting unrecognized kinds with a typed
    /// error rather than falling through.
    pub fn from_body(body: &str) -> MessagingResult<Self> {
        let value: serde_json::Value = serde_json::from_str(body)
            .map_err(|e| MessagingError::deserialization(e.to_string()))?;
        Self::from_json(&value)
    }

    /// Parse an already-decoded JSON body.
    pub fn from_json(value: &serde_json::Value) -> MessagingResult<Self> {
        let kind = value
            .get("messageType")
            .and_then(|v| v.as_str())
            .ok_or(MessagingError::MissingMessageType)?;

        match kind {
            message_types::CAMPAIGN | message_types::MANUAL | message_types::AGENT_RESPONSE => {
                serde_json::from_value(value.clone())
                    .map_err(|e| MessagingError::deserialization(e.to_string()))
            }
            other => Err(MessagingError::unknown_message_type(other)),
        }
    }

    /// Serialize for queue storage.
    pub fn to_body(&self) -> MessagingResult<String> {
        serde_json::to_string(self).map_err(|e| MessagingError::serialization(e.to_string()))
    }
}
