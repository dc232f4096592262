use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::sentiment::Sentiment;
use crate::delivery::gateway::SmsSendResult;

/// Direction of a chat history entry relative to the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageDirection {
    Outbound,
    Inbound,
}

impl fmt::Display for MessageDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Outbound => write!(f, "outbound"),
            Self::Inbound => write!(f, "inbound"),
        }
    }
}

/// Origin of an outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    /// Campaign automation
    Automated,
    /// A human operator
    Manual,
    /// The upstream AI agent
    AiAgent,
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Automated => write!(f, "automated"),
            Self::Manual => write!(f, "manual"),
            Self::AiAgent => write!(f, "ai_agent"),
        }
    }
}

/// One immutable entry in a contact's chat history. Appended once per
/// send/receive event, never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub phone_number: String,
    pub campaign_id: Option<String>,
    pub message: String,
    pub direction: MessageDirection,
    pub response_type: ResponseType,
    pub should_handoff: Option<bool>,
    pub handoff_reason: Option<String>,
    pub user_sentiment: Option<Sentiment>,
    /// Gateway delivery status string (`sent` / `failed`)
    pub status: Option<String>,
    pub external_message_id: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Stamped only when the gateway accepted the message
    pub sent_at: Option<DateTime<Utc>>,
}

/// Fields for appending a chat history entry; the store assigns the id and
/// created timestamp.
#[derive(Debug, Clone)]
pub struct NewChatMessage {
    pub phone_number: String,
    pub campaign_id: Option<String>,
    pub message: String,
    pub direction: MessageDirection,
    pub response_type: ResponseType,
    pub should_handoff: Option<bool>,
    pub handoff_reason: Option<String>,
    pub user_sentiment: Option<Sentiment>,
    pub status: Option<String>,
    pub external_message_id: Option<String>,
    pub error_message: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
}

impl NewChatMessage {
    /// Start an outbound entry for a send attempt.
    pub fn outbound(
        phone_number: impl Into<String>,
        message: impl Into<String>,
        response_type: ResponseType,
    ) -> Self {
        Self {
            phone_number: phone_number.into(),
            campaign_id: None,
            message: message.into(),
            direction: MessageDirection::Outbound,
            response_type,
            should_handoff: None,
            handoff_reason: None,
            user_sentiment: None,
            status: None,
            external_message_id: None,
            error_message: None,
            sent_at: None,
        }
    }

    /// Attach the owning campaign.
    pub fn with_campaign(mut self, campaign_id: impl Into<String>) -> Self {
        self.campaign_id = Some(campaign_id.into());
        self
    }

    /// Attach handoff/sentiment metadata from an agent response.
    pub fn with_agent_metadata(
        mut self,
        should_handoff: bool,
        handoff_reason: Option<String>,
        user_sentiment: Option<Sentiment>,
    ) -> Self {
        self.should_handoff = Some(should_handoff);
        self.handoff_reason = handoff_reason;
        self.user_sentiment = user_sentiment;
        self
    }

    /// Record the gateway's verdict on the attempt. The entry is appended
    /// whether or not the send succeeded; `sent_at` is only stamped on
    /// success.
    pub fn with_gateway_result(mut self, result: &SmsSendResult) -> Self {
        self.status = Some(result.status.clone());
        self.external_message_id = result.message_id.clone();
        self.error_message = result.error.clone();
        self.sent_at = result.success.then(Utc::now);
        self
    }

    /// Finalize into a stored record with a generated id.
    pub fn into_message(self) -> ChatMessage {
        ChatMessage {
            id: Uuid::new_v4().to_string(),
            phone_number: self.phone_number,
            campaign_id: self.campaign_id,
            message: self.message,
            direction: self.direction,
            response_type: self.response_type,
            should_handoff: self.should_handoff,
            handoff_reason: self.handoff_reason,
            user_sentiment: self.user_sentiment,
            status: self.status,
            external_message_id: self.external_message_id,
            error_message: self.error_message,
            created_at: Utc::now(),
            sent_at: self.sent_at,
        }
    }
}
