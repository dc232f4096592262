//! # Queue Consumer
//!
//! Processes delivered queue messages: validates the recipient, invokes
//! the SMS gateway, appends the attempt to chat history whether or not the
//! send succeeded, advances enrollment status for campaign sends, and
//! applies response metrics for agent-response events.
//!
//! Each delivery resolves independently and the batch report lists exactly
//! the failed message ids, so the queue redelivers only those - never an
//! all-or-nothing ack. Secondary-update failures after a successful send
//! resolve to [`DeliveryOutcome::Degraded`]: the message is acknowledged
//! (a retry would duplicate the send) and the warning is logged, distinct
//! from both full success and failure.

use std::sync::Arc;

use futures::future::join_all;
use thiserror::Error;
use tracing::{error, info, warn};

use super::gateway::{SmsGateway, SmsSendResult};
use crate::aggregator::{AggregationError, ResponseAggregator};
use crate::messaging::{
    AgentResponsePayload, BatchConsumeReport, MessagingError, QueueDelivery, QueueMessage,
};
use crate::models::{CustomerUpdate, NewChatMessage, ResponseType};
use crate::state_machine::EnrollmentEvent;
use crate::store::{ChatMessageStore, CustomerStore, EnrollmentStore, StoreError};
use crate::utils::phone::{mask_phone_number, normalize_phone_number, PhoneNumberError};

/// Per-message failure that the queue should redeliver.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error(transparent)]
    InvalidPhoneNumber(#[from] PhoneNumberError),

    #[error("Empty message text")]
    EmptyMessage,

    #[error(transparent)]
    Message(#[from] MessagingError),

    #[error("SMS send failed: {reason}")]
    SendFailed { reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Successful resolution of one delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Send and every secondary update succeeded
    Delivered,
    /// Send succeeded but a secondary update failed; acknowledged so the
    /// queue does not redeliver and duplicate the send
    Degraded { warning: String },
}

/// Queue consumer performing outbound sends.
pub struct DeliveryWorker {
    customers: Arc<dyn CustomerStore>,
    enrollments: Arc<dyn EnrollmentStore>,
    chat_messages: Arc<dyn ChatMessageStore>,
    gateway: Arc<dyn SmsGateway>,
    aggregator: ResponseAggregator,
}

impl DeliveryWorker {
    pub fn new(
        customers: Arc<dyn CustomerStore>,
        enrollments: Arc<dyn EnrollmentStore>,
        chat_messages: Arc<dyn ChatMessageStore>,
        gateway: Arc<dyn SmsGateway>,
        aggregator: ResponseAggregator,
    ) -> Self {
        Self {
            customers,
            enrollments,
            chat_messages,
            gateway,
            aggregator,
        }
    }

    /// Process one delivered batch, resolving every message independently.
    pub async fn process_batch(&self, deliveries: &[QueueDelivery]) -> BatchConsumeReport {
        let outcomes = join_all(
            deliveries
                .iter()
                .map(|delivery| self.process_delivery(delivery)),
        )
        .await;

        let mut report = BatchConsumeReport::default();
        for (delivery, outcome) in deliveries.iter().zip(outcomes) {
            match outcome {
                Ok(DeliveryOutcome::Delivered) => report.record_success(&delivery.message_id),
                Ok(DeliveryOutcome::Degraded { warning }) => {
                    warn!(
                        message_id = %delivery.message_id,
                        warning = %warning,
                        "Delivery succeeded with degraded side effects"
                    );
                    report.record_success(&delivery.message_id);
                }
                Err(err) => {
                    error!(
                        message_id = %delivery.message_id,
                        receive_count = delivery.receive_count,
                        error = %err,
                        "Delivery failed, reporting for redelivery"
                    );
                    report.record_failure(&delivery.message_id, err.to_string());
                }
            }
        }
        report
    }

    /// Process a single delivery.
    pub async fn process_delivery(
        &self,
        delivery: &QueueDelivery,
    ) -> Result<DeliveryOutcome, DeliveryError> {
        info!(message_id = %delivery.message_id, "Processing queue delivery");

        match delivery.parse()? {
            QueueMessage::Campaign {
                phone_number,
                message,
                campaign_id,
                ..
            } => {
                self.process_campaign_message(&phone_number, &message, &campaign_id)
                    .await
            }
            QueueMessage::Manual {
                phone_number,
                message,
                message_id,
            } => {
                self.process_manual_message(&phone_number, &message, message_id.as_deref())
                    .await
            }
            QueueMessage::AgentResponse {
                phone_number,
                agent_response,
                ..
            } => self.process_agent_response(&phone_number, &agent_response).await,
        }
    }

    async fn process_campaign_message(
        &self,
        phone_number: &str,
        message: &str,
        campaign_id: &str,
    ) -> Result<DeliveryOutcome, DeliveryError> {
        let normalized = normalize_phone_number(phone_number)?;
        let mut warnings = Vec::new();

        let send_result = self.gateway.send_sms(&normalized, message).await;

        // The attempt is recorded whether or not the send succeeded.
        self.append_chat_message(
            NewChatMessage::outbound(&normalized, message, ResponseType::Automated)
                .with_campaign(campaign_id)
                .with_gateway_result(&send_result),
            &send_result,
            &mut warnings,
        )
        .await?;

        // Advance enrollment even on send failure; its own failure is
        // logged but must not mask the send outcome.
        let event = if send_result.success {
            EnrollmentEvent::SendSucceeded
        } else {
            EnrollmentEvent::SendFailed
        };
        if let Err(err) = self
            .enrollments
            .transition(campaign_id, &normalized, event)
            .await
        {
            warn!(
                campaign_id,
                phone = %mask_phone_number(&normalized),
                error = %err,
                "Enrollment status update failed after send"
            );
            warnings.push(format!("enrollment status update failed: {err}"));
        }

        info!(
            campaign_id,
            phone = %mask_phone_number(&normalized),
            success = send_result.success,
            external_message_id = send_result.message_id.as_deref(),
            "Campaign message processed"
        );

        self.finish(send_result, warnings)
    }

    async fn process_manual_message(
        &self,
        phone_number: &str,
        message: &str,
        message_id: Option<&str>,
    ) -> Result<DeliveryOutcome, DeliveryError> {
        if message.trim().is_empty() {
            return Err(DeliveryError::EmptyMessage);
        }
        let normalized = normalize_phone_number(phone_number)?;
        let mut warnings = Vec::new();

        let send_result = self.gateway.send_sms(&normalized, message).await;

        // The API layer records the chat entry when it enqueues with an
        // id; otherwise the attempt is recorded here.
        if message_id.is_none() {
            self.append_chat_message(
                NewChatMessage::outbound(&normalized, message, ResponseType::Manual)
                    .with_gateway_result(&send_result),
                &send_result,
                &mut warnings,
            )
            .await?;
        }

        // A human took over the conversation.
        if send_result.success {
            if let Err(err) = self
                .customers
                .update(&normalized, CustomerUpdate::agent_responding())
                .await
            {
                warn!(
                    phone = %mask_phone_number(&normalized),
                    error = %err,
                    "Customer status update failed after manual send"
                );
                warnings.push(format!("customer status update failed: {err}"));
            }
        }

        info!(
            phone = %mask_phone_number(&normalized),
            message_id,
            success = send_result.success,
            "Manual message processed"
        );

        self.finish(send_result, warnings)
    }

    async fn process_agent_response(
        &self,
        phone_number: &str,
        payload: &AgentResponsePayload,
    ) -> Result<DeliveryOutcome, DeliveryError> {
        if payload.response_text.trim().is_empty() {
            return Err(DeliveryError::EmptyMessage);
        }
        let normalized = normalize_phone_number(phone_number)?;
        let mut warnings = Vec::new();

        let send_result = self
            .gateway
            .send_sms(&normalized, &payload.response_text)
            .await;

        self.append_chat_message(
            NewChatMessage::outbound(&normalized, &payload.response_text, ResponseType::AiAgent)
                .with_campaign(&payload.campaign_id)
                .with_agent_metadata(
                    payload.should_handoff,
                    payload.handoff_reason.clone(),
                    payload.user_sentiment,
                )
                .with_gateway_result(&send_result),
            &send_result,
            &mut warnings,
        )
        .await?;

        // Metrics aggregation failure never blocks the recorded response.
        match self
            .aggregator
            .apply_response(
                &payload.campaign_id,
                &normalized,
                payload.user_sentiment,
                payload.should_handoff,
                payload.handoff_reason.as_deref(),
            )
            .await
        {
            Ok(_) => {}
            Err(AggregationError::Store(err)) => {
                warn!(
                    campaign_id = %payload.campaign_id,
                    phone = %mask_phone_number(&normalized),
                    error = %err,
                    "Metrics aggregation failed for response"
                );
                warnings.push(format!("metrics aggregation failed: {err}"));
            }
        }

        info!(
            campaign_id = %payload.campaign_id,
            phone = %mask_phone_number(&normalized),
            success = send_result.success,
            "Agent response processed"
        );

        self.finish(send_result, warnings)
    }

    /// Append the attempt to chat history. When the send itself succeeded
    /// an append failure is degraded (retrying would resend); when the
    /// send failed it is surfaced with the failure.
    async fn append_chat_message(
        &self,
        message: NewChatMessage,
        send_result: &SmsSendResult,
        warnings: &mut Vec<String>,
    ) -> Result<(), DeliveryError> {
        if let Err(err) = self.chat_messages.append(message).await {
            if send_result.success {
                warn!(error = %err, "Chat history append failed after successful send");
                warnings.push(format!("chat history append failed: {err}"));
            } else {
                return Err(err.into());
            }
        }
        Ok(())
    }

    /// Fold the gateway outcome and accumulated warnings into the final
    /// per-message result.
    fn finish(
        &self,
        send_result: SmsSendResult,
        warnings: Vec<String>,
    ) -> Result<DeliveryOutcome, DeliveryError> {
        if !send_result.success {
            return Err(DeliveryError::SendFailed {
                reason: send_result
                    .error
                    .unwrap_or_else(|| "unknown gateway error".to_string()),
            });
        }
        if warnings.is_empty() {
            Ok(DeliveryOutcome::Delivered)
        } else {
            Ok(DeliveryOutcome::Degraded {
                warning: warnings.join("; "),
            })
        }
    }
}
