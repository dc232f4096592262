//! # Response/Metrics Aggregator
//!
//! Folds inbound agent-response events into the owning campaign's
//! counters and advances the enrollment state machine on a contact's
//! first response. Every counter change for one event is coalesced into a
//! single [`CampaignMetricsDelta`] and applied as one additive store
//! write, so interleaved concurrent responses cannot lose updates.
//!
//! Counting windows:
//!
//! - the sentiment-matched response counter applies to every response;
//! - `response_count` and the first-response bucket apply only when the
//!   enrollment is currently `sent` (the first response), which also moves
//!   it to `processed`;
//! - the handoff bucket applies when the enrollment is `sent` or
//!   `processed`, on first and subsequent responses alike.
//!
//! A response can arrive while the enrollment is still `pending` or
//! `processing` - the delivery worker's `sent` transition races inbound
//! traffic. Such a response updates only the unconditional sentiment
//! counter; that window is part of the contract, not a bug to fix here.
//!
//! Response events carry no dedup key, so a redelivered event counts
//! again - a known gap documented in DESIGN.md.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::models::{CampaignMetricsDelta, Sentiment};
use crate::state_machine::{EnrollmentEvent, EnrollmentStatus};
use crate::store::{CampaignStore, EnrollmentStore, StoreError};
use crate::utils::phone::mask_phone_number;

/// Errors from applying a response event.
#[derive(Debug, Error)]
pub enum AggregationError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What the aggregator did with one response event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregationOutcome {
    /// Counters applied; flags describe which windows matched.
    Applied {
        first_response: bool,
        handoff_counted: bool,
    },
    /// No matching enrollment; nothing was recorded.
    NoEnrollment,
}

/// Applies inbound response events to campaign metrics.
pub struct ResponseAggregator {
    campaigns: Arc<dyn CampaignStore>,
    enrollments: Arc<dyn EnrollmentStore>,
}

impl ResponseAggregator {
    pub fn new(campaigns: Arc<dyn CampaignStore>, enrollments: Arc<dyn EnrollmentStore>) -> Self {
        Self {
            campaigns,
            enrollments,
        }
    }

    /// Apply one response event to the owning campaign.
    ///
    /// Missing enrollments are a warning, never fatal: the response itself
    /// was already recorded in chat history by the caller.
    pub async fn apply_response(
        &self,
        campaign_id: &str,
        phone_number: &str,
        sentiment: Option<Sentiment>,
        should_handoff: bool,
        handoff_reason: Option<&str>,
    ) -> Result<AggregationOutcome, AggregationError> {
        let Some(enrollment) = self.enrollments.find(campaign_id, phone_number).await? else {
            warn!(
                campaign_id,
                phone = %mask_phone_number(phone_number),
                "No enrollment for response, skipping metrics"
            );
            return Ok(AggregationOutcome::NoEnrollment);
        };

        let sentiment = sentiment.unwrap_or_default();
        let mut delta = CampaignMetricsDelta::default();

        // Every response lands in the sentiment-matched bucket.
        delta.record_response(sentiment);

        let first_response = enrollment.status == EnrollmentStatus::Sent;
        if first_response {
            // First response for this contact: advance the enrollment and
            // count it. A failed transition keeps the counters flowing.
            if let Err(err) = self
                .enrollments
                .transition(campaign_id, phone_number, EnrollmentEvent::ResponseReceived)
                .await
            {
                warn!(
                    campaign_id,
                    phone = %mask_phone_number(phone_number),
                    error = %err,
                    "Enrollment transition to processed failed, continuing"
                );
            }
            delta.record_first_response(sentiment);
        }

        // Handoffs count on first and subsequent responses, but only once
        // the contact actually reached the send.
        let handoff_counted = should_handoff
            && matches!(
                enrollment.status,
                EnrollmentStatus::Sent | EnrollmentStatus::Processed
            );
        if handoff_counted {
            delta.record_handoff(sentiment);
        }

        // One additive write for the whole event.
        self.campaigns.apply_metrics(campaign_id, &delta).await?;

        info!(
            campaign_id,
            phone = %mask_phone_number(phone_number),
            sentiment = %sentiment,
            first_response,
            handoff_counted,
            handoff_reason,
            "Applied response metrics"
        );

        Ok(AggregationOutcome::Applied {
            first_response,
            handoff_counted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Campaign, Enrollment};
    use crate::store::{InMemoryCampaignStore, InMemoryEnrollmentStore};

    struct Fixture {
        campaigns: Arc<InMemoryCampaignStore>,
        enrollments: Arc<InMemoryEnrollmentStore>,
        aggregator: ResponseAggregator,
        campaign_id: String,
    }

    async fn fixture(status: EnrollmentStatus) -> Fixture {
        let campaigns = Arc::new(InMemoryCampaignStore::new());
        let enrollments = Arc::new(InMemoryEnrollmentStore::new());

        let campaign = Campaign::new("test", "Hello", "");
        let campaign_id = campaign.campaign_id.clone();
        campaigns.insert(campaign).await.unwrap();

        let mut enrollment = Enrollment::new(&campaign_id, "+12128675309");
        enrollment.status = status;
        enrollments.insert(enrollment).await.unwrap();

        let aggregator = ResponseAggregator::new(
            campaigns.clone() as Arc<dyn CampaignStore>,
            enrollments.clone() as Arc<dyn EnrollmentStore>,
        );

        Fixture {
            campaigns,
            enrollments,
            aggregator,
            campaign_id,
        }
    }

    #[tokio::test]
    async fn test_first_response_counts_everything() {
        let fx = fixture(EnrollmentStatus::Sent).await;

        let outcome = fx
            .aggregator
            .apply_response(&fx.campaign_id, "+12128675309", Some(Sentiment::Positive), true, Some("wants pricing"))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            AggregationOutcome::Applied {
                first_response: true,
                handoff_counted: true
            }
        );

        let campaign = fx.campaigns.find_by_id(&fx.campaign_id).await.unwrap().unwrap();
        assert_eq!(campaign.metrics.response_count, 1);
        assert_eq!(campaign.metrics.positive_response_count, 1);
        assert_eq!(campaign.metrics.first_response_positive_count, 1);
        assert_eq!(campaign.metrics.positive_handoff_count, 1);

        let enrollment = fx
            .enrollments
            .find(&fx.campaign_id, "+12128675309")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(enrollment.status, EnrollmentStatus::Processed);
    }

    #[tokio::test]
    async fn test_subsequent_response_counts_sentiment_and_handoff_only() {
        let fx = fixture(EnrollmentStatus::Processed).await;

        let outcome = fx
            .aggregator
            .apply_response(&fx.campaign_id, "+12128675309", Some(Sentiment::Negative), true, None)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            AggregationOutcome::Applied {
                first_response: false,
                handoff_counted: true
            }
        );

        let campaign = fx.campaigns.find_by_id(&fx.campaign_id).await.unwrap().unwrap();
        assert_eq!(campaign.metrics.negative_response_count, 1);
        assert_eq!(campaign.metrics.negative_handoff_count, 1);
        assert_eq!(campaign.metrics.response_count, 0);
        assert_eq!(campaign.metrics.first_response_negative_count, 0);
    }

    #[tokio::test]
    async fn test_early_response_race_counts_sentiment_only() {
        // Response arrives before the delivery worker recorded `sent`.
        let fx = fixture(EnrollmentStatus::Processing).await;

        let outcome = fx
            .aggregator
            .apply_response(&fx.campaign_id, "+12128675309", Some(Sentiment::Positive), true, Some("wants pricing"))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            AggregationOutcome::Applied {
                first_response: false,
                handoff_counted: false
            }
        );

        let campaign = fx.campaigns.find_by_id(&fx.campaign_id).await.unwrap().unwrap();
        assert_eq!(campaign.metrics.positive_response_count, 1);
        assert_eq!(campaign.metrics.response_count, 0);
        assert_eq!(campaign.metrics.positive_handoff_count, 0);

        // Status untouched: the worker still owns the sent transition.
        let enrollment = fx
            .enrollments
            .find(&fx.campaign_id, "+12128675309")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(enrollment.status, EnrollmentStatus::Processing);
    }

    #[tokio::test]
    async fn test_handoff_not_counted_before_send() {
        let fx = fixture(EnrollmentStatus::Pending).await;

        fx.aggregator
            .apply_response(&fx.campaign_id, "+12128675309", Some(Sentiment::Neutral), true, None)
            .await
            .unwrap();

        let campaign = fx.campaigns.find_by_id(&fx.campaign_id).await.unwrap().unwrap();
        assert_eq!(campaign.metrics.neutral_handoff_count, 0);
        assert_eq!(campaign.metrics.neutral_response_count, 1);
    }

    #[tokio::test]
    async fn test_missing_enrollment_is_warning_not_error() {
        let fx = fixture(EnrollmentStatus::Sent).await;

        let outcome = fx
            .aggregator
            .apply_response(&fx.campaign_id, "+19998887777", Some(Sentiment::Positive), false, None)
            .await
            .unwrap();

        assert_eq!(outcome, AggregationOutcome::NoEnrollment);

        let campaign = fx.campaigns.find_by_id(&fx.campaign_id).await.unwrap().unwrap();
        assert_eq!(campaign.metrics.positive_response_count, 0);
    }

    #[tokio::test]
    async fn test_unspecified_sentiment_defaults_to_neutral() {
        let fx = fixture(EnrollmentStatus::Sent).await;

        fx.aggregator
            .apply_response(&fx.campaign_id, "+12128675309", None, false, None)
            .await
            .unwrap();

        let campaign = fx.campaigns.find_by_id(&fx.campaign_id).await.unwrap().unwrap();
        assert_eq!(campaign.metrics.neutral_response_count, 1);
        assert_eq!(campaign.metrics.first_response_neutral_count, 1);
    }

    #[tokio::test]
    async fn test_redelivered_event_double_counts() {
        // No dedup key on response events: applying the same event twice
        // counts twice. Documents the known gap.
        let fx = fixture(EnrollmentStatus::Sent).await;

        for _ in 0..2 {
            fx.aggregator
                .apply_response(
                    &fx.campaign_id,
                    "+12128675309",
                    Some(Sentiment::Positive),
                    false,
                    None,
                )
                .await
                .unwrap();
        }

        let campaign = fx.campaigns.find_by_id(&fx.campaign_id).await.unwrap().unwrap();
        assert_eq!(campaign.metrics.positive_response_count, 2);
        // The first-response window closed after the first event.
        assert_eq!(campaign.metrics.response_count, 1);
        assert_eq!(campaign.metrics.first_response_positive_count, 1);
    }
}
