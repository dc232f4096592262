use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::sentiment::Sentiment;

/// Campaign lifecycle status.
///
/// `sending_personalized` is a recognized historical status emitted by an
/// earlier dispatcher; current dispatch runs mark both modes `sending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    #[default]
    Draft,
    Ready,
    Sending,
    SendingPersonalized,
    Sent,
    Completed,
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Ready => write!(f, "ready"),
            Self::Sending => write!(f, "sending"),
            Self::SendingPersonalized => write!(f, "sending_personalized"),
            Self::Sent => write!(f, "sent"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

impl std::str::FromStr for CampaignStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "ready" => Ok(Self::Ready),
            "sending" => Ok(Self::Sending),
            "sending_personalized" => Ok(Self::SendingPersonalized),
            "sent" => Ok(Self::Sent),
            "completed" => Ok(Self::Completed),
            _ => Err(format!("Invalid campaign status: {s}")),
        }
    }
}

/// Aggregate response/handoff counters on a campaign.
///
/// Counters only ever grow; they are mutated exclusively through
/// [`CampaignMetricsDelta`] so one response event lands as a single
/// additive write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignMetrics {
    pub response_count: u64,
    pub positive_response_count: u64,
    pub neutral_response_count: u64,
    pub negative_response_count: u64,
    pub first_response_positive_count: u64,
    pub first_response_neutral_count: u64,
    pub first_response_negative_count: u64,
    pub positive_handoff_count: u64,
    pub neutral_handoff_count: u64,
    pub negative_handoff_count: u64,
}

/// Additive counter update for one response event.
///
/// All increments for a single event are coalesced here and applied in one
/// store write, so interleaved concurrent responses cannot lose updates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignMetricsDelta {
    pub response_count: u64,
    pub positive_response_count: u64,
    pub neutral_response_count: u64,
    pub negative_response_count: u64,
    pub first_response_positive_count: u64,
    pub first_response_neutral_count: u64,
    pub first_response_negative_count: u64,
    pub positive_handoff_count: u64,
    pub neutral_handoff_count: u64,
    pub negative_handoff_count: u64,
}

impl CampaignMetricsDelta {
    /// True when applying the delta would be a no-op.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Count one response of the given sentiment (applies to every
    /// response, first or subsequent).
    pub fn record_response(&mut self, sentiment: Sentiment) {
        match sentiment {
            Sentiment::Positive => self.positive_response_count += 1,
            Sentiment::Neutral => self.neutral_response_count += 1,
            Sentiment::Negative => self.negative_response_count += 1,
        }
    }

    /// Count a contact's first response: bumps the overall response count
    /// and the sentiment-matched first-response bucket.
    pub fn record_first_response(&mut self, sentiment: Sentiment) {
        self.response_count += 1;
        match sentiment {
            Sentiment::Positive => self.first_response_positive_count += 1,
            Sentiment::Neutral => self.first_response_neutral_count += 1,
            Sentiment::Negative => self.first_response_negative_count += 1,
        }
    }

    /// Count a handoff in the sentiment-matched bucket.
    pub fn record_handoff(&mut self, sentiment: Sentiment) {
        match sentiment {
            Sentiment::Positive => self.positive_handoff_count += 1,
            Sentiment::Neutral => self.neutral_handoff_count += 1,
            Sentiment::Negative => self.negative_handoff_count += 1,
        }
    }

    /// Fold this delta into a metrics snapshot. Purely additive, so the
    /// monotonicity invariant holds by construction.
    pub fn apply_to(&self, metrics: &mut CampaignMetrics) {
        metrics.response_count += self.response_count;
        metrics.positive_response_count += self.positive_response_count;
        metrics.neutral_response_count += self.neutral_response_count;
        metrics.negative_response_count += self.negative_response_count;
        metrics.first_response_positive_count += self.first_response_positive_count;
        metrics.first_response_neutral_count += self.first_response_neutral_count;
        metrics.first_response_negative_count += self.first_response_negative_count;
        metrics.positive_handoff_count += self.positive_handoff_count;
        metrics.neutral_handoff_count += self.neutral_handoff_count;
        metrics.negative_handoff_count += self.negative_handoff_count;
    }
}

/// An outreach campaign: a message template plus per-campaign aggregate
/// delivery and response state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub campaign_id: String,
    pub name: String,
    pub message_template: String,
    pub details: String,
    pub total_contacts: u64,
    pub sent_count: u64,
    pub status: CampaignStatus,
    #[serde(flatten)]
    pub metrics: CampaignMetrics,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

impl Campaign {
    /// Create a new draft campaign with a generated id.
    pub fn new(
        name: impl Into<String>,
        message_template: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            campaign_id: Uuid::new_v4().to_string(),
            name: name.into(),
            message_template: message_template.into(),
            details: details.into(),
            total_contacts: 0,
            sent_count: 0,
            status: CampaignStatus::default(),
            metrics: CampaignMetrics::default(),
            created_at: now,
            updated_at: now,
            sent_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_campaign_defaults() {
        let campaign = Campaign::new("Spring promo", "Hi {{first_name}}", "");
        assert_eq!(campaign.status, CampaignStatus::Draft);
        assert_eq!(campaign.sent_count, 0);
        assert_eq!(campaign.metrics, CampaignMetrics::default());
        assert!(campaign.sent_at.is_none());
    }

    #[test]
    fn test_delta_coalesces_one_event() {
        let mut delta = CampaignMetricsDelta::default();
        delta.record_response(Sentiment::Positive);
        delta.record_first_response(Sentiment::Positive);
        delta.record_handoff(Sentiment::Positive);

        let mut metrics = CampaignMetrics::default();
        delta.apply_to(&mut metrics);

        assert_eq!(metrics.positive_response_count, 1);
        assert_eq!(metrics.response_count, 1);
        assert_eq!(metrics.first_response_positive_count, 1);
        assert_eq!(metrics.positive_handoff_count, 1);
        assert_eq!(metrics.neutral_response_count, 0);
    }

    #[test]
    fn test_empty_delta_is_noop() {
        let delta = CampaignMetricsDelta::default();
        assert!(delta.is_empty());

        let mut metrics = CampaignMetrics::default();
        metrics.response_count = 7;
        let before = metrics;
        delta.apply_to(&mut metrics);
        assert_eq!(metrics, before);
    }

    #[test]
    fn test_apply_is_monotonic() {
        let mut delta = CampaignMetricsDelta::default();
        delta.record_response(Sentiment::Negative);

        let mut metrics = CampaignMetrics::default();
        for expected in 1..=5 {
            delta.apply_to(&mut metrics);
            assert_eq!(metrics.negative_response_count, expected);
        }
    }

    #[test]
    fn test_status_string_conversion() {
        assert_eq!(CampaignStatus::SendingPersonalized.to_string(), "sending_personalized");
        assert_eq!("sent".parse::<CampaignStatus>().unwrap(), CampaignStatus::Sent);
        assert!("bogus".parse::<CampaignStatus>().is_err());
    }
}
