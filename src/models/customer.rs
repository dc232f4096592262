use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Conversation-handling state of a customer, across campaigns.
///
/// `automated` while campaign automation owns the conversation,
/// `needs_response` once an inbound message is waiting on a human or
/// agent, `agent_responding` after a manual or agent send took over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CustomerStatus {
    #[default]
    Automated,
    NeedsResponse,
    AgentResponding,
}

impl fmt::Display for CustomerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Automated => write!(f, "automated"),
            Self::NeedsResponse => write!(f, "needs_response"),
            Self::AgentResponding => write!(f, "agent_responding"),
        }
    }
}

impl std::str::FromStr for CustomerStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "automated" => Ok(Self::Automated),
            "needs_response" => Ok(Self::NeedsResponse),
            "agent_responding" => Ok(Self::AgentResponding),
            _ => Err(format!("Invalid customer status: {s}")),
        }
    }
}

/// A contact, keyed by normalized E.164 phone number.
///
/// Created on first contact (upload or inbound message) and never deleted
/// by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub phone_number: String,
    pub first_name: String,
    pub last_name: String,
    pub status: CustomerStatus,
    pub most_recent_campaign_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Create a new customer with default status and current timestamps.
    pub fn new(
        phone_number: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            phone_number: phone_number.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            status: CustomerStatus::default(),
            most_recent_campaign_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update applied to a customer record. Unset fields are left
/// untouched by the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerUpdate {
    pub status: Option<CustomerStatus>,
    pub most_recent_campaign_id: Option<String>,
}

impl CustomerUpdate {
    /// Update applied to every contact at the start of a dispatch run:
    /// associate the campaign and hand the conversation back to automation.
    pub fn for_dispatch(campaign_id: impl Into<String>) -> Self {
        Self {
            status: Some(CustomerStatus::Automated),
            most_recent_campaign_id: Some(campaign_id.into()),
        }
    }

    /// Update applied after a successful manual send.
    pub fn agent_responding() -> Self {
        Self {
            status: Some(CustomerStatus::AgentResponding),
            most_recent_campaign_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_customer_defaults() {
        let customer = Customer::new("+12128675309", "Ana", "Lee");
        assert_eq!(customer.status, CustomerStatus::Automated);
        assert!(customer.most_recent_campaign_id.is_none());
    }

    #[test]
    fn test_status_string_conversion() {
        assert_eq!(CustomerStatus::NeedsResponse.to_string(), "needs_response");
        assert_eq!(
            "agent_responding".parse::<CustomerStatus>().unwrap(),
            CustomerStatus::AgentResponding
        );
        assert!("unknown".parse::<CustomerStatus>().is_err());
    }

    #[test]
    fn test_dispatch_update_shape() {
        let update = CustomerUpdate::for_dispatch("camp-1");
        assert_eq!(update.status, Some(CustomerStatus::Automated));
        assert_eq!(update.most_recent_campaign_id.as_deref(), Some("camp-1"));
    }
}
