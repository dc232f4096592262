//! # In-Memory Store Implementations
//!
//! DashMap-backed implementations of the store traits. These are the
//! reference backends for tests and local development; the shard locks of
//! `DashMap` give the same single-key atomicity the traits require from a
//! production key-value store (conditional status transitions, additive
//! counter updates).

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::Mutex;

use super::{
    CampaignStore, ChatMessageStore, CustomerStore, EnrollmentStore, StoreError, StoreResult,
};
use crate::models::{
    Campaign, CampaignMetricsDelta, CampaignStatus, ChatMessage, Customer, CustomerUpdate,
    Enrollment, NewChatMessage,
};
use crate::state_machine::{next_state, EnrollmentEvent, EnrollmentStatus};

/// In-memory customer collection keyed by phone number.
#[derive(Debug, Default)]
pub struct InMemoryCustomerStore {
    customers: DashMap<String, Customer>,
}

impl InMemoryCustomerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.customers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
    }
}

#[async_trait]
impl CustomerStore for InMemoryCustomerStore {
    async fn find_by_phone(&self, phone_number: &str) -> StoreResult<Option<Customer>> {
        Ok(self.customers.get(phone_number).map(|c| c.clone()))
    }

    async fn put(&self, customer: Customer) -> StoreResult<()> {
        self.customers.insert(customer.phone_number.clone(), customer);
        Ok(())
    }

    async fn update(&self, phone_number: &str, update: CustomerUpdate) -> StoreResult<Customer> {
        let mut entry = self
            .customers
            .get_mut(phone_number)
            .ok_or_else(|| StoreError::not_found("customer", phone_number))?;

        if let Some(status) = update.status {
            entry.status = status;
        }
        if let Some(campaign_id) = update.most_recent_campaign_id {
            entry.most_recent_campaign_id = Some(campaign_id);
        }
        entry.updated_at = Utc::now();

        Ok(entry.clone())
    }
}

/// In-memory campaign collection keyed by campaign id.
#[derive(Debug, Default)]
pub struct InMemoryCampaignStore {
    campaigns: DashMap<String, Campaign>,
}

impl InMemoryCampaignStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CampaignStore for InMemoryCampaignStore {
    async fn find_by_id(&self, campaign_id: &str) -> StoreResult<Option<Campaign>> {
        Ok(self.campaigns.get(campaign_id).map(|c| c.clone()))
    }

    async fn insert(&self, campaign: Campaign) -> StoreResult<()> {
        self.campaigns.insert(campaign.campaign_id.clone(), campaign);
        Ok(())
    }

    async fn update_status(&self, campaign_id: &str, status: CampaignStatus) -> StoreResult<()> {
        let mut entry = self
            .campaigns
            .get_mut(campaign_id)
            .ok_or_else(|| StoreError::not_found("campaign", campaign_id))?;
        entry.status = status;
        entry.updated_at = Utc::now();
        Ok(())
    }

    async fn record_dispatch_completion(&self, campaign_id: &str, queued: u64) -> StoreResult<()> {
        let mut entry = self
            .campaigns
            .get_mut(campaign_id)
            .ok_or_else(|| StoreError::not_found("campaign", campaign_id))?;
        let now = Utc::now();
        entry.sent_count += queued;
        entry.status = CampaignStatus::Sent;
        entry.sent_at = Some(now);
        entry.updated_at = now;
        Ok(())
    }

    async fn apply_metrics(
        &self,
        campaign_id: &str,
        delta: &CampaignMetricsDelta,
    ) -> StoreResult<()> {
        // The shard lock held by get_mut makes the increment atomic with
        // respect to concurrent apply_metrics calls.
        let mut entry = self
            .campaigns
            .get_mut(campaign_id)
            .ok_or_else(|| StoreError::not_found("campaign", campaign_id))?;
        delta.apply_to(&mut entry.metrics);
        entry.updated_at = Utc::now();
        Ok(())
    }
}

/// In-memory enrollment collection keyed by (campaign id, phone number).
#[derive(Debug, Default)]
pub struct InMemoryEnrollmentStore {
    enrollments: DashMap<(String, String), Enrollment>,
}

impl InMemoryEnrollmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(campaign_id: &str, phone_number: &str) -> (String, String) {
        (campaign_id.to_string(), phone_number.to_string())
    }
}

#[async_trait]
impl EnrollmentStore for InMemoryEnrollmentStore {
    async fn find(
        &self,
        campaign_id: &str,
        phone_number: &str,
    ) -> StoreResult<Option<Enrollment>> {
        Ok(self
            .enrollments
            .get(&Self::key(campaign_id, phone_number))
            .map(|e| e.clone()))
    }

    async fn find_by_campaign(&self, campaign_id: &str) -> StoreResult<Vec<Enrollment>> {
        let mut records: Vec<Enrollment> = self
            .enrollments
            .iter()
            .filter(|entry| entry.key().0 == campaign_id)
            .map(|entry| entry.value().clone())
            .collect();
        // Deterministic order for batch slicing
        records.sort_by(|a, b| a.phone_number.cmp(&b.phone_number));
        Ok(records)
    }

    async fn insert(&self, enrollment: Enrollment) -> StoreResult<()> {
        let key = Self::key(&enrollment.campaign_id, &enrollment.phone_number);
        self.enrollments.insert(key, enrollment);
        Ok(())
    }

    async fn transition(
        &self,
        campaign_id: &str,
        phone_number: &str,
        event: EnrollmentEvent,
    ) -> StoreResult<EnrollmentStatus> {
        let mut entry = self
            .enrollments
            .get_mut(&Self::key(campaign_id, phone_number))
            .ok_or_else(|| {
                StoreError::not_found("enrollment", format!("{campaign_id}:{phone_number}"))
            })?;

        // Validated while the shard lock is held: the conditional write.
        let next = next_state(entry.status, event)?;
        entry.status = next;
        entry.updated_at = Utc::now();
        Ok(next)
    }
}

/// In-memory append-only chat history.
#[derive(Debug, Default)]
pub struct InMemoryChatMessageStore {
    messages: Mutex<Vec<ChatMessage>>,
}

impl InMemoryChatMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }
}

#[async_trait]
impl ChatMessageStore for InMemoryChatMessageStore {
    async fn append(&self, message: NewChatMessage) -> StoreResult<ChatMessage> {
        let stored = message.into_message();
        self.messages.lock().push(stored.clone());
        Ok(stored)
    }

    async fn find_by_phone(&self, phone_number: &str) -> StoreResult<Vec<ChatMessage>> {
        Ok(self
            .messages
            .lock()
            .iter()
            .filter(|m| m.phone_number == phone_number)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ResponseType, Sentiment};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_customer_update_is_partial() {
        let store = InMemoryCustomerStore::new();
        store
            .put(Customer::new("+12128675309", "Ana", "Lee"))
            .await
            .unwrap();

        let updated = store
            .update(
                "+12128675309",
                CustomerUpdate {
                    status: None,
                    most_recent_campaign_id: Some("camp-1".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.first_name, "Ana");
        assert_eq!(updated.most_recent_campaign_id.as_deref(), Some("camp-1"));
    }

    #[tokio::test]
    async fn test_update_unknown_customer_is_not_found() {
        let store = InMemoryCustomerStore::new();
        let err = store
            .update("+12125550000", CustomerUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { kind: "customer", .. }));
    }

    #[tokio::test]
    async fn test_enrollment_transition_enforces_machine() {
        let store = InMemoryEnrollmentStore::new();
        store
            .insert(Enrollment::new("camp-1", "+12128675309"))
            .await
            .unwrap();

        let status = store
            .transition("camp-1", "+12128675309", EnrollmentEvent::DispatchStarted)
            .await
            .unwrap();
        assert_eq!(status, EnrollmentStatus::Processing);

        // Delivery outcome cannot be recorded before dispatch claims the
        // contact - and a sent contact cannot be re-claimed.
        let status = store
            .transition("camp-1", "+12128675309", EnrollmentEvent::SendSucceeded)
            .await
            .unwrap();
        assert_eq!(status, EnrollmentStatus::Sent);

        let err = store
            .transition("camp-1", "+12128675309", EnrollmentEvent::DispatchStarted)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn test_concurrent_metric_deltas_all_land() {
        let store = Arc::new(InMemoryCampaignStore::new());
        let campaign = Campaign::new("load", "hello", "");
        let campaign_id = campaign.campaign_id.clone();
        store.insert(campaign).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..50 {
            let store = Arc::clone(&store);
            let campaign_id = campaign_id.clone();
            handles.push(tokio::spawn(async move {
                let mut delta = CampaignMetricsDelta::default();
                delta.record_response(Sentiment::Positive);
                store.apply_metrics(&campaign_id, &delta).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let campaign = store.find_by_id(&campaign_id).await.unwrap().unwrap();
        assert_eq!(campaign.metrics.positive_response_count, 50);
    }

    #[tokio::test]
    async fn test_chat_history_is_append_only_and_filtered() {
        let store = InMemoryChatMessageStore::new();
        store
            .append(NewChatMessage::outbound(
                "+12128675309",
                "hi",
                ResponseType::Automated,
            ))
            .await
            .unwrap();
        store
            .append(NewChatMessage::outbound(
                "+13105550000",
                "other",
                ResponseType::Manual,
            ))
            .await
            .unwrap();

        let history = store.find_by_phone("+12128675309").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].message, "hi");
    }

    #[tokio::test]
    async fn test_find_by_campaign_is_deterministic() {
        let store = InMemoryEnrollmentStore::new();
        for phone in ["+12125550003", "+12125550001", "+12125550002"] {
            store.insert(Enrollment::new("camp-1", phone)).await.unwrap();
        }
        store.insert(Enrollment::new("camp-2", "+12125550009")).await.unwrap();

        let records = store.find_by_campaign("camp-1").await.unwrap();
        let phones: Vec<_> = records.iter().map(|e| e.phone_number.as_str()).collect();
        assert_eq!(phones, vec!["+12125550001", "+12125550002", "+12125550003"]);
    }
}
