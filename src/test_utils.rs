//! # Test Utilities
//!
//! Doubles and fixture factories shared by unit and integration tests:
//! a scriptable SMS gateway, a queue wrapper that fails chosen batches,
//! and seeding helpers that build a campaign with enrolled, resolvable
//! customers.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::delivery::gateway::{SmsGateway, SmsSendResult};
use crate::messaging::{InMemoryQueue, MessageQueue, MessagingError, MessagingResult, QueueMessage};
use crate::models::{Campaign, CampaignStatus, Customer, Enrollment};
use crate::store::{CampaignStore, CustomerStore, EnrollmentStore};

/// Gateway double that succeeds by default and fails for registered
/// numbers, recording every attempt.
#[derive(Debug, Default)]
pub struct MockSmsGateway {
    fail_numbers: Mutex<HashSet<String>>,
    sent: Mutex<Vec<(String, String)>>,
    next_id: AtomicU64,
}

impl MockSmsGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make future sends to this number fail.
    pub fn fail_for(&self, phone_number: impl Into<String>) {
        self.fail_numbers.lock().insert(phone_number.into());
    }

    /// All attempted sends as (phone, message) pairs, in order.
    pub fn sent_messages(&self) -> Vec<(String, String)> {
        self.sent.lock().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }
}

#[async_trait]
impl SmsGateway for MockSmsGateway {
    async fn send_sms(&self, phone_number: &str, message: &str) -> SmsSendResult {
        self.sent
            .lock()
            .push((phone_number.to_string(), message.to_string()));

        if self.fail_numbers.lock().contains(phone_number) {
            SmsSendResult::failure("gateway rejected number")
        } else {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            SmsSendResult::success(format!("ext-{id}"))
        }
    }
}

/// Queue wrapper that fails chosen `send_batch` calls (0-indexed) to
/// exercise per-batch failure isolation.
#[derive(Debug, Default)]
pub struct FlakyQueue {
    inner: InMemoryQueue,
    fail_calls: Mutex<HashSet<usize>>,
    calls: AtomicUsize,
}

impl FlakyQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the nth send_batch call (0-indexed).
    pub fn fail_call(&self, index: usize) {
        self.fail_calls.lock().insert(index);
    }

    pub fn inner(&self) -> &InMemoryQueue {
        &self.inner
    }
}

#[async_trait]
impl MessageQueue for FlakyQueue {
    async fn send_batch(&self, messages: &[QueueMessage]) -> MessagingResult<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_calls.lock().contains(&call) {
            return Err(MessagingError::queue_operation(
                "test_queue",
                "send_batch",
                "injected batch failure",
            ));
        }
        self.inner.send_batch(messages).await
    }
}

/// Deterministic test phone number for index `i`.
pub fn test_phone(i: usize) -> String {
    format!("+1212555{i:04}")
}

/// Customer fixture with a deterministic phone number.
pub fn make_customer(i: usize) -> Customer {
    Customer::new(test_phone(i), format!("First{i}"), format!("Last{i}"))
}

/// Seed a ready campaign with `count` enrolled, resolvable customers.
/// Returns the campaign id.
pub async fn seed_campaign(
    campaigns: &Arc<dyn CampaignStore>,
    customers: &Arc<dyn CustomerStore>,
    enrollments: &Arc<dyn EnrollmentStore>,
    template: &str,
    count: usize,
) -> String {
    let mut campaign = Campaign::new("test campaign", template, "seeded by test_utils");
    campaign.status = CampaignStatus::Ready;
    campaign.total_contacts = count as u64;
    let campaign_id = campaign.campaign_id.clone();
    campaigns.insert(campaign).await.expect("insert campaign");

    for i in 0..count {
        let customer = make_customer(i);
        let enrollment = Enrollment::new(&campaign_id, &customer.phone_number);
        customers.put(customer).await.expect("put customer");
        enrollments.insert(enrollment).await.expect("insert enrollment");
    }

    campaign_id
}
