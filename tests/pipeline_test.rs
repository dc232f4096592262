//! End-to-end pipeline test: dispatch a campaign, drain the queue through
//! the delivery worker, then feed agent-response events back through the
//! aggregator and check the campaign's aggregate state.

use std::sync::Arc;

use outreach_core::aggregator::ResponseAggregator;
use outreach_core::config::DispatchSettings;
use outreach_core::delivery::{DeliveryWorker, SmsGateway};
use outreach_core::dispatch::DispatchOrchestrator;
use outreach_core::messaging::{InMemoryQueue, MessageQueue, QueueDelivery, QueueMessage};
use outreach_core::models::CampaignStatus;
use outreach_core::state_machine::EnrollmentStatus;
use outreach_core::store::{
    CampaignStore, ChatMessageStore, CustomerStore, EnrollmentStore, InMemoryCampaignStore,
    InMemoryChatMessageStore, InMemoryCustomerStore, InMemoryEnrollmentStore,
};
use outreach_core::test_utils::{seed_campaign, test_phone, MockSmsGateway};

#[tokio::test]
async fn test_full_campaign_lifecycle() {
    let campaigns = Arc::new(InMemoryCampaignStore::new());
    let customers = Arc::new(InMemoryCustomerStore::new());
    let enrollments = Arc::new(InMemoryEnrollmentStore::new());
    let chat_messages = Arc::new(InMemoryChatMessageStore::new());
    let queue = Arc::new(InMemoryQueue::new());
    let gateway = Arc::new(MockSmsGateway::new());

    let campaigns_dyn = campaigns.clone() as Arc<dyn CampaignStore>;
    let customers_dyn = customers.clone() as Arc<dyn CustomerStore>;
    let enrollments_dyn = enrollments.clone() as Arc<dyn EnrollmentStore>;

    let campaign_id = seed_campaign(
        &campaigns_dyn,
        &customers_dyn,
        &enrollments_dyn,
        "Hi {{first_name}}, our spring offer ends Friday.",
        25,
    )
    .await;

    // Phase 1: dispatch
    let orchestrator = DispatchOrchestrator::with_settings(
        campaigns_dyn.clone(),
        customers_dyn.clone(),
        enrollments_dyn.clone(),
        queue.clone() as Arc<dyn MessageQueue>,
        DispatchSettings {
            inter_batch_delay_ms: 1,
            ..DispatchSettings::default()
        },
    );
    let dispatch_result = orchestrator.dispatch(&campaign_id).await.unwrap();
    assert_eq!(dispatch_result.queued, 25);
    assert_eq!(dispatch_result.batches_ok, 3);
    assert_eq!(queue.batch_calls(), 3);

    // Phase 2: the delivery worker drains the queue
    let worker = DeliveryWorker::new(
        customers_dyn.clone(),
        enrollments_dyn.clone(),
        chat_messages.clone() as Arc<dyn ChatMessageStore>,
        gateway.clone() as Arc<dyn SmsGateway>,
        ResponseAggregator::new(campaigns_dyn.clone(), enrollments_dyn.clone()),
    );

    loop {
        let deliveries = queue.receive(10);
        if deliveries.is_empty() {
            break;
        }
        let report = worker.process_batch(&deliveries).await;
        assert!(report.all_succeeded());
    }

    assert_eq!(gateway.sent_count(), 25);
    assert_eq!(chat_messages.len(), 25);
    for i in 0..25 {
        let enrollment = enrollments
            .find(&campaign_id, &test_phone(i))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(enrollment.status, EnrollmentStatus::Sent);
    }

    // Personalization reached the gateway
    let sent = gateway.sent_messages();
    let first = sent.iter().find(|(phone, _)| phone == &test_phone(0)).unwrap();
    assert_eq!(first.1, "Hi First0, our spring offer ends Friday.");

    // Phase 3: agent responses come back for one contact
    let first_response = agent_response_body(&campaign_id, &test_phone(3), "positive", true);
    let report = worker
        .process_batch(&[QueueDelivery::new("resp-1", &first_response)])
        .await;
    assert!(report.all_succeeded());

    let campaign = campaigns.find_by_id(&campaign_id).await.unwrap().unwrap();
    assert_eq!(campaign.status, CampaignStatus::Sent);
    assert_eq!(campaign.sent_count, 25);
    assert_eq!(campaign.metrics.response_count, 1);
    assert_eq!(campaign.metrics.positive_response_count, 1);
    assert_eq!(campaign.metrics.first_response_positive_count, 1);
    assert_eq!(campaign.metrics.positive_handoff_count, 1);

    let enrollment = enrollments
        .find(&campaign_id, &test_phone(3))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(enrollment.status, EnrollmentStatus::Processed);

    // A subsequent response with handoff: no first-response counters, but
    // the handoff bucket still counts.
    let second_response = agent_response_body(&campaign_id, &test_phone(3), "neutral", true);
    worker
        .process_batch(&[QueueDelivery::new("resp-2", &second_response)])
        .await;

    let campaign = campaigns.find_by_id(&campaign_id).await.unwrap().unwrap();
    assert_eq!(campaign.metrics.response_count, 1);
    assert_eq!(campaign.metrics.neutral_response_count, 1);
    assert_eq!(campaign.metrics.first_response_neutral_count, 0);
    assert_eq!(campaign.metrics.neutral_handoff_count, 1);

    // Chat history for the responding contact: campaign send plus two
    // agent responses.
    let history = chat_messages.find_by_phone(&test_phone(3)).await.unwrap();
    assert_eq!(history.len(), 3);
}

#[tokio::test]
async fn test_lifecycle_with_partial_gateway_failures() {
    let campaigns = Arc::new(InMemoryCampaignStore::new());
    let customers = Arc::new(InMemoryCustomerStore::new());
    let enrollments = Arc::new(InMemoryEnrollmentStore::new());
    let chat_messages = Arc::new(InMemoryChatMessageStore::new());
    let queue = Arc::new(InMemoryQueue::new());
    let gateway = Arc::new(MockSmsGateway::new());

    let campaigns_dyn = campaigns.clone() as Arc<dyn CampaignStore>;
    let customers_dyn = customers.clone() as Arc<dyn CustomerStore>;
    let enrollments_dyn = enrollments.clone() as Arc<dyn EnrollmentStore>;

    let campaign_id =
        seed_campaign(&campaigns_dyn, &customers_dyn, &enrollments_dyn, "Hello", 6).await;
    gateway.fail_for(test_phone(2));

    let orchestrator = DispatchOrchestrator::with_settings(
        campaigns_dyn.clone(),
        customers_dyn.clone(),
        enrollments_dyn.clone(),
        queue.clone() as Arc<dyn MessageQueue>,
        DispatchSettings {
            inter_batch_delay_ms: 1,
            ..DispatchSettings::default()
        },
    );
    orchestrator.dispatch(&campaign_id).await.unwrap();

    let worker = DeliveryWorker::new(
        customers_dyn,
        enrollments_dyn,
        chat_messages.clone() as Arc<dyn ChatMessageStore>,
        gateway.clone() as Arc<dyn SmsGateway>,
        ResponseAggregator::new(campaigns_dyn, enrollments.clone() as Arc<dyn EnrollmentStore>),
    );

    let deliveries = queue.receive(10);
    let report = worker.process_batch(&deliveries).await;

    // Exactly one item failed; only it is redelivered
    assert_eq!(report.failed_ids().len(), 1);

    // Status machine reflects the split
    let mut sent = 0;
    let mut failed = 0;
    for i in 0..6 {
        match enrollments
            .find(&campaign_id, &test_phone(i))
            .await
            .unwrap()
            .unwrap()
            .status
        {
            EnrollmentStatus::Sent => sent += 1,
            EnrollmentStatus::Failed => failed += 1,
            other => panic!("unexpected status {other}"),
        }
    }
    assert_eq!(sent, 5);
    assert_eq!(failed, 1);

    // Every attempt is on the chat log, including the failed one
    assert_eq!(chat_messages.len(), 6);
}

fn agent_response_body(
    campaign_id: &str,
    phone_number: &str,
    sentiment: &str,
    should_handoff: bool,
) -> String {
    let message = QueueMessage::AgentResponse {
        phone_number: phone_number.to_string(),
        agent_response: outreach_core::messaging::AgentResponsePayload {
            response_text: "Thanks for reaching out!".to_string(),
            should_handoff,
            handoff_reason: should_handoff.then(|| "interested".to_string()),
            user_sentiment: Some(sentiment.parse().unwrap()),
            guardrails_intervened: None,
            campaign_id: campaign_id.to_string(),
        },
        timestamp: None,
    };
    message.to_body().unwrap()
}
