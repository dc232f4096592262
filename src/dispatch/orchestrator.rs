//! # Dispatch Orchestrator
//!
//! ## Architecture: Campaign-to-Queue Expansion with Batch Isolation
//!
//! The orchestrator turns one campaign into per-contact send jobs on the
//! outbound queue. The run is shaped by two concurrency bounds: customer
//! records are resolved in chunks (default 1000) with the whole chunk
//! settling before the next starts, and send jobs leave in batches sized
//! to the queue's batch-enqueue limit (10), with a fixed delay between
//! batches as a crude rate limiter.
//!
//! Failure isolation is per item inside a batch's store updates and per
//! batch at the enqueue: a failed customer update or enrollment claim is
//! logged and skipped, and a failed batch enqueue marks those contacts
//! failed without aborting the remaining batches. The result carries
//! aggregate counts, never an all-or-nothing verdict.
//!
//! Re-dispatch is safe: only enrollments still `pending` or `processing`
//! are picked up, so contacts that already reached `sent`, `failed`, or
//! `processed` cannot receive a duplicate send from a retried run.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::config::DispatchSettings;
use crate::messaging::{MessageQueue, MessagingError, QueueMessage};
use crate::models::{Campaign, CampaignStatus, Customer, CustomerUpdate, Enrollment};
use crate::personalization;
use crate::state_machine::EnrollmentEvent;
use crate::store::{CampaignStore, CustomerStore, EnrollmentStore, StoreError};
use crate::utils::phone::mask_phone_number;

/// Errors that terminate a dispatch run before any batch is processed.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Campaign not found: {campaign_id}")]
    CampaignNotFound { campaign_id: String },

    #[error("No contacts enrolled in campaign: {campaign_id}")]
    NoEnrolledContacts { campaign_id: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Messaging(#[from] MessagingError),
}

/// How a dispatch run renders messages, fixed once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignMode {
    /// Identical text for every contact
    Broadcast,
    /// Per-contact placeholder substitution
    Personalized,
}

impl fmt::Display for CampaignMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Broadcast => write!(f, "broadcast"),
            Self::Personalized => write!(f, "personalized"),
        }
    }
}

/// Aggregate outcome of one dispatch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchResult {
    pub campaign_id: String,
    pub mode: CampaignMode,
    /// Enrollment records loaded for the campaign
    pub total_enrolled: usize,
    /// Enrollments skipped because they already reached sent/failed/processed
    pub skipped_terminal: usize,
    /// Eligible enrollments resolved to a customer record
    pub total_resolved: usize,
    /// Contacts enqueued successfully
    pub queued: usize,
    /// Contacts in batches whose enqueue failed
    pub failed: usize,
    pub batches_ok: usize,
    pub batches_failed: usize,
    pub duration_ms: u64,
    /// Non-fatal problems encountered along the way
    pub warnings: Vec<String>,
}

/// Drives the campaign-to-queue expansion.
pub struct DispatchOrchestrator {
    campaigns: Arc<dyn CampaignStore>,
    customers: Arc<dyn CustomerStore>,
    enrollments: Arc<dyn EnrollmentStore>,
    queue: Arc<dyn MessageQueue>,
    settings: DispatchSettings,
}

impl DispatchOrchestrator {
    pub fn new(
        campaigns: Arc<dyn CampaignStore>,
        customers: Arc<dyn CustomerStore>,
        enrollments: Arc<dyn EnrollmentStore>,
        queue: Arc<dyn MessageQueue>,
    ) -> Self {
        Self::with_settings(
            campaigns,
            customers,
            enrollments,
            queue,
            DispatchSettings::default(),
        )
    }

    pub fn with_settings(
        campaigns: Arc<dyn CampaignStore>,
        customers: Arc<dyn CustomerStore>,
        enrollments: Arc<dyn EnrollmentStore>,
        queue: Arc<dyn MessageQueue>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            campaigns,
            customers,
            enrollments,
            queue,
            settings,
        }
    }

    /// Run a full dispatch for one campaign.
    #[instrument(skip(self), fields(campaign_id = %campaign_id))]
    pub async fn dispatch(&self, campaign_id: &str) -> Result<DispatchResult, DispatchError> {
        let started = Instant::now();
        info!("Starting campaign dispatch");

        let campaign = self
            .campaigns
            .find_by_id(campaign_id)
            .await?
            .ok_or_else(|| DispatchError::CampaignNotFound {
                campaign_id: campaign_id.to_string(),
            })?;

        let enrollments = self.enrollments.find_by_campaign(campaign_id).await?;
        if enrollments.is_empty() {
            return Err(DispatchError::NoEnrolledContacts {
                campaign_id: campaign_id.to_string(),
            });
        }

        let total_enrolled = enrollments.len();
        let eligible: Vec<Enrollment> = enrollments
            .into_iter()
            .filter(|e| e.status.is_dispatchable())
            .collect();
        let skipped_terminal = total_enrolled - eligible.len();
        if skipped_terminal > 0 {
            info!(
                skipped = skipped_terminal,
                "Skipping enrollments already past dispatch"
            );
        }

        let mode = if personalization::has_placeholders(&campaign.message_template) {
            CampaignMode::Personalized
        } else {
            CampaignMode::Broadcast
        };

        let mut warnings = Vec::new();

        if eligible.is_empty() {
            // Re-dispatch of a fully processed campaign: nothing to claim,
            // leave campaign status and counts untouched.
            warnings.push("no dispatchable enrollments remain".to_string());
            return Ok(DispatchResult {
                campaign_id: campaign_id.to_string(),
                mode,
                total_enrolled,
                skipped_terminal,
                total_resolved: 0,
                queued: 0,
                failed: 0,
                batches_ok: 0,
                batches_failed: 0,
                duration_ms: started.elapsed().as_millis() as u64,
                warnings,
            });
        }

        let contacts = self.resolve_customers(&eligible, &mut warnings).await;
        let total_resolved = contacts.len();

        info!(
            mode = %mode,
            total_enrolled,
            total_resolved,
            "Campaign classified and contacts resolved"
        );

        self.campaigns
            .update_status(campaign_id, CampaignStatus::Sending)
            .await?;

        let (queued, failed, batches_ok, batches_failed) = self
            .process_batches(&campaign, mode, &contacts, &mut warnings)
            .await;

        self.campaigns
            .record_dispatch_completion(campaign_id, queued as u64)
            .await?;

        let result = DispatchResult {
            campaign_id: campaign_id.to_string(),
            mode,
            total_enrolled,
            skipped_terminal,
            total_resolved,
            queued,
            failed,
            batches_ok,
            batches_failed,
            duration_ms: started.elapsed().as_millis() as u64,
            warnings,
        };

        info!(
            queued = result.queued,
            failed = result.failed,
            batches_ok = result.batches_ok,
            batches_failed = result.batches_failed,
            duration_ms = result.duration_ms,
            "Campaign dispatch completed"
        );

        Ok(result)
    }

    /// Resolve full customer records for the eligible enrollments in
    /// bounded chunks. Enrollments without a customer record are dropped
    /// with a warning; individual lookup failures are isolated the same
    /// way.
    async fn resolve_customers(
        &self,
        eligible: &[Enrollment],
        warnings: &mut Vec<String>,
    ) -> Vec<(Enrollment, Customer)> {
        let chunk_size = self.settings.lookup_chunk_size;
        let total_chunks = eligible.len().div_ceil(chunk_size);
        let mut customer_map: HashMap<String, Customer> = HashMap::with_capacity(eligible.len());

        for (chunk_index, chunk) in eligible.chunks(chunk_size).enumerate() {
            let lookups = chunk
                .iter()
                .map(|enrollment| self.customers.find_by_phone(&enrollment.phone_number));
            let resolved = join_all(lookups).await;

            let mut loaded = 0usize;
            for (enrollment, outcome) in chunk.iter().zip(resolved) {
                match outcome {
                    Ok(Some(customer)) => {
                        customer_map.insert(customer.phone_number.clone(), customer);
                        loaded += 1;
                    }
                    Ok(None) => {
                        warn!(
                            phone = %mask_phone_number(&enrollment.phone_number),
                            "Enrolled contact has no customer record, dropping"
                        );
                        warnings.push(format!(
                            "missing customer record for {}",
                            mask_phone_number(&enrollment.phone_number)
                        ));
                    }
                    Err(err) => {
                        warn!(
                            phone = %mask_phone_number(&enrollment.phone_number),
                            error = %err,
                            "Customer lookup failed, dropping contact"
                        );
                        warnings.push(format!(
                            "customer lookup failed for {}: {err}",
                            mask_phone_number(&enrollment.phone_number)
                        ));
                    }
                }
            }

            debug!(
                chunk = chunk_index + 1,
                total_chunks,
                chunk_size = chunk.len(),
                loaded,
                "Loaded customer chunk"
            );
        }

        eligible
            .iter()
            .filter_map(|enrollment| {
                customer_map
                    .get(&enrollment.phone_number)
                    .map(|customer| (enrollment.clone(), customer.clone()))
            })
            .collect()
    }

    /// Process resolved contacts in queue-sized batches. Returns
    /// `(queued, failed, batches_ok, batches_failed)`.
    async fn process_batches(
        &self,
        campaign: &Campaign,
        mode: CampaignMode,
        contacts: &[(Enrollment, Customer)],
        warnings: &mut Vec<String>,
    ) -> (usize, usize, usize, usize) {
        let batch_size = self.settings.send_batch_size;
        let total_batches = contacts.len().div_ceil(batch_size);

        let mut queued = 0usize;
        let mut failed = 0usize;
        let mut batches_ok = 0usize;
        let mut batches_failed = 0usize;

        for (batch_index, batch) in contacts.chunks(batch_size).enumerate() {
            debug!(
                batch = batch_index + 1,
                total_batches,
                batch_size = batch.len(),
                "Processing dispatch batch"
            );

            // Associate the campaign with each customer; isolated failures.
            let customer_updates = batch.iter().map(|(_, customer)| {
                self.customers.update(
                    &customer.phone_number,
                    CustomerUpdate::for_dispatch(&campaign.campaign_id),
                )
            });
            for ((_, customer), outcome) in batch.iter().zip(join_all(customer_updates).await) {
                if let Err(err) = outcome {
                    warn!(
                        phone = %mask_phone_number(&customer.phone_number),
                        error = %err,
                        "Customer update failed in batch, continuing"
                    );
                    warnings.push(format!(
                        "customer update failed for {}: {err}",
                        mask_phone_number(&customer.phone_number)
                    ));
                }
            }

            // Claim each enrollment with a conditional pending/processing
            // transition; isolated failures.
            let claims = batch.iter().map(|(enrollment, _)| {
                self.enrollments.transition(
                    &campaign.campaign_id,
                    &enrollment.phone_number,
                    EnrollmentEvent::DispatchStarted,
                )
            });
            for ((enrollment, _), outcome) in batch.iter().zip(join_all(claims).await) {
                if let Err(err) = outcome {
                    warn!(
                        phone = %mask_phone_number(&enrollment.phone_number),
                        error = %err,
                        "Enrollment claim failed in batch, continuing"
                    );
                    warnings.push(format!(
                        "enrollment claim failed for {}: {err}",
                        mask_phone_number(&enrollment.phone_number)
                    ));
                }
            }

            // Render and enqueue the whole batch in one call.
            let messages: Vec<QueueMessage> = batch
                .iter()
                .map(|(_, customer)| {
                    let text = match mode {
                        CampaignMode::Personalized => personalization::render(
                            &campaign.message_template,
                            &customer.first_name,
                            &customer.last_name,
                        ),
                        CampaignMode::Broadcast => campaign.message_template.clone(),
                    };
                    QueueMessage::campaign(
                        &customer.phone_number,
                        text,
                        &campaign.campaign_id,
                        &customer.phone_number,
                    )
                })
                .collect();

            match self.queue.send_batch(&messages).await {
                Ok(()) => {
                    queued += messages.len();
                    batches_ok += 1;
                    debug!(
                        batch = batch_index + 1,
                        total_batches,
                        queued,
                        "Batch enqueued"
                    );
                }
                Err(err) => {
                    // One bad batch must not block the rest of the run.
                    failed += messages.len();
                    batches_failed += 1;
                    warn!(
                        batch = batch_index + 1,
                        total_batches,
                        error = %err,
                        "Batch enqueue failed, continuing with remaining batches"
                    );
                    warnings.push(format!("batch {} enqueue failed: {err}", batch_index + 1));
                }
            }

            // Crude send-rate limiter between batches.
            if batch_index + 1 < total_batches && self.settings.inter_batch_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.settings.inter_batch_delay_ms)).await;
            }
        }

        (queued, failed, batches_ok, batches_failed)
    }
}
