use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state_machine::EnrollmentStatus;

/// The (campaign, customer) join record tracking one contact's
/// per-campaign delivery state.
///
/// Status moves only forward through the machine in
/// [`crate::state_machine`]; stores enforce this with conditional writes.
/// Created on upload/enrollment, never deleted by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    pub campaign_id: String,
    pub phone_number: String,
    pub status: EnrollmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Enrollment {
    /// Create a pending enrollment for a contact in a campaign.
    pub fn new(campaign_id: impl Into<String>, phone_number: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            campaign_id: campaign_id.into(),
            phone_number: phone_number.into(),
            status: EnrollmentStatus::default(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_enrollment_is_pending() {
        let enrollment = Enrollment::new("camp-1", "+12128675309");
        assert_eq!(enrollment.status, EnrollmentStatus::Pending);
    }
}
