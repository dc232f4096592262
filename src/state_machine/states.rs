use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-contact delivery state for one campaign enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    /// Enrolled, not yet picked up by a dispatch run
    #[default]
    Pending,
    /// Claimed by a dispatch run, send job enqueued or about to be
    Processing,
    /// Outbound send succeeded
    Sent,
    /// Outbound send failed
    Failed,
    /// First inbound response received after the send
    Processed,
}

impl EnrollmentStatus {
    /// Position in the forward-only ordering. Transitions never decrease
    /// this value.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Processing => 1,
            Self::Sent => 2,
            Self::Failed => 2,
            Self::Processed => 3,
        }
    }

    /// Check if a dispatch run may (re-)claim this enrollment.
    ///
    /// `processing` stays claimable so a crashed dispatch run can be
    /// retried without touching contacts that already reached `sent` or
    /// `failed`.
    pub fn is_dispatchable(&self) -> bool {
        matches!(self, Self::Pending | Self::Processing)
    }

    /// Check if no further transition is reachable from this state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed | Self::Processed)
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Processing => write!(f, "processing"),
            Self::Sent => write!(f, "sent"),
            Self::Failed => write!(f, "failed"),
            Self::Processed => write!(f, "processed"),
        }
    }
}

impl std::str::FromStr for EnrollmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "sent" => Ok(Self::Sent),
            "failed" => Ok(Self::Failed),
            "processed" => Ok(Self::Processed),
            _ => Err(format!("Invalid enrollment status: {s}")),
        }
    }
}
