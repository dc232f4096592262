use thiserror::Error;

use super::events::EnrollmentEvent;
use super::states::EnrollmentStatus;

/// Errors raised by the enrollment state machine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateMachineError {
    #[error("Invalid transition: {event:?} not allowed from {from}")]
    InvalidTransition {
        from: EnrollmentStatus,
        event: EnrollmentEvent,
    },
}

pub type StateMachineResult<T> = std::result::Result<T, StateMachineError>;
