//! # Enrollment State Machine
//!
//! The authoritative per-contact delivery state machine:
//!
//! ```text
//! pending --(dispatch begins)--> processing --(send succeeds)--> sent --(first response)--> processed
//!                                     \--(send fails)--> failed
//! ```
//!
//! Status only moves forward in this ordering. The queue delivers at least
//! once and dispatch runs can be retried, so redundant identical events
//! (`processing` re-claimed, `sent` re-marked `sent`) resolve to the state
//! they are already in rather than erroring; everything else is an
//! [`StateMachineError::InvalidTransition`].
//!
//! The table here is pure; stores enforce it under concurrency with
//! conditional (compare-and-set) writes keyed on the expected source
//! states.

pub mod errors;
pub mod events;
pub mod states;

pub use errors::{StateMachineError, StateMachineResult};
pub use events::EnrollmentEvent;
pub use states::EnrollmentStatus;

/// Determine the target state for an event, or fail for an illegal
/// transition.
pub fn next_state(
    current: EnrollmentStatus,
    event: EnrollmentEvent,
) -> StateMachineResult<EnrollmentStatus> {
    use EnrollmentEvent::*;
    use EnrollmentStatus::*;

    let target = match (current, event) {
        // Dispatch claims the contact; re-claiming during a retried
        // dispatch run is a no-op.
        (Pending, DispatchStarted) => Processing,
        (Processing, DispatchStarted) => Processing,

        // Delivery outcome
        (Processing, SendSucceeded) => Sent,
        (Processing, SendFailed) => Failed,

        // At-least-once queue delivery: a redelivered send job may report
        // the same outcome again.
        (Sent, SendSucceeded) => Sent,
        (Failed, SendFailed) => Failed,

        // First inbound response; later responses leave the state alone.
        (Sent, ResponseReceived) => Processed,
        (Processed, ResponseReceived) => Processed,

        (from, event) => return Err(StateMachineError::InvalidTransition { from, event }),
    };

    Ok(target)
}
