use serde::{Deserialize, Serialize};

/// Events that drive an enrollment through its delivery lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentEvent {
    /// A dispatch run claimed the contact
    DispatchStarted,
    /// The delivery worker's gateway send succeeded
    SendSucceeded,
    /// The delivery worker's gateway send failed
    SendFailed,
    /// The first inbound response arrived
    ResponseReceived,
}
