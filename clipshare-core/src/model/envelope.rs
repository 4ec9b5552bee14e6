use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// `type` value of the only envelope that may open a new negotiation.
pub const OPENING_KIND: &str = "offer";

/// Opaque negotiation message relayed verbatim between two peers.
///
/// The broker never looks inside. Peers only read the `type` field to decide
/// whether an envelope may create a new responder link.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(transparent)]
pub struct SignalEnvelope(pub Value);

impl SignalEnvelope {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self(json!({ "type": "offer", "sdp": sdp.into() }))
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self(json!({ "type": "answer", "sdp": sdp.into() }))
    }

    pub fn candidate(candidate: Value) -> Self {
        Self(json!({ "type": "candidate", "candidate": candidate }))
    }

    pub fn kind(&self) -> Option<&str> {
        self.0.get("type").and_then(Value::as_str)
    }

    pub fn is_opening(&self) -> bool {
        self.kind() == Some(OPENING_KIND)
    }

    pub fn sdp(&self) -> Option<&str> {
        self.0.get("sdp").and_then(Value::as_str)
    }
}
