use serde::{Deserialize, Serialize};

/// One outbound reply message, in the platform's reply-API shape.
///
/// The broker returns answers as ordered free-form fragments; each fragment
/// becomes one of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

impl ReplyMessage {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".into(),
            text: text.into(),
        }
    }
}

/// Terminal outcome of processing one inbound event.
///
/// Serialised into the webhook response's per-event result array. Errors are
/// contained per event; a dropped event never aborts its batch siblings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EventOutcome {
    /// Broker answered and the reply was handed to the platform.
    Delivered { fragments: usize },
    /// The event was abandoned; the user receives no reply for this turn.
    Dropped { reason: String },
    /// The event carried nothing we dispatch on (unknown type, no user id).
    Ignored,
}

impl EventOutcome {
    #[must_use]
    pub fn dropped(reason: impl Into<String>) -> Self {
        Self::Dropped {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_message_wire_shape() {
        let msg = ReplyMessage::text("Hi!");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json, serde_json::json!({"type": "text", "text": "Hi!"}));
    }

    #[test]
    fn outcome_tags() {
        let json = serde_json::to_value(EventOutcome::Delivered { fragments: 2 }).unwrap();
        assert_eq!(json["status"], "delivered");
        assert_eq!(json["fragments"], 2);

        let json = serde_json::to_value(EventOutcome::dropped("broker unreachable")).unwrap();
        assert_eq!(json["status"], "dropped");

        let json = serde_json::to_value(EventOutcome::Ignored).unwrap();
        assert_eq!(json["status"], "ignored");
    }
}
