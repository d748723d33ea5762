//! Payload of the GitHub `create` event.
//!
//! Only the fields the receiver acts on are modelled; everything else in the
//! delivery is ignored by serde.

use serde::Deserialize;

/// The event type that triggers tag reconciliation.
pub const CREATE_EVENT: &str = "create";

/// What kind of ref a `create` event announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefType {
    Tag,
    Branch,
    Repository,
}

/// The account that triggered the delivery.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Sender {
    pub login: String,
}

/// A `create` event: a branch or tag was pushed to the repository.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateEvent {
    /// Name of the created ref, e.g. `1.2.0`.
    #[serde(rename = "ref")]
    pub git_ref: String,

    /// Present on real deliveries; only used for diagnostics.
    #[serde(default)]
    pub ref_type: Option<RefType>,

    pub sender: Sender,
}

impl CreateEvent {
    /// Decodes the raw request body.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_minimal_payload() {
        let body = br#"{"ref":"3.0.0","sender":{"login":"alice"}}"#;
        let event = CreateEvent::from_slice(body).unwrap();
        assert_eq!(event.git_ref, "3.0.0");
        assert_eq!(event.sender.login, "alice");
        assert_eq!(event.ref_type, None);
    }

    #[test]
    fn ignores_unrelated_fields() {
        let body = json!({
            "ref": "1.4.0",
            "ref_type": "tag",
            "master_branch": "main",
            "pusher_type": "user",
            "repository": { "name": "hello-world", "owner": { "login": "octocat" } },
            "sender": { "login": "octocat", "id": 1 }
        });
        let event = CreateEvent::from_slice(&serde_json::to_vec(&body).unwrap()).unwrap();
        assert_eq!(event.git_ref, "1.4.0");
        assert_eq!(event.ref_type, Some(RefType::Tag));
        assert_eq!(event.sender.login, "octocat");
    }

    #[test]
    fn missing_sender_login_is_an_error() {
        assert!(CreateEvent::from_slice(br#"{"ref":"1.0.0","sender":{}}"#).is_err());
        assert!(CreateEvent::from_slice(br#"{"ref":"1.0.0"}"#).is_err());
    }

    #[test]
    fn missing_ref_is_an_error() {
        assert!(CreateEvent::from_slice(br#"{"sender":{"login":"alice"}}"#).is_err());
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(CreateEvent::from_slice(b"not json").is_err());
        assert!(CreateEvent::from_slice(b"").is_err());
    }
}
