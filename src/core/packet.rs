//! # Wire Protocol Packets
//!
//! Packet schema, validation rules, and serialization for the sync
//! protocol.
//!
//! ## Wire Format
//! One JSON document per message, terminated by a single `\n` byte. The
//! delimiter is safe because neither base64 nor hex payloads can contain a
//! newline. Every packet carries an integer `version` and a string `type`;
//! request and response payloads are arrays of file records:
//!
//! ```text
//! {"version":1,"type":"pullRequest","request":[{"filename":"a.mp3","checksum":"3610a686"}]}
//! ```
//!
//! Validation is deliberately two-stage: frames that fail to parse as JSON
//! close the session, while well-formed documents that fail [`validate`]
//! are silently ignored. Both stages leave the multiplexer untouched.

use crate::config::PROTOCOL_VERSION;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// The seven recognized packet types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    ListRequest,
    ListResponse,
    PullRequest,
    PullResponse,
    PushRequest,
    PushResponse,
    Leave,
}

impl PacketType {
    /// Parse a wire `type` string. Returns `None` for anything outside the
    /// seven recognized values.
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "listRequest" => Some(Self::ListRequest),
            "listResponse" => Some(Self::ListResponse),
            "pullRequest" => Some(Self::PullRequest),
            "pullResponse" => Some(Self::PullResponse),
            "pushRequest" => Some(Self::PushRequest),
            "pushResponse" => Some(Self::PushResponse),
            "leave" => Some(Self::Leave),
            _ => None,
        }
    }

    /// The wire `type` string for this packet type.
    pub fn as_wire(self) -> &'static str {
        match self {
            Self::ListRequest => "listRequest",
            Self::ListResponse => "listResponse",
            Self::PullRequest => "pullRequest",
            Self::PullResponse => "pullResponse",
            Self::PushRequest => "pushRequest",
            Self::PushResponse => "pushResponse",
            Self::Leave => "leave",
        }
    }

    /// The payload field this type requires, if any. Requests carry
    /// `request`, responses carry `response`, `listRequest` and `leave`
    /// carry nothing.
    fn payload_field(self) -> Option<&'static str> {
        match self {
            Self::PullRequest | Self::PushRequest => Some("request"),
            Self::ListResponse | Self::PullResponse | Self::PushResponse => Some("response"),
            Self::ListRequest | Self::Leave => None,
        }
    }
}

/// One file entry inside a request or response payload.
///
/// `data` is present only where file content travels: pull responses and
/// push requests. It is omitted from the JSON entirely when `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub filename: String,
    pub checksum: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl FileRecord {
    /// A record carrying no file content (list responses, pull requests).
    pub fn new(filename: impl Into<String>, checksum: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            checksum: checksum.into(),
            data: None,
        }
    }

    /// A record carrying base64 file content (pull responses, push requests).
    pub fn with_data(
        filename: impl Into<String>,
        checksum: impl Into<String>,
        data: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            checksum: checksum.into(),
            data: Some(data.into()),
        }
    }
}

/// Check a parsed document against the packet schema.
///
/// A packet is well-formed iff it is an object, its `version` is the fixed
/// integer protocol version, its `type` is one of the seven recognized
/// values, and the payload field required by that type is an array.
pub fn validate(packet: &Value) -> bool {
    let Some(object) = packet.as_object() else {
        return false;
    };

    if object.get("version").and_then(Value::as_i64) != Some(PROTOCOL_VERSION) {
        return false;
    }

    let Some(packet_type) = object
        .get("type")
        .and_then(Value::as_str)
        .and_then(PacketType::from_wire)
    else {
        return false;
    };

    match packet_type.payload_field() {
        Some(field) => object.get(field).is_some_and(Value::is_array),
        None => true,
    }
}

/// Two-argument overload: well-formed and of the expected type.
pub fn validate_expected(packet: &Value, expected: PacketType) -> bool {
    validate(packet)
        && packet.get("type").and_then(Value::as_str) == Some(expected.as_wire())
}

/// Build a response packet of the given type around a sequence of records.
pub fn response_packet(packet_type: PacketType, records: Vec<FileRecord>) -> Value {
    json!({
        "version": PROTOCOL_VERSION,
        "type": packet_type.as_wire(),
        "response": records,
    })
}

/// Build a request packet of the given type around a sequence of records.
pub fn request_packet(packet_type: PacketType, records: Vec<FileRecord>) -> Value {
    json!({
        "version": PROTOCOL_VERSION,
        "type": packet_type.as_wire(),
        "request": records,
    })
}

/// The packet that announces a clean disconnect. Carries no payload.
pub fn leave_packet() -> Value {
    json!({
        "version": PROTOCOL_VERSION,
        "type": PacketType::Leave.as_wire(),
    })
}

/// Extract the typed items of a validated request packet.
///
/// Items that are missing `filename` or `checksum`, or whose fields are not
/// strings, are an error; the session handler treats that as a misbehaving
/// peer and closes the session.
pub fn request_items(packet: &Value) -> Result<Vec<FileRecord>> {
    let items = packet.get("request").cloned().unwrap_or(Value::Null);
    Ok(serde_json::from_value(items)?)
}

/// Render a packet as its single-line wire string (no trailing newline;
/// the frame codec appends the delimiter).
pub fn serialize(packet: &Value) -> String {
    packet.to_string()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn validate_accepts_all_seven_types() {
        for packet in [
            json!({"version": 1, "type": "listRequest"}),
            json!({"version": 1, "type": "listResponse", "response": []}),
            json!({"version": 1, "type": "pullRequest", "request": []}),
            json!({"version": 1, "type": "pullResponse", "response": []}),
            json!({"version": 1, "type": "pushRequest", "request": []}),
            json!({"version": 1, "type": "pushResponse", "response": []}),
            json!({"version": 1, "type": "leave"}),
        ] {
            assert!(validate(&packet), "rejected {packet}");
        }
    }

    #[test]
    fn validate_rejects_bad_version() {
        assert!(!validate(&json!({"version": 2, "type": "listRequest"})));
        assert!(!validate(&json!({"version": "1", "type": "listRequest"})));
        assert!(!validate(&json!({"version": 1.5, "type": "listRequest"})));
        assert!(!validate(&json!({"type": "listRequest"})));
    }

    #[test]
    fn validate_rejects_bad_type() {
        assert!(!validate(&json!({"version": 1, "type": "renameRequest"})));
        assert!(!validate(&json!({"version": 1, "type": 7})));
        assert!(!validate(&json!({"version": 1})));
    }

    #[test]
    fn validate_rejects_wrong_payload_kind() {
        assert!(!validate(&json!({"version": 1, "type": "pullRequest"})));
        assert!(!validate(
            &json!({"version": 1, "type": "pullRequest", "request": {}})
        ));
        assert!(!validate(
            &json!({"version": 1, "type": "listResponse", "response": "a.mp3"})
        ));
    }

    #[test]
    fn validate_rejects_non_objects() {
        assert!(!validate(&json!([1, 2, 3])));
        assert!(!validate(&json!("listRequest")));
        assert!(!validate(&json!(null)));
    }

    #[test]
    fn validate_expected_checks_type() {
        let packet = json!({"version": 1, "type": "listRequest"});
        assert!(validate_expected(&packet, PacketType::ListRequest));
        assert!(!validate_expected(&packet, PacketType::Leave));
    }

    #[test]
    fn response_packet_shape() {
        let packet = response_packet(
            PacketType::ListResponse,
            vec![FileRecord::new("a.mp3", "3610a686")],
        );
        assert!(validate_expected(&packet, PacketType::ListResponse));
        assert_eq!(packet["response"][0]["filename"], "a.mp3");
        assert_eq!(packet["response"][0]["checksum"], "3610a686");
        // No data field on content-free records
        assert!(packet["response"][0].get("data").is_none());
    }

    #[test]
    fn records_with_data_serialize_it() {
        let packet = response_packet(
            PacketType::PullResponse,
            vec![FileRecord::with_data("a.mp3", "3610a686", "aGVsbG8=")],
        );
        assert_eq!(packet["response"][0]["data"], "aGVsbG8=");
    }

    #[test]
    fn request_items_roundtrip() {
        let packet = request_packet(
            PacketType::PullRequest,
            vec![FileRecord::new("a.mp3", "3610a686")],
        );
        let items = request_items(&packet).expect("items");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].filename, "a.mp3");
        assert!(items[0].data.is_none());
    }

    #[test]
    fn request_items_reject_malformed_entries() {
        let packet = json!({
            "version": 1,
            "type": "pullRequest",
            "request": [{"filename": "a.mp3"}],
        });
        assert!(validate(&packet));
        assert!(request_items(&packet).is_err());

        let packet = json!({
            "version": 1,
            "type": "pullRequest",
            "request": [{"filename": 42, "checksum": "ff"}],
        });
        assert!(request_items(&packet).is_err());
    }

    #[test]
    fn serialized_packets_are_single_line() {
        let packet = response_packet(
            PacketType::PushResponse,
            vec![FileRecord::new("song (1).mp3", "deadbeef")],
        );
        let wire = serialize(&packet);
        assert!(!wire.contains('\n'));
        let reparsed: Value = serde_json::from_str(&wire).expect("reparse");
        assert!(validate(&reparsed));
    }
}
