//! Transaction request/response messages.
//!
//! These are the only two payloads that cross the wire. Field names on the
//! wire follow the established peer format (`timestamp`, `success`), so the
//! Rust names are mapped with `serde(rename)`.

use serde::{Deserialize, Serialize};

/// Response id that marks a protocol-level failure rather than a decision.
pub const ERROR_RESPONSE_ID: &str = "ERROR";

/// Message carried by the synthetic error response.
pub const ERROR_RESPONSE_MESSAGE: &str = "Failed to process payment";

/// A payment authorization request sent by the Initiator.
///
/// `id` is chosen by the caller and is the correlation key for the response.
/// `amount` is not validated here: zero and negative values pass through to
/// the processor untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRequest {
    /// Caller-generated request id.
    pub id: String,
    /// Amount to authorize.
    pub amount: f64,
    /// Free-form description.
    pub description: String,
    /// Creation time, epoch milliseconds.
    #[serde(rename = "timestamp")]
    pub created_at: i64,
}

impl TransactionRequest {
    /// Build a request stamped with the current time.
    pub fn new(id: impl Into<String>, amount: f64, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            amount,
            description: description.into(),
            created_at: crate::now_millis(),
        }
    }
}

/// The Responder's answer to a [`TransactionRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionResponse {
    /// Id of the originating request, or [`ERROR_RESPONSE_ID`].
    pub id: String,
    /// Whether the payment was approved.
    #[serde(rename = "success")]
    pub approved: bool,
    /// Human-readable outcome.
    pub message: String,
    /// Response time, epoch milliseconds.
    #[serde(rename = "timestamp")]
    pub responded_at: i64,
}

impl TransactionResponse {
    /// Approved response for `request_id`.
    pub fn approved(request_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: request_id.into(),
            approved: true,
            message: message.into(),
            responded_at: crate::now_millis(),
        }
    }

    /// Rejected response for `request_id`.
    pub fn rejected(request_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: request_id.into(),
            approved: false,
            message: message.into(),
            responded_at: crate::now_millis(),
        }
    }

    /// Synthetic response sent back when an inbound request cannot be decoded.
    pub fn protocol_error() -> Self {
        Self::rejected(ERROR_RESPONSE_ID, ERROR_RESPONSE_MESSAGE)
    }

    /// Whether this is the protocol-failure sentinel.
    pub fn is_protocol_error(&self) -> bool {
        self.id == ERROR_RESPONSE_ID
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_field_names() {
        let req = TransactionRequest {
            id: "PAY_1".to_string(),
            amount: 100.0,
            description: "test".to_string(),
            created_at: 1_700_000_000_000,
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["id"], "PAY_1");
        assert_eq!(value["amount"], 100.0);
        assert_eq!(value["description"], "test");
        assert_eq!(value["timestamp"], 1_700_000_000_000i64);
        assert!(value.get("created_at").is_none());
    }

    #[test]
    fn test_response_parses_peer_format() {
        let json = r#"{"id":"PAY_9","success":true,"message":"ok","timestamp":42}"#;
        let resp: TransactionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.id, "PAY_9");
        assert!(resp.approved);
        assert_eq!(resp.responded_at, 42);
    }

    #[test]
    fn test_request_accepts_integer_amount() {
        let json = r#"{"id":"a","amount":-5,"description":"","timestamp":0}"#;
        let req: TransactionRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.amount, -5.0);
    }

    #[test]
    fn test_protocol_error_sentinel() {
        let resp = TransactionResponse::protocol_error();
        assert!(resp.is_protocol_error());
        assert!(!resp.approved);
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["id"], "ERROR");
        assert_eq!(value["success"], false);
    }
}
