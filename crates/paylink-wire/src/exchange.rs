//! Request/response exchange state machines.
//!
//! [`InitiatorExchange`] tracks the single outstanding request on an
//! Initiator connection and classifies every inbound frame against it. The
//! Responder side has no per-request state, so it is just
//! [`handle_inbound`]: decode, process, and always produce a reply.
//!
//! Neither touches a socket. The connection drivers in [`crate::link`] and
//! [`crate::server`] feed them events and act on what they return.

use crate::connection::WireError;
use crate::message::{decode_request, decode_response};
use crate::server::RequestHandler;

use paylink_types::transaction::{TransactionRequest, TransactionResponse};
use std::time::Duration;
use tokio::time::Instant;

/// Exchange state of one Initiator connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeState {
    /// Nothing outstanding; a request may be submitted.
    Idle,
    /// A request was written and its response has not arrived.
    AwaitingResponse {
        request_id: String,
        /// `None` waits indefinitely.
        deadline: Option<Instant>,
    },
}

/// How an outstanding request ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ExchangeOutcome {
    /// Correlated response, approved.
    Approved(TransactionResponse),
    /// Correlated response, rejected.
    Rejected(TransactionResponse),
    /// The Responder could not decode the request and answered with the
    /// error sentinel.
    ProtocolError(TransactionResponse),
    /// No response before the deadline.
    TimedOut { request_id: String },
    /// The connection went away while waiting.
    ConnectionLost { request_id: String },
}

impl ExchangeOutcome {
    /// Id of the request this outcome settles.
    pub fn request_id(&self) -> &str {
        match self {
            Self::Approved(r) | Self::Rejected(r) => &r.id,
            Self::ProtocolError(_) => paylink_types::transaction::ERROR_RESPONSE_ID,
            Self::TimedOut { request_id } | Self::ConnectionLost { request_id } => request_id,
        }
    }

    /// The response, when one was received.
    pub fn response(&self) -> Option<&TransactionResponse> {
        match self {
            Self::Approved(r) | Self::Rejected(r) | Self::ProtocolError(r) => Some(r),
            Self::TimedOut { .. } | Self::ConnectionLost { .. } => None,
        }
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, Self::Approved(_))
    }

    /// Short operator-facing label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Approved(_) => "APPROVED",
            Self::Rejected(_) => "REJECTED",
            Self::ProtocolError(_) => "PROTOCOL ERROR",
            Self::TimedOut { .. } => "TIMED OUT",
            Self::ConnectionLost { .. } => "CONNECTION LOST",
        }
    }
}

impl std::fmt::Display for ExchangeOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.response() {
            Some(r) => write!(f, "{} - {}", self.label(), r.message),
            None => write!(f, "{} - {}", self.label(), self.request_id()),
        }
    }
}

/// What an inbound frame meant to the Initiator exchange.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameDisposition {
    /// The outstanding request is settled.
    Completed(ExchangeOutcome),
    /// The frame did not decode; the exchange keeps waiting.
    Malformed(String),
    /// A response for some other request; ignored, still waiting.
    Mismatched { expected: String, received: String },
    /// A response arrived while nothing was outstanding.
    Unsolicited(TransactionResponse),
}

/// One-request-at-a-time exchange for an Initiator connection.
#[derive(Debug)]
pub struct InitiatorExchange {
    state: ExchangeState,
    response_timeout: Option<Duration>,
}

impl InitiatorExchange {
    pub fn new(response_timeout: Option<Duration>) -> Self {
        Self {
            state: ExchangeState::Idle,
            response_timeout,
        }
    }

    pub fn state(&self) -> &ExchangeState {
        &self.state
    }

    pub fn is_awaiting(&self) -> bool {
        matches!(self.state, ExchangeState::AwaitingResponse { .. })
    }

    /// Deadline of the outstanding request, if it has one.
    pub fn deadline(&self) -> Option<Instant> {
        match &self.state {
            ExchangeState::AwaitingResponse { deadline, .. } => *deadline,
            ExchangeState::Idle => None,
        }
    }

    /// Mark `request_id` as outstanding.
    pub fn begin(&mut self, request_id: &str, now: Instant) -> Result<(), WireError> {
        if let ExchangeState::AwaitingResponse { request_id: pending, .. } = &self.state {
            return Err(WireError::RequestPending(pending.clone()));
        }
        self.state = ExchangeState::AwaitingResponse {
            request_id: request_id.to_string(),
            deadline: self.response_timeout.map(|t| now + t),
        };
        Ok(())
    }

    /// Undo [`begin`](Self::begin) after the request failed to go out.
    pub fn abandon(&mut self) {
        self.state = ExchangeState::Idle;
    }

    /// Classify an inbound frame.
    pub fn on_frame(&mut self, body: &[u8]) -> FrameDisposition {
        let response = match decode_response(body) {
            Ok(r) => r,
            Err(e) => return FrameDisposition::Malformed(e.to_string()),
        };

        let expected = match &self.state {
            ExchangeState::Idle => return FrameDisposition::Unsolicited(response),
            ExchangeState::AwaitingResponse { request_id, .. } => request_id.clone(),
        };

        if response.is_protocol_error() {
            self.state = ExchangeState::Idle;
            return FrameDisposition::Completed(ExchangeOutcome::ProtocolError(response));
        }
        if response.id != expected {
            return FrameDisposition::Mismatched {
                expected,
                received: response.id,
            };
        }

        self.state = ExchangeState::Idle;
        if response.approved {
            FrameDisposition::Completed(ExchangeOutcome::Approved(response))
        } else {
            FrameDisposition::Completed(ExchangeOutcome::Rejected(response))
        }
    }

    /// Expire the outstanding request if its deadline has passed.
    pub fn on_deadline(&mut self, now: Instant) -> Option<ExchangeOutcome> {
        let expired = matches!(
            &self.state,
            ExchangeState::AwaitingResponse { deadline: Some(deadline), .. } if now >= *deadline
        );
        if !expired {
            return None;
        }
        match std::mem::replace(&mut self.state, ExchangeState::Idle) {
            ExchangeState::AwaitingResponse { request_id, .. } => {
                Some(ExchangeOutcome::TimedOut { request_id })
            }
            ExchangeState::Idle => None,
        }
    }

    /// Settle the outstanding request because the connection ended.
    pub fn on_connection_lost(&mut self) -> Option<ExchangeOutcome> {
        match std::mem::replace(&mut self.state, ExchangeState::Idle) {
            ExchangeState::AwaitingResponse { request_id, .. } => {
                Some(ExchangeOutcome::ConnectionLost { request_id })
            }
            ExchangeState::Idle => None,
        }
    }
}

/// Result of handling one inbound frame on a Responder connection.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// The request decoded and was processed.
    Processed {
        request: TransactionRequest,
        response: TransactionResponse,
    },
    /// The frame did not decode; `response` is the error sentinel.
    Malformed {
        error: String,
        response: TransactionResponse,
    },
}

impl Inbound {
    /// The reply to write back.
    pub fn response(&self) -> &TransactionResponse {
        match self {
            Self::Processed { response, .. } | Self::Malformed { response, .. } => response,
        }
    }
}

/// Decode a request frame and produce the reply for it.
pub fn handle_inbound(body: &[u8], handler: &dyn RequestHandler) -> Inbound {
    match decode_request(body) {
        Ok(request) => {
            let response = handler.process(&request);
            Inbound::Processed { request, response }
        }
        Err(e) => Inbound::Malformed {
            error: e.to_string(),
            response: TransactionResponse::protocol_error(),
        },
    }
}
