//! PayLink wire protocol: peer-to-peer payment exchange over TCP.
//!
//! One Initiator sends a transaction request to one Responder and awaits the
//! correlated response. Each message is one JSON object per transport read;
//! a length-prefixed framing is available as an opt-in.
//!
//! ## Architecture
//!
//! - **FrameDecoder**: Splits a byte stream into message bodies
//! - **Connection**: One TCP stream, its writer, and its inbound event stream
//! - **InitiatorExchange**: One-request-at-a-time state machine for the Initiator
//! - **InitiatorLink**: The Initiator's single connection and its exchange driver
//! - **ResponderServer**: Listener plus one handler task per client
//! - **ClientRegistry**: Tracks the Responder's live clients
//! - **RequestHandler**: Trait for the kernel to decide inbound transactions

pub mod connection;
pub mod exchange;
pub mod link;
pub mod message;
pub mod registry;
pub mod server;

pub use connection::{Connection, ConnectionEvent, WireError};
pub use exchange::{ExchangeOutcome, ExchangeState, FrameDisposition, InitiatorExchange};
pub use link::{InitiatorLink, LinkConfig, LinkEvent, PendingResponse};
pub use message::{Decoded, FrameDecoder, MAX_FRAME_SIZE};
pub use registry::{ClientInfo, ClientRegistry};
pub use server::{RequestHandler, ResponderServer, ServerConfig, PROCESSED_LOG_CAPACITY};
