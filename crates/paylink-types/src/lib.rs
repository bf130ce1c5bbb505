//! Core types for the PayLink peer payment exchange.
//!
//! This crate defines the data model shared by the wire protocol, discovery
//! and kernel crates: transaction messages, peer descriptors, connection
//! state, configuration, and the bounded logs every component writes to.
//! It contains no networking.

pub mod activity;
pub mod config;
pub mod connection;
pub mod error;
pub mod peer;
pub mod ring;
pub mod transaction;

/// Current wall-clock time as epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
