//! PayLink kernel: the Initiator and Responder roles.
//!
//! Ties discovery, the wire exchange and the transaction processor together
//! behind command/projection façades that a presentation layer drives.

pub mod config;
pub mod error;
pub mod event_bus;
pub mod initiator;
pub mod processor;
pub mod responder;

pub use error::{KernelError, KernelResult};
pub use event_bus::{EventBus, KernelEvent};
pub use initiator::Initiator;
pub use processor::{ApprovalPolicy, FixedApproval, RandomApproval, TransactionProcessor};
pub use responder::Responder;
