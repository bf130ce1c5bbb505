//! Command implementations.

pub mod config;
pub mod pay;
pub mod respond;
pub mod scan;

use crate::ui;

/// Build the tokio runtime a command runs on, or exit.
pub(crate) fn runtime() -> tokio::runtime::Runtime {
    match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            ui::error(&format!("Failed to start async runtime: {e}"));
            std::process::exit(1);
        }
    }
}
