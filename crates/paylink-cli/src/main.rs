//! PayLink CLI: run a Responder or act as an Initiator from the terminal.
//!
//! Every command runs in-process: `respond` serves until Ctrl+C, the other
//! commands do one thing and exit.

mod cli;
mod cmd;
mod ui;

use crate::cli::*;
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{reload, EnvFilter};

/// Handle for swapping the log filter once the config is loaded.
type FilterHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

/// Trace to stderr. `RUST_LOG` wins; otherwise start at `info` until the
/// configured level is known.
fn init_tracing_stderr() -> Option<FilterHandle> {
    let from_env = EnvFilter::try_from_default_env().ok();
    let env_set = from_env.is_some();
    let (filter, handle) = reload::Layer::new(from_env.unwrap_or_else(|| EnvFilter::new("info")));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    (!env_set).then_some(handle)
}

fn main() {
    let cli = Cli::parse();

    let filter = init_tracing_stderr();
    let config = paylink_kernel::config::load_config(cli.config.as_deref());
    if let Some(handle) = filter {
        if let Err(e) = handle.reload(EnvFilter::new(&config.log_level)) {
            tracing::warn!("Failed to apply log_level '{}': {e}", config.log_level);
        }
    }

    match cli.command {
        Commands::Respond { port, name, bind } => cmd::respond::cmd_respond(config, port, name, bind),
        Commands::Scan { wait, json } => cmd::scan::cmd_scan(config, wait, json),
        Commands::Pay {
            amount,
            description,
            peer,
            addr,
            wait,
        } => cmd::pay::cmd_pay(config, &amount, &description, peer.as_deref(), addr.as_deref(), wait),
        Commands::Config { init } => cmd::config::cmd_config(&config, cli.config.as_deref(), init),
    }
}
