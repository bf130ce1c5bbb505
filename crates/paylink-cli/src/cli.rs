//! Clap CLI definitions for PayLink.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub const AFTER_HELP: &str = "\
\x1b[1;36mExamples:\x1b[0m
  paylink respond                       Accept payments on port 8080
  paylink respond --port 0              Accept payments on any free port
  paylink scan                          List payment devices on the network
  paylink pay --amount 100              Pay the first device found
  paylink pay --amount 25 --addr 192.168.1.20:8080
                                        Pay a device at a known address
  paylink config --init                 Write the default config file";

/// PayLink: peer-to-peer payment authorization on the local network.
#[derive(Parser)]
#[command(
    name = "paylink",
    version,
    about = "PayLink \u{00b7} peer-to-peer payment authorization",
    after_help = AFTER_HELP,
)]
pub struct Cli {
    /// Path to config file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a Responder: advertise, accept payments, and decide them.
    Respond {
        /// Port to listen on (0 picks a free port).
        #[arg(long, short = 'p')]
        port: Option<u16>,
        /// Advertised service instance name.
        #[arg(long, short = 'n')]
        name: Option<String>,
        /// Interface to bind.
        #[arg(long)]
        bind: Option<String>,
    },
    /// Browse for Responders and list them.
    Scan {
        /// Seconds to browse before listing.
        #[arg(long, short = 'w', default_value_t = 5)]
        wait: u64,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Send one payment and print the outcome.
    Pay {
        /// Amount; non-numeric text is sent as 0.
        #[arg(long, short = 'a')]
        amount: String,
        /// Payment description.
        #[arg(long, short = 'd', default_value = "Test payment")]
        description: String,
        /// Pay the discovered device with this name.
        #[arg(long, conflicts_with = "addr")]
        peer: Option<String>,
        /// Skip discovery and connect to host:port.
        #[arg(long)]
        addr: Option<String>,
        /// Seconds to wait for discovery.
        #[arg(long, short = 'w', default_value_t = 5)]
        wait: u64,
    },
    /// Show the effective configuration.
    Config {
        /// Write the default config file if none exists.
        #[arg(long)]
        init: bool,
    },
}
