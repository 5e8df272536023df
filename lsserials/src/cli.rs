//! Command line interface

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "lsserials")]
#[command(version)]
#[command(about = "List serial ports and the processes holding them open")]
#[command(long_about = "List serial ports and the processes holding them open

Ports are read from /dev using the serial drivers listed in
/proc/tty/drivers, grouped with their /dev/serial/by-id and by-path links.
A port is in use when some process has it among its open descriptors.
Without root, other users' processes cannot be inspected and results are
reported as uncertain.

EXIT CODES (single port check):
    0     port is free
    -1    port is in use
    -2    error
    -3    uncertain while --certain is given

ENVIRONMENT VARIABLES:
    RUST_LOG=debug         Enable debug logging

FILES:
    ~/.config/lsserials/settings.json      Settings")]
pub struct Cli {
    /// Check whether a single port is free
    #[arg(short = 'f', long = "free", value_name = "PORT")]
    pub port: Option<String>,

    /// Port is free only if that is certain
    #[arg(short, long)]
    pub certain: bool,

    /// Monitor serial port status by polling
    #[arg(short, long)]
    pub monitor: bool,

    /// Poll delay in milliseconds in monitor mode
    #[arg(short = 'p', long = "poll-interval", value_name = "MS")]
    pub poll_interval_ms: Option<u64>,

    /// Do not look up /dev/serial/by-id and by-path links
    #[arg(long)]
    pub no_serial_by: bool,

    /// Print snapshots and changes as JSON lines
    #[arg(long)]
    pub json: bool,

    /// Settings file to use instead of the default location
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}
