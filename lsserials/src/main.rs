//! lsserials
//!
//! Lists serial ports and the processes holding them open, checks a single
//! port before opening it, or monitors ports for changes by polling.

mod check;
mod cli;
mod monitor;
mod report;
mod settings;

use std::io::{self, Write};

use clap::Parser;
use serial_usage::{Host, PortProber, StdFilesystem};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use check::{Verdict, EXIT_ERROR};
use cli::Cli;
use monitor::Monitor;
use settings::Settings;

fn main() {
    // Logs go to stderr, stdout carries the report
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lsserials=warn,serial_usage=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let code = match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::debug!("{:?}", e);
            println!("{e:#}");
            EXIT_ERROR
        }
    };
    std::process::exit(code);
}

fn run(cli: &Cli) -> anyhow::Result<i32> {
    let settings = Settings::resolve(cli)?;
    let prober = PortProber::new(Host::with_filesystem(
        settings.layout.clone(),
        StdFilesystem,
    ));
    let mut out = io::stdout().lock();

    if let Some(port) = &cli.port {
        let usage = prober.file_is_in_use(port)?;
        let verdict = Verdict::from_usage(&usage, settings.require_certain);
        writeln!(out, "{}", verdict.message(port))?;
        return Ok(verdict.exit_code());
    }

    let snapshot = prober.probe(settings.check_serial_by)?;
    report::print_snapshot(&mut out, &snapshot, cli.json)?;
    out.flush()?;

    if !cli.monitor {
        return Ok(0);
    }

    tracing::info!("Monitoring every {:?}", settings.poll_interval());
    Monitor::new(&prober, settings.check_serial_by, snapshot).run(
        settings.poll_interval(),
        &mut out,
        cli.json,
    )?;
    Ok(0)
}
