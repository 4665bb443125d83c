mod args;

use std::{io, process::ExitCode};

use anyhow::{Context as _, Result};
use args::Args;
use clap::Parser as _;
use co2meter::{device::open_hidraw, poll::PollingDriver, report::Reporter};
use tokio::{
    signal::unix::{SignalKind, signal},
    time::Duration,
};

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run().await {
        log::error!("{e:#}");
        return ExitCode::from(1);
    }

    ExitCode::from(0)
}

async fn run() -> Result<()> {
    let args = Args::parse();
    log::info!("arguments: {args:?}");

    let source = open_hidraw(&args.device)
        .await
        .context("failed to open CO2 meter")?;

    let reporter = Reporter::new(io::stdout(), args.format, args.timezone);
    let interval = Duration::from_secs(args.interval.get());

    let mut sigint = signal(SignalKind::interrupt()).context("failed to install SIGINT handler")?;
    let mut sigterm =
        signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;
    let shutdown = async move {
        tokio::select! {
            _ = sigint.recv() => log::info!("received SIGINT"),
            _ = sigterm.recv() => log::info!("received SIGTERM"),
        }
    };

    PollingDriver::new(source, reporter, interval)
        .run(shutdown)
        .await
        .with_context(|| format!("polling {} failed", args.device.display()))
}
