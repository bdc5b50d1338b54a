mod config;

use std::{process::ExitCode, time::Instant};

use anyhow::Context;
use clap::Parser;
use tracing::info;

use ahs_aws::{Ec2Connector, ImdsClient};
use ahs_core::prelude::{Collaborators, LocalHost, Outcome, ensure_root, run};
use ahs_observe::{init_local_offset, init_logger};
use config::{AppConfig, CliArgs};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let started = Instant::now();
    init_local_offset();

    let args = CliArgs::parse();
    match start(args, started).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ahs: {}", error_line(&e));
            ExitCode::FAILURE
        }
    }
}

async fn start(args: CliArgs, started: Instant) -> anyhow::Result<Outcome> {
    // 1) config + logger
    let cfg = AppConfig::try_from(args)?;
    init_logger(&cfg.logger)?;
    info!(strategy = cfg.run.strategy.name(), dry_run = cfg.run.dry_run, "starting");

    // 2) privileges
    ensure_root()?;

    // 3) collaborators
    let imds = ImdsClient::new(cfg.metadata_endpoint.as_str())
        .context("cannot build metadata client")?;
    let connector = Ec2Connector::new(&imds);
    let host = LocalHost::new();
    let deps = Collaborators {
        metadata: &imds,
        connector: &connector,
        host: &host,
    };

    // 4) run
    let outcome = run(&cfg.run, deps, started).await?;
    info!(
        hostname = %outcome.hostname,
        instance_id = %outcome.identity.instance_id,
        applied = outcome.applied,
        "done"
    );
    Ok(outcome)
}

/// Error chain rendered on a single line, whatever the remote services answered.
fn error_line(err: &anyhow::Error) -> String {
    format!("{err:#}")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
