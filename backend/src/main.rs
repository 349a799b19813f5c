//! `skillx` entry-point: loads settings, wires the selected backend and runs
//! one command.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::io;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use mockable::DefaultClock;
use tokio::runtime::Builder;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use skill_exchange::config::SkillExchangeSettings;
use skill_exchange::inbound::cli::{
    AppwriteBackend, BackendKind, CliArgs, CliBackend, CliContext, MemoryBackend, run,
};

fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let args = CliArgs::parse();
    let settings = SkillExchangeSettings::load().wrap_err("load settings")?;
    let backend: Box<dyn CliBackend> = match args.backend {
        BackendKind::Appwrite => Box::new(
            AppwriteBackend::from_settings(&settings).wrap_err("configure Appwrite backend")?,
        ),
        BackendKind::Memory => Box::new(MemoryBackend::new(Arc::new(DefaultClock))),
    };

    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .wrap_err("create Tokio runtime")?;
    let context = CliContext::new(backend.as_ref(), settings.login_policy());
    let mut stdout = io::stdout().lock();
    runtime
        .block_on(run(&args.command, &context, &mut stdout))
        .wrap_err("command failed")?;
    Ok(())
}
