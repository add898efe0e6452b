//! `inio`: calibrate an Inio lamp and drive it through its estimated state.

mod cli;
mod commands;
mod error_fmt;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::{Result, WrapErr};
use inio_traits::PowerReading;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    let _ = color_eyre::install();
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(e) = run(cli) {
        tracing::error!(error = %format!("{e:#}"), "command failed");
        if JSON_MODE.get().copied().unwrap_or(false) {
            println!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        std::process::exit(exit_code_for_error(&e));
    }
}

fn run(cli: Cli) -> Result<()> {
    let cfg = inio_config::load_file(&cli.config)?;
    cfg.validate()
        .wrap_err_with(|| format!("invalid configuration in {}", cli.config.display()))?;
    init_tracing(&cli, &cfg.logging)?;
    tracing::debug!(config = %cli.config.display(), backend = ?cfg.device.backend, "config loaded");

    match cli.cmd {
        Commands::Calibrate { snapshot } => {
            let shutdown = Arc::new(AtomicBool::new(false));
            let flag = Arc::clone(&shutdown);
            if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
                tracing::warn!(error = %e, "could not install Ctrl-C handler; interrupting will lose the current row");
            }
            commands::run_calibrate(&cfg, snapshot.as_deref(), cli.json, shutdown)
        }
        Commands::Compact { snapshot } => {
            commands::run_compact(&cfg, snapshot.as_deref(), cli.json)
        }
        Commands::Estimate {
            cold,
            warm,
            snapshot,
        } => commands::run_estimate(
            &cfg,
            snapshot.as_deref(),
            PowerReading::new(cold, warm),
            cli.json,
        ),
        Commands::Read => commands::run_read(&cfg, cli.json),
        Commands::Verify { trials, seed } => commands::run_verify(&cfg, trials, seed, cli.json),
        Commands::Get { what } => commands::run_get(&cfg, what, cli.json),
        Commands::Set { what, value } => commands::run_set(&cfg, what, &value, cli.json),
        Commands::SelfCheck => commands::self_check(&cfg, cli.json),
    }
}

/// Console logs go to stderr (pretty or JSON); an optional JSON-lines file
/// log is added from `[logging]`. `RUST_LOG` overrides `--log-level`.
fn init_tracing(cli: &Cli, logging: &inio_config::Logging) -> Result<()> {
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    if cli.json {
        layers.push(
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_filter(console_filter)
                .boxed(),
        );
    } else {
        layers.push(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_filter(console_filter)
                .boxed(),
        );
    }

    if let Some(file) = logging.file.as_deref() {
        let path = Path::new(file);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .ok_or_else(|| eyre::eyre!("logging.file must name a file, got {file}"))?;
        let appender = match logging.rotation.as_deref().unwrap_or("never") {
            "daily" => tracing_appender::rolling::daily(dir, name),
            "hourly" => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        let level = logging.level.as_deref().unwrap_or("info");
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(EnvFilter::new(level))
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|e| eyre::eyre!("init logging: {e}"))
}
