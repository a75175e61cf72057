//! pinggrid Binary Entry Point
//!
//! Parses the command line, assembles the run configuration, and drives
//! the scheduler against the console sink. Core functionality is provided
//! by the `pinggrid` library crate.

use std::io::{BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::time::Duration;

use clap::{CommandFactory, Parser};
use pinggrid::{
    AppConfig, ConsoleSink, IcmpProber, Iterations, RunConfig, Scheduler,
    config::load_destinations,
};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// pinggrid - concurrent ping rounds as a growing latency table
#[derive(Parser, Debug)]
#[command(name = "pinggrid", version, about, long_about = None)]
struct Cli {
    /// Destinations to probe (IP address or hostname)
    addresses: Vec<String>,

    /// Number of probe rounds (overrides config file)
    #[arg(short, long)]
    iterations: Option<u32>,

    /// Keep probing until interrupted
    #[arg(short = 't', long)]
    forever: bool,

    /// Minimum milliseconds between round starts (overrides config file)
    #[arg(short = 's', long, value_name = "MS")]
    interval: Option<u64>,

    /// Read destinations from a file, one per line
    #[arg(short, long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Path to a YAML configuration file
    #[arg(short, long, env = "PINGGRID_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long)]
    plain: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing; logs go to stderr so the table stays pipe-clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // Load defaults from file, then apply CLI/env overrides (CLI > ENV > file)
    let defaults = match cli.config {
        Some(ref path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    let destinations = match cli.file {
        Some(ref path) => load_destinations(path)?,
        None => cli.addresses.clone(),
    };
    if destinations.is_empty() {
        Cli::command().print_help()?;
        return Ok(());
    }

    let iterations = if cli.forever {
        Iterations::Unbounded
    } else {
        Iterations::Count(cli.iterations.unwrap_or(defaults.iterations))
    };
    let interval = match cli.interval {
        Some(ms) => Duration::from_millis(ms),
        None => defaults.interval,
    };

    let config = RunConfig::new(destinations)
        .with_iterations(iterations)
        .with_interval(interval)
        .with_thresholds(defaults.thresholds);
    config.validate()?;

    let (stop_tx, stop_rx) = watch::channel(());
    tokio::spawn(watch_signals(stop_tx));

    let scheduler = Scheduler::new(IcmpProber::new());
    let mut sink = ConsoleSink::new(cli.plain);

    loop {
        tracing::info!(
            "Starting run: {} destinations, {}",
            config.destinations.len(),
            config.iterations
        );
        let summary = scheduler.run(&config, &mut sink, stop_rx.clone()).await?;
        tracing::info!(
            "Run complete: {} rounds in {:.1?}{}",
            summary.rounds,
            summary.elapsed,
            if summary.stopped { " (stopped)" } else { "" }
        );
        if summary.stopped || !prompt_restart()? {
            break;
        }
    }

    Ok(())
}

/// Offer a restart after a completed run. Skipped when stdin is not a
/// terminal.
fn prompt_restart() -> Result<bool, std::io::Error> {
    let stdin = std::io::stdin();
    if !stdin.is_terminal() {
        return Ok(false);
    }

    print!("Run again? [y/N] ");
    std::io::stdout().flush()?;

    let mut answer = String::new();
    stdin.lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y"))
}

/// Forward Ctrl+C or SIGTERM into the stop channel.
async fn watch_signals(stop_tx: watch::Sender<()>) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal");
        }
    }

    let _ = stop_tx.send(());
}
