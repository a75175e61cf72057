//! pinggrid - Concurrent Ping Rounds as a Growing Latency Table
//!
//! This crate probes a set of destinations in rounds and renders the
//! results as an incrementally growing table: one row per round, one
//! column per destination. It can be used as a library, or run as the
//! `pinggrid` binary.
//!
//! # Architecture
//!
//! - **Probe**: one ICMP echo request per destination per round, behind
//!   the [`Prober`] trait so transports can be swapped in tests
//! - **ResultTable**: mutex-guarded round-by-destination grid, written by
//!   probe tasks and read by the renderer
//! - **Scheduler**: fans out a round of probes, waits for it to settle,
//!   and paces round starts by the configured interval net of round time
//! - **Renderer**: drains completed rows into styled presentation events,
//!   repeating the header every tenth row and carrying forward missing
//!   cells from the previous round
//!
//! # Example
//!
//! ```rust,ignore
//! use pinggrid::{ConsoleSink, IcmpProber, RunConfig, Scheduler};
//! use tokio::sync::watch;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RunConfig::new(vec!["8.8.8.8".into(), "1.1.1.1".into()]);
//!     config.validate()?;
//!
//!     let scheduler = Scheduler::new(IcmpProber::new());
//!     let mut sink = ConsoleSink::new(false);
//!     let (_stop_tx, stop_rx) = watch::channel(());
//!
//!     let summary = scheduler.run(&config, &mut sink, stop_rx).await?;
//!     println!("{} rounds in {:?}", summary.rounds, summary.elapsed);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod console;
pub mod probe;
pub mod render;
pub mod scheduler;
pub mod table;

pub use config::{AppConfig, ConfigError, Iterations, RunConfig, Thresholds};
pub use console::ConsoleSink;
pub use probe::{DEFAULT_PROBE_TIMEOUT, IcmpProber, Outcome, Prober};
pub use render::{Cell, CellValue, HEADER_EVERY, RenderEvent, RenderSink, Renderer, Style};
pub use scheduler::{RunSummary, Scheduler, SchedulerError};
pub use table::{ResultTable, TableWriter};
