//! ICMP echo probing.
//!
//! One probe sends a single echo request and reports the round-trip time.
//! Every failure mode (resolution, socket setup, error reply, timeout)
//! collapses into a failed outcome rather than an error return.

use std::net::IpAddr;
use std::time::Duration;

use surge_ping::{Client, Config, ICMP, PingIdentifier, PingSequence};
use tokio::time::timeout;

/// Per-probe timeout (15 seconds).
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(15);

/// Result of a single echo probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A reply arrived within the timeout.
    Reply {
        /// Measured round-trip time.
        rtt: Duration,
    },
    /// No usable reply: resolution failure, error status, or timeout.
    Failed,
}

impl Outcome {
    /// Round-trip time of a successful probe.
    pub fn rtt(&self) -> Option<Duration> {
        match self {
            Self::Reply { rtt } => Some(*rtt),
            Self::Failed => None,
        }
    }

    /// Whether the probe failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }
}

/// A single-shot latency probe.
///
/// Implementations send one request per call, answer within `timeout`, and
/// report failure as [`Outcome::Failed`] instead of returning an error.
#[async_trait::async_trait]
pub trait Prober: Send + Sync + 'static {
    /// Probe `destination` once, waiting at most `timeout` for a reply.
    async fn probe(&self, destination: &str, timeout: Duration) -> Outcome;
}

/// Resolve hostname to IP address.
async fn resolve_host(host: &str) -> Result<IpAddr, std::io::Error> {
    // First, try to parse as an IP address directly
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(ip);
    }

    // Otherwise, resolve the hostname using tokio's DNS lookup
    let addrs = tokio::net::lookup_host(format!("{host}:0")).await?;
    addrs
        .into_iter()
        .next()
        .map(|addr| addr.ip())
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses found"))
}

/// ICMP echo prober backed by `surge-ping`.
///
/// Each probe resolves its destination and opens its own ICMP socket, so
/// concurrent probes never share transport state. Requires raw-socket
/// privileges (or a `ping_group_range` covering the process on Linux).
#[derive(Debug, Clone, Copy, Default)]
pub struct IcmpProber;

impl IcmpProber {
    /// Create a new ICMP prober.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Prober for IcmpProber {
    async fn probe(&self, destination: &str, probe_timeout: Duration) -> Outcome {
        // Resolve hostname to IP address
        let ip_addr = match resolve_host(destination).await {
            Ok(ip) => ip,
            Err(e) => {
                tracing::warn!(
                    %destination,
                    error = %e,
                    "Failed to resolve destination"
                );
                return Outcome::Failed;
            }
        };

        // Create ICMP client based on IP version
        let client = match ip_addr {
            IpAddr::V4(_) => Client::new(&Config::default()),
            IpAddr::V6(_) => Client::new(&Config::builder().kind(ICMP::V6).build()),
        };

        let client = match client {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(
                    %destination,
                    error = %e,
                    "Failed to create ICMP client"
                );
                return Outcome::Failed;
            }
        };

        let mut pinger = client.pinger(ip_addr, PingIdentifier(rand::random())).await;
        pinger.timeout(probe_timeout);

        match timeout(probe_timeout, pinger.ping(PingSequence(0), &[])).await {
            Ok(Ok((_, rtt))) => {
                tracing::debug!(
                    %destination,
                    latency_ms = rtt.as_secs_f64() * 1000.0,
                    "Echo reply received"
                );
                Outcome::Reply { rtt }
            }
            Ok(Err(e)) => {
                tracing::warn!(
                    %destination,
                    error = %e,
                    "Echo probe failed"
                );
                Outcome::Failed
            }
            Err(_) => {
                tracing::warn!(
                    %destination,
                    timeout_ms = probe_timeout.as_millis(),
                    "Echo probe timed out"
                );
                Outcome::Failed
            }
        }
    }
}
