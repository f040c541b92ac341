use std::future::Future;
use std::io;
use std::net::IpAddr;
use std::process::Stdio;
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;

use hickory_resolver::config::ResolverConfig;
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::TokioResolver;
use surge_ping::{Client as PingClient, Config as PingConfig, PingIdentifier, PingSequence, SurgeError, ICMP};
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Extra time a spawned `ping` gets on top of its own timeout to exit.
const PROCESS_GRACE: Duration = Duration::from_millis(500);

/// The probe could not be carried out at all. Unreachable hosts are never faults.
#[derive(Debug, Error)]
pub enum ProbeFault {
    #[error("cannot run `{tool}`: {source}")]
    Unavailable { tool: String, source: io::Error },

    #[error("ICMP socket error: {0}")]
    Socket(io::Error),

    #[error("no ICMPv6 socket available")]
    NoIpv6Socket,
}

/// A bounded-time reachability check.
///
/// `Ok(false)` covers timeouts, unreachable and unresolvable hosts. `Err` is
/// reserved for a broken probing capability (missing tool, refused socket).
pub trait Prober: Send + Sync {
    fn probe(&self, target: &str) -> impl Future<Output = Result<bool, ProbeFault>> + Send;
}

/// Native ICMP echo over surge-ping.
pub struct IcmpProber {
    v4: PingClient,
    v6: Option<PingClient>,
    resolver: TokioResolver,
    timeout: Duration,
    // Unprivileged DGRAM sockets match replies on (ip, seq) only, so
    // concurrent echoes to one address need distinct sequence numbers.
    sequence: AtomicU16,
}

impl IcmpProber {
    pub fn new(timeout: Duration) -> io::Result<Self> {
        let v4 = PingClient::new(&PingConfig::default())?;
        let v6 = match PingClient::new(&PingConfig::builder().kind(ICMP::V6).build()) {
            Ok(client) => Some(client),
            Err(e) => {
                debug!("ICMPv6 client unavailable: {}", e);
                None
            }
        };

        let resolver = match TokioResolver::builder_tokio() {
            Ok(builder) => builder.build(),
            Err(e) => {
                warn!("System resolver config unreadable ({}), using Cloudflare 1.1.1.1", e);
                TokioResolver::builder_with_config(
                    ResolverConfig::cloudflare(),
                    TokioConnectionProvider::default(),
                )
                .build()
            }
        };

        Ok(Self {
            v4,
            v6,
            resolver,
            timeout,
            sequence: AtomicU16::new(0),
        })
    }

    async fn resolve(&self, address: &str) -> Option<IpAddr> {
        if let Ok(ip) = address.parse::<IpAddr>() {
            return Some(ip);
        }
        match self.resolver.lookup_ip(address).await {
            Ok(lookup) => lookup.iter().next(),
            Err(e) => {
                debug!("Resolution of {} failed: {}", address, e);
                None
            }
        }
    }

    async fn echo(&self, target: &str) -> Result<bool, ProbeFault> {
        let Some(ip) = self.resolve(target).await else {
            return Ok(false);
        };

        let client = match ip {
            IpAddr::V4(_) => &self.v4,
            IpAddr::V6(_) => self.v6.as_ref().ok_or(ProbeFault::NoIpv6Socket)?,
        };

        let payload = [0u8; 56];
        let mut pinger = client.pinger(ip, PingIdentifier(rand::random())).await;
        pinger.timeout(self.timeout);

        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        match pinger.ping(PingSequence(seq), &payload).await {
            Ok((_, latency)) => {
                debug!("{} answered in {:.1}ms", target, latency.as_secs_f64() * 1000.0);
                Ok(true)
            }
            Err(SurgeError::IOError(e)) if e.kind() == io::ErrorKind::PermissionDenied => {
                Err(ProbeFault::Socket(e))
            }
            Err(e) => {
                debug!("{} did not answer: {}", target, e);
                Ok(false)
            }
        }
    }
}

impl Prober for IcmpProber {
    async fn probe(&self, target: &str) -> Result<bool, ProbeFault> {
        // Resolution counts against the same budget as the echo itself.
        match tokio::time::timeout(self.timeout, self.echo(target)).await {
            Ok(result) => result,
            Err(_) => Ok(false),
        }
    }
}

/// Shells out to the platform `ping` utility for a single echo request.
pub struct CommandProber {
    program: String,
    timeout: Duration,
}

impl CommandProber {
    pub fn new(timeout: Duration) -> Self {
        Self {
            program: "ping".into(),
            timeout,
        }
    }

    #[cfg(test)]
    fn with_program(program: &str, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    fn command(&self, target: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(ping_args(self.timeout)).arg(target);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        cmd
    }
}

#[cfg(windows)]
fn ping_args(timeout: Duration) -> Vec<String> {
    vec!["-n".into(), "1".into(), "-w".into(), timeout.as_millis().max(1).to_string()]
}

#[cfg(target_os = "macos")]
fn ping_args(timeout: Duration) -> Vec<String> {
    let secs = timeout.as_secs().max(1).to_string();
    vec!["-c".into(), "1".into(), "-t".into(), secs, "--".into()]
}

#[cfg(not(any(windows, target_os = "macos")))]
fn ping_args(timeout: Duration) -> Vec<String> {
    let secs = timeout.as_secs().max(1).to_string();
    vec!["-c".into(), "1".into(), "-W".into(), secs, "--".into()]
}

impl Prober for CommandProber {
    async fn probe(&self, target: &str) -> Result<bool, ProbeFault> {
        let mut child = self
            .command(target)
            .spawn()
            .map_err(|source| ProbeFault::Unavailable {
                tool: self.program.clone(),
                source,
            })?;

        match tokio::time::timeout(self.timeout + PROCESS_GRACE, child.wait()).await {
            Ok(Ok(status)) => Ok(status.success()),
            Ok(Err(e)) => {
                debug!("Waiting on ping for {} failed: {}", target, e);
                Ok(false)
            }
            // `kill_on_drop` reaps the straggler
            Err(_) => Ok(false),
        }
    }
}

/// The prober picked at startup.
pub enum HostProber {
    Icmp(IcmpProber),
    Command(CommandProber),
}

impl HostProber {
    /// Prefers native ICMP sockets and falls back to the system `ping` when the
    /// process is not allowed to open them.
    pub fn detect(timeout: Duration) -> Self {
        match IcmpProber::new(timeout) {
            Ok(prober) => {
                info!("Probing with native ICMP sockets");
                HostProber::Icmp(prober)
            }
            Err(e) => {
                warn!("ICMP socket unavailable ({}), falling back to system ping", e);
                HostProber::Command(CommandProber::new(timeout))
            }
        }
    }
}

impl Prober for HostProber {
    async fn probe(&self, target: &str) -> Result<bool, ProbeFault> {
        match self {
            HostProber::Icmp(p) => p.probe(target).await,
            HostProber::Command(p) => p.probe(target).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_args_send_a_single_request() {
        let args = ping_args(Duration::from_secs(1));
        assert!(args.windows(2).any(|w| w == ["-c", "1"] || w == ["-n", "1"]));
    }

    #[cfg(not(any(windows, target_os = "macos")))]
    #[test]
    fn ping_args_round_sub_second_timeouts_up() {
        let args = ping_args(Duration::from_millis(200));
        assert_eq!(args, ["-c", "1", "-W", "1", "--"]);
    }

    #[tokio::test]
    async fn missing_tool_is_a_fault_not_offline() {
        let prober = CommandProber::with_program("pings-no-such-binary", Duration::from_secs(1));
        let err = prober.probe("gateway").await.unwrap_err();
        assert!(matches!(err, ProbeFault::Unavailable { .. }));
        assert!(err.to_string().starts_with("cannot run `pings-no-such-binary`"));
    }

    #[test]
    fn target_is_the_last_argument() {
        let prober = CommandProber::new(Duration::from_secs(1));
        let cmd = prober.command("gateway");
        let args: Vec<_> = cmd.as_std().get_args().collect();
        assert_eq!(args.last().and_then(|a| a.to_str()), Some("gateway"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn exit_status_decides_reachability() {
        let up = CommandProber::with_program("true", Duration::from_secs(1));
        assert!(up.probe("gateway").await.unwrap());

        let down = CommandProber::with_program("false", Duration::from_secs(1));
        assert!(!down.probe("gateway").await.unwrap());
    }

    fn icmp_prober() -> Option<IcmpProber> {
        match IcmpProber::new(Duration::from_secs(1)) {
            Ok(prober) => Some(prober),
            Err(e) => {
                eprintln!("skipping, ICMP socket unavailable: {e}");
                None
            }
        }
    }

    #[tokio::test]
    async fn concurrent_echoes_to_one_address_both_answer() {
        let Some(prober) = icmp_prober() else { return };

        let (first, second) = tokio::join!(prober.probe("127.0.0.1"), prober.probe("127.0.0.1"));
        assert!(first.unwrap());
        assert!(second.unwrap());
    }

    #[tokio::test]
    async fn unresolvable_name_is_offline_within_budget() {
        let Some(prober) = icmp_prober() else { return };

        let start = std::time::Instant::now();
        assert!(!prober.probe("no-such-host.invalid").await.unwrap());
        assert!(start.elapsed() < Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn unrouted_address_times_out_as_offline() {
        let Some(prober) = icmp_prober() else { return };

        // TEST-NET-1, never routed
        let start = std::time::Instant::now();
        assert!(!prober.probe("192.0.2.1").await.unwrap());
        assert!(start.elapsed() < Duration::from_millis(1500));
    }
}
