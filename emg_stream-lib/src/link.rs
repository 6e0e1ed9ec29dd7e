use std::net::{IpAddr, ToSocketAddrs, UdpSocket};
use std::thread::sleep;
use std::time::Duration;
use log::{error, info, warn};
use thiserror::Error;

/// Delay between association attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("no network hardware present")]
    NoHardware,

    #[error("association with '{ssid}' failed: {reason}")]
    Association { ssid: String, reason: String },
}

/// Wireless network credentials.
#[derive(Clone, Default)]
pub struct Credentials {
    pub ssid: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("ssid", &self.ssid)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// The network interface as seen at boot.
pub trait NetworkLink {
    fn hardware_present(&mut self) -> bool;

    fn associate(&mut self, credentials: &Credentials) -> Result<(), LinkError>;

    fn local_addr(&self) -> Option<IpAddr>;
}

/// Bring the link up before acquisition starts.
///
/// Missing hardware is fatal and returned immediately. Association failures
/// are retried every `retry_delay` until one succeeds.
pub fn bring_up<L: NetworkLink>(
    link: &mut L,
    credentials: &Credentials,
    retry_delay: Duration,
) -> Result<u32, LinkError> {
    if !link.hardware_present() {
        return Err(LinkError::NoHardware);
    }

    info!("Associating with '{}'", credentials.ssid);
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        match link.associate(credentials) {
            Ok(()) => {
                info!(
                    "Link up after {} attempt(s), local address {:?}",
                    attempts,
                    link.local_addr()
                );
                return Ok(attempts);
            }
            Err(e) => {
                warn!("{}; retrying in {:?}", e, retry_delay);
                sleep(retry_delay);
            }
        }
    }
}

/// Unrecoverable idle state; the device does nothing further.
pub fn halt(reason: &LinkError) -> ! {
    error!("Halting: {}", reason);
    loop {
        std::thread::park();
    }
}

/// Host network stack standing in for the radio.
///
/// Association means the OS can route to the configured receiver, which is
/// the closest a desktop gets to "joined the access point".
pub struct HostLink {
    target: String,
    local: Option<IpAddr>,
}

impl HostLink {
    /// `target` is the receiver as `host:port`; it is resolved on every attempt.
    pub fn new(target: impl Into<String>) -> Self {
        Self { target: target.into(), local: None }
    }
}

impl NetworkLink for HostLink {
    fn hardware_present(&mut self) -> bool {
        UdpSocket::bind("0.0.0.0:0").is_ok()
    }

    fn associate(&mut self, credentials: &Credentials) -> Result<(), LinkError> {
        let fail = |reason: String| LinkError::Association {
            ssid: credentials.ssid.clone(),
            reason,
        };
        let remote = self
            .target
            .to_socket_addrs()
            .map_err(|e| fail(e.to_string()))?
            .next()
            .ok_or_else(|| fail(format!("{} did not resolve", self.target)))?;
        let socket = UdpSocket::bind("0.0.0.0:0").map_err(|e| fail(e.to_string()))?;
        socket.connect(remote).map_err(|e| fail(e.to_string()))?;
        let local = socket.local_addr().map_err(|e| fail(e.to_string()))?;
        self.local = Some(local.ip());
        Ok(())
    }

    fn local_addr(&self) -> Option<IpAddr> {
        self.local
    }
}
