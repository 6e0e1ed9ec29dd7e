//! Delivery of full packets to the receiver.
//!
//! Two interchangeable strategies share [`PacketTransport`]:
//! - [`udp::UdpTransport`]   — one datagram per packet, fire-and-forget
//! - [`http::HttpTransport`] — one short-lived connection and POST per packet
//!
//! Neither retries. The acquisition loop only sees the trait.

pub mod http;
pub mod udp;

use std::str::FromStr;
use thiserror::Error;

pub use http::HttpTransport;
pub use udp::UdpTransport;

/// Errors returned by a single transmission attempt.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("could not bind local port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("could not resolve {0}")]
    Resolve(String),

    #[error("connection to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("write failed: {0}")]
    Write(#[from] std::io::Error),
}

/// Sends one complete packet; blocks until the attempt is over.
pub trait PacketTransport {
    fn send(&mut self, packet: &[u8]) -> Result<(), TransportError>;

    /// Short label for log lines.
    fn name(&self) -> &'static str;
}

impl<T: PacketTransport + ?Sized> PacketTransport for Box<T> {
    fn send(&mut self, packet: &[u8]) -> Result<(), TransportError> {
        (**self).send(packet)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Which strategy a node streams with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Udp,
    Http,
}

impl FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "udp" | "datagram" => Ok(TransportKind::Udp),
            "http" | "tcp" => Ok(TransportKind::Http),
            other => Err(format!("unknown transport '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_transport_kind() {
        assert_eq!("UDP".parse::<TransportKind>(), Ok(TransportKind::Udp));
        assert_eq!(" http ".parse::<TransportKind>(), Ok(TransportKind::Http));
        assert!("serial".parse::<TransportKind>().is_err());
    }
}
