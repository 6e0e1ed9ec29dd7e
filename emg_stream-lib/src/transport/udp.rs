use std::net::{SocketAddr, UdpSocket};
use log::{debug, info};
use super::{PacketTransport, TransportError};

/// Connectionless transport: the whole packet goes out as one datagram.
///
/// The socket is bound once and reused, so every datagram leaves from the
/// same local port. Send failures are counted and otherwise ignored.
pub struct UdpTransport {
    socket: UdpSocket,
    remote: SocketAddr,
    sent: u64,
    dropped: u64,
}

impl UdpTransport {
    pub fn bind(local_port: u16, remote: SocketAddr) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(("0.0.0.0", local_port))
            .map_err(|source| TransportError::Bind { port: local_port, source })?;
        info!(
            "UDP transport bound to {:?}, streaming to {}",
            socket.local_addr().ok(),
            remote
        );
        Ok(Self { socket, remote, sent: 0, dropped: 0 })
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.local_addr().ok()
    }

    pub fn sent(&self) -> u64 {
        self.sent
    }

    /// Datagrams the network stack refused.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl PacketTransport for UdpTransport {
    fn send(&mut self, packet: &[u8]) -> Result<(), TransportError> {
        match self.socket.send_to(packet, self.remote) {
            Ok(_) => self.sent += 1,
            Err(e) => {
                // best effort: nothing reaches the acquisition loop
                self.dropped += 1;
                debug!("datagram to {} not sent: {}", self.remote, e);
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "udp"
    }
}
