use std::io::Write;
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;
use log::{debug, trace};
use super::{PacketTransport, TransportError};

/// Connection-oriented transport: one TCP connection and one POST per packet.
///
/// Headers and body are written synchronously, then the socket is closed
/// without reading a response. A connect failure abandons the packet after
/// a single attempt.
pub struct HttpTransport {
    host: String,
    port: u16,
    path: String,
    connect_timeout: Option<Duration>,
    attempts: u64,
}

impl HttpTransport {
    pub fn new(host: impl Into<String>, port: u16, path: impl Into<String>) -> Self {
        let mut path = path.into();
        if !path.starts_with('/') {
            path.insert(0, '/');
        }
        Self {
            host: host.into(),
            port,
            path,
            connect_timeout: None,
            attempts: 0,
        }
    }

    /// Bound the connect phase; without it the OS default applies.
    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Connection attempts made so far (one per packet, never more).
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    pub fn endpoint(&self) -> String {
        format!("{}:{}{}", self.host, self.port, self.path)
    }

    /// `Host` header value; the port is omitted only when it is 80.
    fn host_header(&self) -> String {
        if self.port == 80 {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Request head for a body of `body_len` bytes.
    pub fn request_head(&self, body_len: usize) -> String {
        format!(
            "POST {} HTTP/1.1\r\n\
             Host: {}\r\n\
             Content-Type: application/octet-stream\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n\
             \r\n",
            self.path,
            self.host_header(),
            body_len
        )
    }

    fn connect(&self) -> Result<TcpStream, TransportError> {
        let addr = format!("{}:{}", self.host, self.port);
        match self.connect_timeout {
            None => TcpStream::connect(&addr)
                .map_err(|source| TransportError::Connect { addr, source }),
            Some(timeout) => {
                let target: SocketAddr = addr
                    .to_socket_addrs()
                    .ok()
                    .and_then(|mut addrs| addrs.next())
                    .ok_or_else(|| TransportError::Resolve(addr.clone()))?;
                TcpStream::connect_timeout(&target, timeout)
                    .map_err(|source| TransportError::Connect { addr, source })
            }
        }
    }
}

impl PacketTransport for HttpTransport {
    fn send(&mut self, packet: &[u8]) -> Result<(), TransportError> {
        self.attempts += 1;
        let mut stream = self.connect()?;
        trace!("connected to {}", self.endpoint());

        stream.write_all(self.request_head(packet.len()).as_bytes())?;
        stream.write_all(packet)?;
        stream.flush()?;

        // no keep-alive: close regardless of what the server would answer
        if let Err(e) = stream.shutdown(Shutdown::Both) {
            debug!("shutdown after POST to {}: {}", self.endpoint(), e);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn head_carries_binary_content_headers() {
        let transport = HttpTransport::new("192.168.1.50", 8080, "data");
        let head = transport.request_head(512);
        assert!(head.starts_with("POST /data HTTP/1.1\r\n"));
        assert!(head.contains("Host: 192.168.1.50:8080\r\n"));
        assert!(head.contains("Content-Type: application/octet-stream\r\n"));
        assert!(head.contains("Content-Length: 512\r\n"));
        assert!(head.ends_with("\r\n\r\n"));
    }

    #[test]
    fn host_header_omits_default_port_only() {
        let default_port = HttpTransport::new("emg-receiver.local", 80, "/data");
        assert!(default_port.request_head(2).contains("Host: emg-receiver.local\r\n"));

        let other_port = HttpTransport::new("emg-receiver.local", 3030, "/data");
        assert!(other_port.request_head(2).contains("Host: emg-receiver.local:3030\r\n"));
    }

    #[test]
    fn posts_exact_body_then_closes() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = thread::spawn(move || {
            let (mut conn, _) = listener.accept().unwrap();
            let mut raw = Vec::new();
            // read_to_end returns only once the client closed its side
            conn.read_to_end(&mut raw).unwrap();
            raw
        });

        let body: Vec<u8> = (0..512u32).map(|i| (i * 7) as u8).collect();
        let mut transport = HttpTransport::new("127.0.0.1", port, "/data");
        transport.send(&body).unwrap();

        let raw = server.join().unwrap();
        let split = raw.windows(4).position(|w| w == b"\r\n\r\n").unwrap() + 4;
        let head = String::from_utf8_lossy(&raw[..split]);
        assert!(head.contains("Content-Length: 512"));
        assert_eq!(&raw[split..], &body[..]);
        assert_eq!(transport.attempts(), 1);
    }

    #[test]
    fn refused_connection_is_one_attempt() {
        // grab a free port, then release it so nothing is listening
        let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
        let mut transport = HttpTransport::new("127.0.0.1", port, "/data")
            .with_connect_timeout(Some(Duration::from_millis(500)));

        let err = transport.send(&[0u8; 512]).unwrap_err();
        assert!(matches!(err, TransportError::Connect { .. }));
        assert_eq!(transport.attempts(), 1);
    }
}
