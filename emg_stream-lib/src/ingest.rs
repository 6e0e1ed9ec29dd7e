use std::fs::File;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use chrono::Utc;
use log::{debug, error, info, warn};
use tokio::net::UdpSocket;
use crate::codec::{decode_exact, DecodeError, StreamMonitor};
use crate::context::Context;
use crate::message::{Message, Source};
use crate::recorder::CsvRecorder;

/// Decodes incoming packets from either transport and broadcasts them.
pub struct Ingest {
    ctx: Context,
    monitor: StreamMonitor,
    recorder: Option<CsvRecorder<File>>,
    malformed: u64,
}

/// Handle shared by the UDP listener and the HTTP route.
pub type SharedIngest = Arc<Mutex<Ingest>>;

impl Ingest {
    pub fn new(ctx: Context, monitor: StreamMonitor) -> Self {
        Self { ctx, monitor, recorder: None, malformed: 0 }
    }

    pub fn with_recorder(mut self, recorder: CsvRecorder<File>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn shared(self) -> SharedIngest {
        Arc::new(Mutex::new(self))
    }

    /// Handle one packet body; returns the decoded sample count.
    ///
    /// Only bodies of exactly one packet are accepted, otherwise every later
    /// packet would be placed at the wrong stream position.
    pub fn accept(&mut self, body: &[u8], source: Source) -> Result<usize, DecodeError> {
        let samples = decode_exact(body, self.monitor.samples_per_packet())
            .inspect_err(|_| self.malformed += 1)?;
        let received_at = Utc::now().timestamp_nanos_opt().unwrap_or_default();

        let position = self.monitor.observe(received_at / 1_000);
        if position.suspected_missing > 0 {
            warn!(
                "Arrival gap before packet {}: ~{} packet(s) missing",
                position.packet_index, position.suspected_missing
            );
            self.ctx.publish(Message::Gap {
                received_at,
                missing_packets: position.suspected_missing,
            });
        }

        if let Some(rec) = self.recorder.as_mut() {
            if let Err(e) = rec.record(&samples) {
                error!("CSV capture failed, disabling: {}", e);
                self.recorder = None;
            }
        }

        let count = samples.len();
        self.ctx.publish(Message::Packet {
            source,
            received_at,
            first_sample: position.first_sample,
            samples,
        });
        Ok(count)
    }

    pub fn monitor(&self) -> &StreamMonitor {
        &self.monitor
    }

    pub fn malformed(&self) -> u64 {
        self.malformed
    }

    pub fn flush(&mut self) {
        if let Some(rec) = self.recorder.as_mut() {
            if let Err(e) = rec.flush() {
                error!("CSV flush failed: {}", e);
            }
        }
    }
}

/// Receive datagrams on `addr` forever, feeding each into `ingest`.
pub async fn run_udp_ingest(
    ingest: SharedIngest,
    addr: SocketAddr,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let sock = UdpSocket::bind(addr).await?;
    info!("Listening for packets on udp://{}", sock.local_addr()?);

    // one spare byte so an oversized datagram shows up as WrongLength
    // instead of being truncated to a valid-looking packet
    let packet_bytes = match ingest.lock() {
        Ok(guard) => guard.monitor().packet_bytes(),
        Err(poisoned) => poisoned.into_inner().monitor().packet_bytes(),
    };
    let mut buf = vec![0u8; packet_bytes + 1];
    loop {
        match sock.recv_from(&mut buf).await {
            Ok((n, from)) => {
                let result = match ingest.lock() {
                    Ok(mut guard) => guard.accept(&buf[..n], Source::Udp),
                    Err(poisoned) => poisoned.into_inner().accept(&buf[..n], Source::Udp),
                };
                match result {
                    Ok(count) => debug!("{} samples from {}", count, from),
                    Err(e) => warn!("Packet error from {}: {}", from, e),
                }
            }
            Err(e) => {
                error!("UDP receive error: {}", e);
            }
        }
    }
}
