//! Receiver-side view of a packet: N little-endian `i16` samples, in order.

use thiserror::Error;
use crate::packet::SAMPLE_BYTES;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("empty packet")]
    Empty,

    #[error("packet length {0} is not a whole number of samples")]
    OddLength(usize),

    #[error("packet is {got} bytes, expected {expected}")]
    WrongLength { expected: usize, got: usize },
}

/// Decode one packet body.
pub fn decode_packet(bytes: &[u8]) -> Result<Vec<i16>, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }
    if bytes.len() % SAMPLE_BYTES != 0 {
        return Err(DecodeError::OddLength(bytes.len()));
    }
    Ok(bytes
        .chunks_exact(SAMPLE_BYTES)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect())
}

/// Decode a body that must hold exactly `samples_per_packet` samples.
pub fn decode_exact(bytes: &[u8], samples_per_packet: usize) -> Result<Vec<i16>, DecodeError> {
    let samples = decode_packet(bytes)?;
    let expected = samples_per_packet * SAMPLE_BYTES;
    if bytes.len() != expected {
        return Err(DecodeError::WrongLength { expected, got: bytes.len() });
    }
    Ok(samples)
}

/// Encode samples the same way the node does; used for re-broadcasting.
pub fn encode_samples(samples: &[i16]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(samples.len() * SAMPLE_BYTES);
    for s in samples {
        buf.extend_from_slice(&s.to_le_bytes());
    }
    buf
}

/// Counts-to-volts conversion for a differential sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoltageScale {
    pub reference_volts: f64,
    pub full_scale_counts: f64,
}

impl Default for VoltageScale {
    /// 3.3 V rail split around 1.65 V, 10-bit converter.
    fn default() -> Self {
        Self { reference_volts: 1.65, full_scale_counts: 512.0 }
    }
}

impl VoltageScale {
    pub fn to_volts(&self, sample: i16) -> f64 {
        sample as f64 * (self.reference_volts / self.full_scale_counts)
    }
}

/// What the monitor learned from one arriving packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketPosition {
    /// Arrival order, from zero.
    pub packet_index: u64,
    /// Nominal index of the packet's first sample, assuming no loss.
    pub first_sample: u64,
    /// Packets probably lost just before this one.
    pub suspected_missing: u64,
}

/// Reconstructs nominal sample positions from packet arrival order.
///
/// Packets carry no sequence number, so loss can only be guessed from
/// arrival gaps much longer than the nominal packet period.
#[derive(Debug, Clone)]
pub struct StreamMonitor {
    samples_per_packet: u64,
    packet_period_us: u64,
    packets: u64,
    missing: u64,
    last_arrival_us: Option<i64>,
}

impl StreamMonitor {
    pub fn new(samples_per_packet: usize, sample_interval_us: u32) -> Self {
        let samples_per_packet = samples_per_packet.max(1) as u64;
        Self {
            samples_per_packet,
            packet_period_us: samples_per_packet * sample_interval_us.max(1) as u64,
            packets: 0,
            missing: 0,
            last_arrival_us: None,
        }
    }

    pub fn samples_per_packet(&self) -> usize {
        self.samples_per_packet as usize
    }

    /// Wire size every accepted packet must have.
    pub fn packet_bytes(&self) -> usize {
        self.samples_per_packet() * SAMPLE_BYTES
    }

    pub fn packet_period_us(&self) -> u64 {
        self.packet_period_us
    }

    /// Record a packet that arrived at `arrival_us` (any monotonic origin).
    pub fn observe(&mut self, arrival_us: i64) -> PacketPosition {
        let suspected_missing = match self.last_arrival_us {
            Some(prev) if arrival_us > prev => {
                let gap = (arrival_us - prev) as u64;
                // anything under two periods is jitter, not loss
                (gap / self.packet_period_us).saturating_sub(1)
            }
            _ => 0,
        };
        self.last_arrival_us = Some(arrival_us);

        let position = PacketPosition {
            packet_index: self.packets,
            first_sample: self.packets * self.samples_per_packet,
            suspected_missing,
        };
        self.packets += 1;
        self.missing += suspected_missing;
        position
    }

    pub fn packets(&self) -> u64 {
        self.packets
    }

    pub fn samples(&self) -> u64 {
        self.packets * self.samples_per_packet
    }

    pub fn suspected_missing(&self) -> u64 {
        self.missing
    }
}
