use crate::sampler::Sample;

/// Bytes per encoded sample.
pub const SAMPLE_BYTES: usize = 2;

/// Single reusable buffer of `samples_per_packet` little-endian samples.
///
/// Storage is allocated once. There is no second buffer, so whatever the
/// caller does with a full packet happens before the next sample lands.
pub struct PacketAssembler {
    buffer: Vec<u8>,
    samples_per_packet: usize,
    index: usize,
}

impl PacketAssembler {
    pub fn new(samples_per_packet: usize) -> Self {
        let samples_per_packet = samples_per_packet.max(1);
        Self {
            buffer: vec![0u8; samples_per_packet * SAMPLE_BYTES],
            samples_per_packet,
            index: 0,
        }
    }

    /// Write `sample` into the next slot.
    ///
    /// Returns the whole buffer when this sample completes it; the index is
    /// already back at zero by then, so the next append starts a new packet.
    pub fn append(&mut self, sample: Sample) -> Option<&[u8]> {
        let offset = self.index * SAMPLE_BYTES;
        self.buffer[offset..offset + SAMPLE_BYTES].copy_from_slice(&sample.to_le_bytes());
        self.index += 1;

        if self.index == self.samples_per_packet {
            self.index = 0;
            Some(&self.buffer)
        } else {
            None
        }
    }

    /// The most recently completed packet.
    ///
    /// Only meaningful right after `append` returned `Some`; the next append
    /// starts overwriting it.
    pub fn completed(&self) -> &[u8] {
        &self.buffer
    }

    /// Samples written into the packet in progress.
    pub fn len(&self) -> usize {
        self.index
    }

    pub fn is_empty(&self) -> bool {
        self.index == 0
    }

    pub fn capacity(&self) -> usize {
        self.samples_per_packet
    }

    pub fn packet_bytes(&self) -> usize {
        self.buffer.len()
    }

    /// Drop a partially filled packet.
    pub fn reset(&mut self) {
        self.index = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yields_only_when_full() {
        let mut asm = PacketAssembler::new(256);
        for i in 0..255 {
            assert!(asm.append(Sample(i as i16)).is_none());
            assert_eq!(asm.len(), i + 1);
        }
        let packet = asm.append(Sample(255)).expect("full");
        assert_eq!(packet.len(), 512);
        assert_eq!(&packet[..4], &[0x00, 0x00, 0x01, 0x00]);
        assert_eq!(&packet[510..], &[0xFF, 0x00]);
        assert!(asm.is_empty());
        assert_eq!(asm.completed()[2..4], [0x01, 0x00]);
    }

    #[test]
    fn storage_is_reused_between_packets() {
        let mut asm = PacketAssembler::new(2);
        let first_ptr = asm.append(Sample(1)).map(|p| p.as_ptr());
        assert!(first_ptr.is_none());
        let first = asm.append(Sample(-1)).map(|p| (p.as_ptr(), p.to_vec())).unwrap();
        assert_eq!(first.1, vec![0x01, 0x00, 0xFF, 0xFF]);

        asm.append(Sample(7));
        let second = asm.append(Sample(8)).map(|p| (p.as_ptr(), p.to_vec())).unwrap();
        assert_eq!(second.0, first.0);
        assert_eq!(second.1, vec![0x07, 0x00, 0x08, 0x00]);
    }

    #[test]
    fn reset_discards_partial_packet() {
        let mut asm = PacketAssembler::new(3);
        asm.append(Sample(1));
        asm.append(Sample(2));
        asm.reset();
        assert!(asm.is_empty());
        assert!(asm.append(Sample(3)).is_none());
        assert_eq!(asm.capacity(), 3);
        assert_eq!(asm.packet_bytes(), 6);
    }
}
