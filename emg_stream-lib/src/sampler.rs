use crate::adc::{AdcChannel, AdcResolution, HardwareAdc};

/// One differential reading: `signal - reference`.
///
/// On the wire the signed value travels as its two's-complement `u16`
/// pattern, low byte first. Nothing is clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sample(pub i16);

impl Sample {
    /// Subtract in `i32` so a reference above the signal goes negative.
    pub fn differential(signal: u16, reference: u16) -> Self {
        Sample((signal as i32 - reference as i32) as i16)
    }

    pub fn value(self) -> i16 {
        self.0
    }

    pub fn as_raw_u16(self) -> u16 {
        self.0 as u16
    }

    pub fn to_le_bytes(self) -> [u8; 2] {
        self.as_raw_u16().to_le_bytes()
    }

    pub fn from_le_bytes(bytes: [u8; 2]) -> Self {
        Sample(i16::from_le_bytes(bytes))
    }
}

/// Reads the signal and reference inputs once per tick.
pub struct DifferentialSampler<A: HardwareAdc> {
    adc: A,
    signal: AdcChannel,
    reference: AdcChannel,
    max_reading: u16,
    last: (u16, u16),
}

impl<A: HardwareAdc> DifferentialSampler<A> {
    /// Readings may use up to 15 bits, the widest span whose difference
    /// still fits an `i16`.
    pub fn new(adc: A, signal: AdcChannel, reference: AdcChannel) -> Self {
        Self { adc, signal, reference, max_reading: i16::MAX as u16, last: (0, 0) }
    }

    /// Narrow the accepted reading range to what `resolution` can produce.
    pub fn with_resolution(mut self, resolution: AdcResolution) -> Self {
        self.max_reading = resolution.max_value();
        self
    }

    /// Raw single-shot read of both channels, no filtering or averaging.
    pub fn sample(&mut self) -> Sample {
        let signal = self.adc.read(self.signal);
        let reference = self.adc.read(self.reference);
        debug_assert!(
            signal <= self.max_reading && reference <= self.max_reading,
            "ADC reading ({}, {}) above configured maximum {}",
            signal,
            reference,
            self.max_reading
        );
        self.last = (signal, reference);
        Sample::differential(signal, reference)
    }

    /// `(signal, reference)` from the most recent `sample` call.
    pub fn last_readings(&self) -> (u16, u16) {
        self.last
    }

    pub fn adc_mut(&mut self) -> &mut A {
        &mut self.adc
    }
}
