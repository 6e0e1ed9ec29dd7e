use std::f64::consts::TAU;
use thiserror::Error;

/// Errors raised while configuring an ADC.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AdcError {
    #[error("unsupported ADC resolution: {0} bits (expected 1..=15)")]
    UnsupportedResolution(u8),
}

/// Analog input identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AdcChannel(pub u8);

/// Conversion width in bits.
///
/// Capped at 15 bits so `signal - reference` always fits an `i16`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdcResolution(u8);

impl AdcResolution {
    pub const TEN_BIT: AdcResolution = AdcResolution(10);

    pub fn new(bits: u8) -> Result<Self, AdcError> {
        if (1..=15).contains(&bits) {
            Ok(Self(bits))
        } else {
            Err(AdcError::UnsupportedResolution(bits))
        }
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    /// Largest raw reading, e.g. 1023 for 10 bits.
    pub fn max_value(self) -> u16 {
        ((1u32 << self.0) - 1) as u16
    }
}

/// Conversion speed trade-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpeedMode {
    #[default]
    Normal,
    /// Shortest sample-and-hold the part supports; settling is not checked.
    Fast,
}

/// Raw single-shot analog conversions.
///
/// Concrete register programming lives behind this trait so the
/// acquisition path never touches the peripheral directly.
pub trait HardwareAdc {
    fn configure(&mut self, resolution: AdcResolution, speed: SpeedMode) -> Result<(), AdcError>;

    /// A read always yields a value; stale conversions are a hardware concern.
    fn read(&mut self, channel: AdcChannel) -> u16;
}

/// Host stand-in for the analog front end.
///
/// The reference channel idles at mid-rail. The signal channel carries a
/// sine carrier gated on and off in bursts, roughly what a contracting
/// muscle looks like after the instrumentation amplifier.
pub struct SyntheticAdc {
    signal: AdcChannel,
    reference: AdcChannel,
    resolution: AdcResolution,
    speed: SpeedMode,
    /// Carrier period in signal reads.
    carrier_period: u32,
    /// Full on+off burst cycle in signal reads.
    burst_period: u32,
    amplitude: f64,
    step: u64,
}

impl SyntheticAdc {
    pub fn new(signal: AdcChannel, reference: AdcChannel) -> Self {
        Self {
            signal,
            reference,
            resolution: AdcResolution::TEN_BIT,
            speed: SpeedMode::Normal,
            carrier_period: 250,
            burst_period: 25_000,
            amplitude: 0.4,
            step: 0,
        }
    }

    /// Fraction of half-scale swung by the carrier during a burst.
    pub fn with_amplitude(mut self, amplitude: f64) -> Self {
        self.amplitude = amplitude.clamp(0.0, 1.0);
        self
    }

    pub fn with_periods(mut self, carrier_period: u32, burst_period: u32) -> Self {
        self.carrier_period = carrier_period.max(1);
        self.burst_period = burst_period.max(2);
        self
    }

    pub fn resolution(&self) -> AdcResolution {
        self.resolution
    }

    pub fn speed(&self) -> SpeedMode {
        self.speed
    }

    fn mid_rail(&self) -> u16 {
        (self.resolution.max_value() >> 1) + 1
    }

    fn next_signal(&mut self) -> u16 {
        let mid = self.mid_rail() as f64;
        let period = self.burst_period as u64;
        let in_burst = self.step % period < period / 2;
        let phase = (self.step % self.carrier_period as u64) as f64 / self.carrier_period as f64;
        self.step = self.step.wrapping_add(1);

        let swing = if in_burst { self.amplitude * mid } else { 0.0 };
        let value = mid + swing * (TAU * phase).sin();
        value.round().clamp(0.0, self.resolution.max_value() as f64) as u16
    }
}

impl HardwareAdc for SyntheticAdc {
    fn configure(&mut self, resolution: AdcResolution, speed: SpeedMode) -> Result<(), AdcError> {
        self.resolution = resolution;
        self.speed = speed;
        Ok(())
    }

    fn read(&mut self, channel: AdcChannel) -> u16 {
        if channel == self.signal {
            self.next_signal()
        } else if channel == self.reference {
            self.mid_rail()
        } else {
            0
        }
    }
}
