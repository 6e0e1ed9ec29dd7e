use log::{info, warn};
use crate::clock::{Clock, Ticker};
use crate::adc::HardwareAdc;
use crate::packet::PacketAssembler;
use crate::sampler::{DifferentialSampler, Sample};
use crate::transport::PacketTransport;

/// Where the loop is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionState {
    Idle,
    Acquiring,
    BufferFull,
    Transmitting,
}

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Sample stored, packet still filling.
    Sampled(Sample),
    /// Sample completed a packet and the transport accepted it.
    Sent,
    /// Sample completed a packet and the transport failed; packet lost.
    Dropped,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AcquisitionStats {
    pub samples: u64,
    pub packets_sent: u64,
    pub packets_dropped: u64,
}

/// Single-threaded tick → sample → pack → send pipeline.
///
/// Transmission runs inline on the sampling thread. Ticks that would have
/// fallen inside a slow send are never taken; the next tick is measured
/// from whenever the send returned.
pub struct Acquisition<C: Clock, A: HardwareAdc, T: PacketTransport> {
    ticker: Ticker<C>,
    sampler: DifferentialSampler<A>,
    assembler: PacketAssembler,
    transport: T,
    state: AcquisitionState,
    stats: AcquisitionStats,
}

impl<C: Clock, A: HardwareAdc, T: PacketTransport> Acquisition<C, A, T> {
    pub fn new(
        ticker: Ticker<C>,
        sampler: DifferentialSampler<A>,
        assembler: PacketAssembler,
        transport: T,
    ) -> Self {
        Self {
            ticker,
            sampler,
            assembler,
            transport,
            state: AcquisitionState::Idle,
            stats: AcquisitionStats::default(),
        }
    }

    /// Wait for the next tick, take one sample, and transmit if that
    /// filled the packet.
    pub fn step(&mut self) -> StepOutcome {
        let sample = self.acquire();
        self.transmit().unwrap_or(StepOutcome::Sampled(sample))
    }

    /// Tick and sample without transmitting. Leaves the loop in
    /// `BufferFull` when this sample completed the packet.
    ///
    /// A packet still waiting from a previous call goes out first, so the
    /// single buffer is never overwritten before it is sent.
    pub fn acquire(&mut self) -> Sample {
        if self.state == AcquisitionState::BufferFull {
            self.transmit();
        }
        self.ticker.wait();
        self.state = AcquisitionState::Acquiring;

        let sample = self.sampler.sample();
        self.stats.samples += 1;

        if self.assembler.append(sample).is_some() {
            self.state = AcquisitionState::BufferFull;
        }
        sample
    }

    /// Hand the completed packet to the transport, blocking until the
    /// attempt is over. `None` when there is no full buffer to send.
    pub fn transmit(&mut self) -> Option<StepOutcome> {
        if self.state != AcquisitionState::BufferFull {
            return None;
        }
        self.state = AcquisitionState::Transmitting;
        let outcome = match self.transport.send(self.assembler.completed()) {
            Ok(()) => {
                self.stats.packets_sent += 1;
                StepOutcome::Sent
            }
            Err(e) => {
                self.stats.packets_dropped += 1;
                warn!("{} transport dropped packet: {}", self.transport.name(), e);
                StepOutcome::Dropped
            }
        };
        self.state = AcquisitionState::Acquiring;
        Some(outcome)
    }

    /// Run a fixed number of ticks.
    pub fn run_for(&mut self, ticks: u64) -> AcquisitionStats {
        for _ in 0..ticks {
            self.step();
        }
        self.stats
    }

    /// Stream until the process dies.
    pub fn run_forever(&mut self) -> ! {
        info!(
            "Acquiring every {}us, {} samples per packet via {}",
            self.ticker.interval_us(),
            self.assembler.capacity(),
            self.transport.name()
        );
        loop {
            self.step();
        }
    }

    pub fn state(&self) -> AcquisitionState {
        self.state
    }

    pub fn stats(&self) -> AcquisitionStats {
        self.stats
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn ticker_mut(&mut self) -> &mut Ticker<C> {
        &mut self.ticker
    }
}
