use std::time::Instant;

/// Free-running microsecond counter that wraps at `u32::MAX`.
pub trait Clock {
    fn now_micros(&mut self) -> u32;
}

/// Host clock: elapsed microseconds since construction, truncated to 32 bits
/// so it rolls over roughly every 71 minutes like a microcontroller timer.
#[derive(Clone, Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_micros(&mut self) -> u32 {
        self.origin.elapsed().as_micros() as u32
    }
}

/// Busy-wait tick source gating every sample.
///
/// `wait` returns no earlier than `interval_us` after the previous return.
/// Time lost by the caller between calls is not made up: the baseline is
/// always the instant the last wait ended.
pub struct Ticker<C: Clock> {
    clock: C,
    interval_us: u32,
    last: u32,
}

impl<C: Clock> Ticker<C> {
    pub fn new(mut clock: C, interval_us: u32) -> Self {
        let last = clock.now_micros();
        Self { clock, interval_us, last }
    }

    /// Spin until the interval has elapsed, then return the new baseline.
    pub fn wait(&mut self) -> u32 {
        loop {
            let now = self.clock.now_micros();
            // wrapping_sub keeps the elapsed time correct across rollover
            if now.wrapping_sub(self.last) >= self.interval_us {
                self.last = now;
                return now;
            }
            std::hint::spin_loop();
        }
    }

    pub fn interval_us(&self) -> u32 {
        self.interval_us
    }

    pub fn last_tick(&self) -> u32 {
        self.last
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }
}
